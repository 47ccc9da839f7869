use eframe::egui::{self, Key, Response, RichText, Ui, vec2};

use crate::api::RelationType;

use super::super::ViewModel;
use super::super::render_utils::{CATEGORIES, category_color, relation_color};
use super::super::viewport::{MAX_SCALE, MIN_SCALE};

const SLIDER_KEY_BASE_RATE: f64 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f64 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f64 = 40.0;
const ZOOM_BUTTON_FACTOR: f32 = 1.25;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f64,
    negative_secs: f64,
}

fn slider_key_accel_multiplier(hold_secs: f64) -> f64 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Lets a focused weight slider be nudged with held arrow keys, speeding up
/// the longer a key is held.
pub(super) fn apply_weight_arrow_keys(ui: &Ui, response: &Response, value: &mut f64) -> bool {
    const STEP: f64 = 0.005;

    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            f64::from(input.stable_dt.min(0.1)),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = f64::from(i8::from(increase_down) - i8::from(decrease_down));
    if direction == 0.0 {
        return false;
    }

    let hold_secs = if direction > 0.0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let old_value = *value;
    *value = (*value + direction * STEP * speed * delta_time).clamp(0.0, 1.0);
    ui.ctx().request_repaint();

    (*value - old_value).abs() > f64::EPSILON
}

pub(super) fn relation_type_combo(ui: &mut Ui, id_salt: &str, kind: &mut RelationType) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt(id_salt)
        .selected_text(kind.as_str())
        .show_ui(ui, |ui| {
            for option in RelationType::SELECTABLE {
                let text = option.as_str().to_owned();
                changed |= ui.selectable_value(kind, option, text).changed();
            }
        });
    changed
}

fn legend_swatch(ui: &mut Ui, color: egui::Color32, text: &str) {
    ui.horizontal(|ui| {
        let (rect, _response) = ui.allocate_exact_size(vec2(12.0, 12.0), egui::Sense::hover());
        ui.painter().circle_filled(rect.center(), 5.5, color);
        ui.label(text);
    });
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            let viewport = *self.canvas.viewport();
            ui.label(format!("Zoom: {:.0}%", viewport.zoom_percent()));

            let center = self.canvas_center();
            if ui
                .add_enabled(viewport.scale > MIN_SCALE, egui::Button::new("-"))
                .on_hover_text("Zoom out around the canvas centre.")
                .clicked()
            {
                self.canvas
                    .viewport_mut()
                    .zoom_at(center, 1.0 / ZOOM_BUTTON_FACTOR);
            }
            if ui
                .add_enabled(viewport.scale < MAX_SCALE, egui::Button::new("+"))
                .on_hover_text("Zoom in around the canvas centre.")
                .clicked()
            {
                self.canvas
                    .viewport_mut()
                    .zoom_at(center, ZOOM_BUTTON_FACTOR);
            }
        });

        ui.horizontal(|ui| {
            if ui
                .button("Reset view")
                .on_hover_text("Back to 100% with no panning.")
                .clicked()
            {
                self.canvas.reset_view();
            }
            if ui
                .add_enabled(self.pending_fetches == 0, egui::Button::new("Reload"))
                .on_hover_text("Fetch nodes and relations from the server again.")
                .clicked()
            {
                self.request_refetch();
            }
        });

        ui.separator();
        self.draw_finder(ui);

        if self.editable {
            ui.separator();
            ui.label(RichText::new("New relations").strong())
                .on_hover_text("Used for every relation drawn on the canvas.");
            let defaults = &mut self.relation_defaults;
            ui.horizontal(|ui| {
                ui.label("Type");
                relation_type_combo(ui, "default_relation_type", &mut defaults.kind);
            });
            ui.checkbox(&mut defaults.directed, "Directed");
            let weight_slider = ui.add(
                egui::Slider::new(&mut defaults.weight, 0.0..=1.0)
                    .text("Weight")
                    .clamping(egui::SliderClamping::Always),
            );
            if weight_slider.hovered() {
                weight_slider.request_focus();
            }
            apply_weight_arrow_keys(ui, &weight_slider, &mut defaults.weight);
        }

        ui.separator();
        ui.collapsing("Legend", |ui| {
            for category in CATEGORIES {
                legend_swatch(ui, category_color(Some(category)), category);
            }
            legend_swatch(ui, category_color(None), "other");
            ui.add_space(4.0);
            for kind in RelationType::SELECTABLE {
                legend_swatch(ui, relation_color(&kind), self.locale.relation_tag(&kind));
            }
        });

        ui.collapsing("Help", |ui| {
            ui.label("Click a node or relation to select it.");
            ui.label("Drag the empty canvas to pan; scroll or pinch to zoom.");
            ui.label("Drag a node to move it.");
            if self.editable {
                ui.label("Moved nodes stay where they are dropped.");
                ui.label("Double-click empty canvas to add a node.");
                ui.label("Ctrl/Cmd + drag from one node to another to link them.");
            }
            ui.label("Esc cancels the current gesture.");
        });
    }

    fn draw_finder(&mut self, ui: &mut Ui) {
        ui.label("Find node")
            .on_hover_text("Fuzzy-highlight nodes by label or description.");
        let response = ui.text_edit_singleline(&mut self.search.query);
        let submitted = response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

        if !self.search.is_active() {
            return;
        }

        let match_count = self.search.matches(&self.nodes, self.graph_revision).len();
        ui.horizontal(|ui| {
            ui.label(format!("{match_count} match(es)"));
            let focus = ui
                .add_enabled(match_count > 0, egui::Button::new("Focus best"))
                .on_hover_text("Centre and select the best match.");
            if (focus.clicked() || submitted)
                && let Some(id) = self.search.best_match(&self.nodes)
            {
                self.canvas.focus_node(&id);
                self.select_node(id);
            }
        });
    }
}
