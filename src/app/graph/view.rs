use eframe::egui::{
    self, Align2, Event, FontId, Key, PointerButton, Rect, Response, Sense, Ui, pos2,
};

use super::super::ViewModel;
use super::super::render_utils::{LABEL_COLOR, TAG_COLOR, draw_background, paint_scene};
use super::{Gesture, PointerInput};

/// Translates this frame's raw input into canvas-local pointer input.
///
/// Raw events are used instead of `Response` drag tracking so press, move
/// and release keep their exact positions and modifier state.
fn collect_pointer_input(
    ui: &Ui,
    rect: Rect,
    response: &Response,
    tracking: bool,
) -> Vec<PointerInput> {
    let hovered = response.hovered();
    let local = |pos: egui::Pos2| (pos - rect.min).to_pos2();

    ui.input(|input| {
        let mut collected = Vec::new();

        for event in &input.events {
            match event {
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    modifiers,
                } => {
                    let modifier = modifiers.command || modifiers.ctrl;
                    if *pressed {
                        if hovered && rect.contains(*pos) {
                            collected.push(PointerInput::Down {
                                pos: local(*pos),
                                modifier,
                            });
                        }
                    } else if tracking {
                        collected.push(PointerInput::Up {
                            pos: local(*pos),
                            modifier,
                        });
                    }
                }
                Event::PointerMoved(pos) if tracking || rect.contains(*pos) => {
                    collected.push(PointerInput::Move { pos: local(*pos) });
                }
                Event::PointerGone => collected.push(PointerInput::Cancel),
                _ => {}
            }
        }

        if hovered && let Some(pointer) = input.pointer.hover_pos() {
            if input.pointer.button_double_clicked(PointerButton::Primary) {
                collected.push(PointerInput::DoubleClick {
                    pos: local(pointer),
                });
            }

            let scroll = input.raw_scroll_delta.y;
            if scroll.abs() > f32::EPSILON {
                collected.push(PointerInput::Wheel {
                    pos: local(pointer),
                    delta: scroll,
                    modifier: input.modifiers.command || input.modifiers.ctrl,
                });
            }
        }

        if hovered
            && let Some(touch) = input.multi_touch()
            && (touch.zoom_delta - 1.0).abs() > f32::EPSILON
        {
            collected.push(PointerInput::Pinch {
                pos: local(touch.center_pos),
                factor: touch.zoom_delta,
            });
        }

        if input.key_pressed(Key::Escape) {
            collected.push(PointerInput::Cancel);
        }

        collected
    })
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.canvas.set_canvas_size(rect.size());

        let now = ui.input(|input| input.time);
        let tracking = !matches!(self.canvas.gesture(), Gesture::Idle);
        for input in collect_pointer_input(ui, rect, &response, tracking) {
            for event in self.canvas.handle(input, now) {
                self.apply_canvas_event(event);
            }
        }

        self.canvas.tick();
        if self.canvas.is_animating() {
            ui.ctx().request_repaint();
        }

        draw_background(&painter, rect, self.canvas.viewport());

        let highlighted = self.search.matches(&self.nodes, self.graph_revision);
        let scene = self.canvas.scene(&self.selection, &highlighted);
        paint_scene(&painter, rect.min, &scene);

        if self.canvas.hovered_node().is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        } else if matches!(self.canvas.gesture(), Gesture::CanvasPress { moved: true, .. }) {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::Grabbing;
            });
        }

        self.draw_canvas_overlay(&painter, rect);
    }

    fn draw_canvas_overlay(&self, painter: &egui::Painter, rect: Rect) {
        let font = FontId::proportional(12.0);
        let mut y = rect.top() + 8.0;

        if self.canvas.graph().nodes.is_empty() {
            let hint = if self.editable {
                "No nodes yet. Double-click the canvas to add one."
            } else {
                "This course has no knowledge graph nodes."
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                hint,
                FontId::proportional(15.0),
                TAG_COLOR,
            );
        }

        if let Gesture::DrawingRelation { source, .. } = self.canvas.gesture() {
            let label = self
                .node(source)
                .map(|node| node.label.as_str())
                .unwrap_or(source.as_str());
            painter.text(
                pos2(rect.left() + 8.0, y),
                Align2::LEFT_TOP,
                format!("Linking from \"{label}\": release over a node with the modifier held, Esc to cancel"),
                font.clone(),
                LABEL_COLOR,
            );
            y += 16.0;
        }

        let graph = self.canvas.graph();
        let skipped = graph.skipped_nodes + graph.skipped_relations;
        if skipped > 0 {
            painter.text(
                pos2(rect.left() + 8.0, y),
                Align2::LEFT_TOP,
                format!(
                    "{} node(s) and {} relation(s) could not be drawn",
                    graph.skipped_nodes, graph.skipped_relations
                ),
                font,
                TAG_COLOR,
            );
        }
    }
}
