use eframe::egui::{self, RichText, Ui};

use super::super::graph::Selection;
use super::super::render_utils::CATEGORIES;
use super::super::{NodeEditor, PendingDelete, RelationEditor, ViewModel};
use super::controls::{apply_weight_arrow_keys, relation_type_combo};

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        match self.selection.clone() {
            Selection::None => {
                ui.label("Select a node or relation on the canvas.");
            }
            Selection::Node(id) => self.draw_node_details(ui, &id),
            Selection::Relation(id) => self.draw_relation_details(ui, &id),
        }
    }

    fn draw_node_details(&mut self, ui: &mut Ui, id: &str) {
        let Some(node) = self.node(id).cloned() else {
            ui.label("Selected node no longer exists.");
            return;
        };

        let incoming = self.relations.iter().filter(|r| r.to == id).count();
        let outgoing = self.relations.iter().filter(|r| r.from == id).count();
        let pinned = self.canvas.is_pinned(id);

        if !self.editable {
            ui.label(RichText::new(&node.label).strong());
            ui.label(format!("Type: {}", node.kind.as_deref().unwrap_or("none")));
            if let Some(description) = node.description.as_deref().filter(|d| !d.is_empty()) {
                ui.add_space(4.0);
                ui.label(description);
            }
            ui.add_space(6.0);
            ui.small(format!("{incoming} incoming, {outgoing} outgoing relation(s)"));
            return;
        }

        if self
            .node_editor
            .as_ref()
            .is_none_or(|editor| editor.node_id != id)
        {
            self.node_editor = Some(NodeEditor {
                node_id: id.to_owned(),
                label: node.label.clone(),
                kind: node.kind.clone(),
                description: node.description.clone().unwrap_or_default(),
            });
        }
        let Some(editor) = self.node_editor.as_mut() else {
            return;
        };

        ui.label("Label");
        ui.text_edit_singleline(&mut editor.label);

        ui.label("Type");
        egui::ComboBox::from_id_salt("node_type")
            .selected_text(editor.kind.as_deref().unwrap_or("none"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut editor.kind, None, "none");
                for category in CATEGORIES {
                    ui.selectable_value(&mut editor.kind, Some(category.to_owned()), category);
                }
            });

        ui.label("Description");
        ui.text_edit_multiline(&mut editor.description);

        ui.add_space(6.0);
        ui.small(format!("{incoming} incoming, {outgoing} outgoing relation(s)"));
        if pinned {
            ui.small("Position saved on the server.");
        }

        let label_valid = !editor.label.trim().is_empty();
        let mut save = false;
        let mut delete = false;
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            save = ui
                .add_enabled(label_valid, egui::Button::new("Save"))
                .on_disabled_hover_text("A label is required.")
                .clicked();
            delete = ui.button("Delete").clicked();
        });

        if save {
            let editor = editor.clone();
            self.save_node(&editor);
        }
        if delete {
            self.pending_delete = Some(PendingDelete::Node(id.to_owned()));
        }
    }

    fn draw_relation_details(&mut self, ui: &mut Ui, id: &str) {
        let Some(relation) = self.relation(id).cloned() else {
            ui.label("Selected relation no longer exists.");
            return;
        };

        let endpoint = |node_id: &str| {
            self.node(node_id)
                .map_or_else(|| node_id.to_owned(), |node| node.label.clone())
        };
        let from = endpoint(&relation.from);
        let to = endpoint(&relation.to);
        let arrow = if relation.is_directed() { "→" } else { "—" };
        ui.label(RichText::new(format!("{from} {arrow} {to}")).strong());

        if !self.editable {
            ui.label(format!("Type: {}", self.locale.relation_tag(&relation.kind)));
            ui.label(format!("Weight: {:.2}", relation.effective_weight()));
            return;
        }

        if self
            .relation_editor
            .as_ref()
            .is_none_or(|editor| editor.relation_id != id)
        {
            self.relation_editor = Some(RelationEditor {
                relation_id: id.to_owned(),
                kind: relation.kind.clone(),
                directed: relation.is_directed(),
                weight: relation.effective_weight(),
            });
        }
        let Some(editor) = self.relation_editor.as_mut() else {
            return;
        };

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label("Type");
            relation_type_combo(ui, "relation_type", &mut editor.kind);
        });
        ui.checkbox(&mut editor.directed, "Directed");
        let weight_slider = ui.add(
            egui::Slider::new(&mut editor.weight, 0.0..=1.0)
                .text("Weight")
                .clamping(egui::SliderClamping::Always),
        );
        apply_weight_arrow_keys(ui, &weight_slider, &mut editor.weight);

        let mut save = false;
        let mut delete = false;
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            save = ui.button("Save").clicked();
            delete = ui.button("Delete").clicked();
        });

        if save {
            let editor = editor.clone();
            self.save_relation(&editor);
        }
        if delete {
            self.pending_delete = Some(PendingDelete::Relation(id.to_owned()));
        }
    }
}
