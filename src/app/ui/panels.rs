use eframe::egui::{self, Align, Context, Layout, RichText};

use crate::api::ApiHandle;
use crate::config::Locale;

use super::super::graph::{GraphCanvas, Selection};
use super::super::search::NodeSearch;
use super::super::{PendingDelete, RelationDefaults, ViewModel};
use super::Toasts;

impl ViewModel {
    pub(in crate::app) fn new(api: ApiHandle, course_id: u64, editable: bool, locale: Locale) -> Self {
        Self {
            api,
            course_id,
            editable,
            locale,
            nodes: Vec::new(),
            relations: Vec::new(),
            graph_revision: 0,
            canvas: GraphCanvas::new(editable, locale),
            selection: Selection::None,
            relation_defaults: RelationDefaults::default(),
            node_editor: None,
            relation_editor: None,
            pending_delete: None,
            pending_select: None,
            pending_fetches: 0,
            search: NodeSearch::default(),
            toasts: Toasts::default(),
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Knowledge graph");
                    ui.separator();
                    ui.label(format!("course: {}", self.course_id));
                    ui.label(format!("nodes: {}", self.nodes.len()));
                    ui.label(format!("relations: {}", self.relations.len()));
                    ui.separator();
                    if self.editable {
                        ui.label(RichText::new("editing").strong());
                    } else {
                        ui.label("read-only");
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.pending_fetches > 0 {
                            ui.spinner();
                            ui.label("syncing");
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        self.draw_delete_confirmation(ctx);
        self.toasts.show(ctx);
    }

    fn draw_delete_confirmation(&mut self, ctx: &Context) {
        let Some(pending) = self.pending_delete.clone() else {
            return;
        };

        let (title, name) = match &pending {
            PendingDelete::Node(id) => (
                "Delete node",
                self.node(id).map_or_else(|| id.clone(), |node| node.label.clone()),
            ),
            PendingDelete::Relation(id) => ("Delete relation", self.relation_caption(id)),
        };

        let mut confirmed = false;
        let mut cancelled = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!("Delete \"{name}\"?"));
                if matches!(pending, PendingDelete::Node(_)) {
                    ui.small("Its relations are deleted with it.");
                }
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    confirmed = ui.button("Delete").clicked();
                    cancelled = ui.button("Cancel").clicked();
                });
            });

        if confirmed {
            self.pending_delete = None;
            match pending {
                PendingDelete::Node(id) => self.delete_node(&id),
                PendingDelete::Relation(id) => self.delete_relation(&id),
            }
        } else if cancelled {
            self.pending_delete = None;
        }
    }
}
