use std::sync::Arc;

use eframe::egui::{self, Context, FontData, FontDefinitions, FontFamily};
use tracing::{debug, info, warn};

use crate::api::{
    ApiEvent, ApiHandle, ApiRequest, ApiWorker, DEFAULT_RELATION_WEIGHT, GraphApi, Node,
    Relation, RelationType,
};
use crate::config::{AppConfig, Locale};

mod actions;
mod graph;
mod physics;
mod render_utils;
mod search;
mod ui;
mod viewport;

use graph::{GraphCanvas, Selection};
use search::NodeSearch;
use ui::Toasts;

pub struct GraphEditorApp {
    course_id: u64,
    editable: bool,
    locale: Locale,
    worker: ApiWorker,
    state: AppState,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    api: ApiHandle,
    course_id: u64,
    editable: bool,
    locale: Locale,
    nodes: Vec<Node>,
    relations: Vec<Relation>,
    graph_revision: u64,
    canvas: GraphCanvas,
    selection: Selection,
    relation_defaults: RelationDefaults,
    node_editor: Option<NodeEditor>,
    relation_editor: Option<RelationEditor>,
    pending_delete: Option<PendingDelete>,
    pending_select: Option<String>,
    pending_fetches: usize,
    search: NodeSearch,
    toasts: Toasts,
}

/// Applied to every relation drawn on the canvas.
#[derive(Clone, Debug, PartialEq)]
struct RelationDefaults {
    kind: RelationType,
    directed: bool,
    weight: f64,
}

impl Default for RelationDefaults {
    fn default() -> Self {
        Self {
            kind: RelationType::Related,
            directed: true,
            weight: DEFAULT_RELATION_WEIGHT,
        }
    }
}

/// Unsaved edits of the selected node.
#[derive(Clone, Debug, PartialEq)]
struct NodeEditor {
    node_id: String,
    label: String,
    kind: Option<String>,
    description: String,
}

/// Unsaved edits of the selected relation.
#[derive(Clone, Debug, PartialEq)]
struct RelationEditor {
    relation_id: String,
    kind: RelationType,
    directed: bool,
    weight: f64,
}

/// Deletion waiting for confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
enum PendingDelete {
    Node(String),
    Relation(String),
}

fn install_extra_font(ctx: &Context, bytes: Vec<u8>) {
    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert("extra".to_owned(), Arc::new(FontData::from_owned(bytes)));
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push("extra".to_owned());
    }
    ctx.set_fonts(fonts);
}

impl GraphEditorApp {
    pub fn new<A>(cc: &eframe::CreationContext<'_>, config: AppConfig, api: A) -> Self
    where
        A: GraphApi + 'static,
    {
        if let Some(font) = config.extra_font {
            install_extra_font(&cc.egui_ctx, font);
        }

        let repaint = cc.egui_ctx.clone();
        let worker = ApiWorker::spawn(api, config.course_id, move || repaint.request_repaint());
        worker.handle().send(ApiRequest::Fetch);
        info!(
            course_id = config.course_id,
            editable = config.editable,
            "loading course graph"
        );

        Self {
            course_id: config.course_id,
            editable: config.editable,
            locale: config.locale,
            worker,
            state: AppState::Loading,
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.worker.try_recv() {
            match event {
                ApiEvent::Fetched(Ok(snapshot)) => match &mut self.state {
                    AppState::Ready(model) => model.apply_snapshot(snapshot),
                    AppState::Loading | AppState::Error(_) => {
                        info!(
                            nodes = snapshot.nodes.len(),
                            relations = snapshot.relations.len(),
                            "course graph ready"
                        );
                        let mut model = ViewModel::new(
                            self.worker.handle(),
                            self.course_id,
                            self.editable,
                            self.locale,
                        );
                        model.apply_snapshot(snapshot);
                        self.state = AppState::Ready(Box::new(model));
                    }
                },
                ApiEvent::Fetched(Err(error)) => {
                    warn!(%error, "course graph unavailable");
                    self.state = AppState::Error(error);
                }
                ApiEvent::Mutated { mutation, result } => match &mut self.state {
                    AppState::Ready(model) => model.apply_mutation(mutation, result),
                    AppState::Loading | AppState::Error(_) => {
                        debug!(action = mutation.describe(), "mutation result dropped");
                    }
                },
            }
        }
    }
}

impl eframe::App for GraphEditorApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        let mut transition = None;

        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        self.worker.handle().send(ApiRequest::Fetch);
                        transition = Some(AppState::Loading);
                    }
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
