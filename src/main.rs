mod api;
mod app;
mod config;
mod util;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::api::HttpGraphApi;
use crate::config::{AppConfig, CliArgs};

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "course_graph=debug"
    } else {
        "course_graph=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let config = AppConfig::from_args(args)?;
    let api = HttpGraphApi::new(
        &config.api_base_url,
        config.token.clone(),
        config.request_timeout,
    );
    tracing::info!(api = %config.api_base_url, "starting course graph editor");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "course-graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::GraphEditorApp::new(cc, config, api)))),
    )
    .map_err(|error| anyhow!("failed to run the graph editor window: {error}"))
}
