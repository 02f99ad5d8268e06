//! Linework studio: interactive viewer for layered line documents.
//!
//! Controls: wheel zooms, left-drag pans, arrow keys pan, `Home` resets the
//! view, digit keys or toolbar buttons toggle layers, `Escape` quits.

mod controls;
mod demo;
mod toolbar;
mod viewer;

use anyhow::Result;

use linework_engine::device::GpuInit;
use linework_engine::logging::{init_logging, LoggingConfig};
use linework_engine::render::RendererConfig;
use linework_engine::window::{Runtime, RuntimeConfig};

use controls::CameraController;
use viewer::Viewer;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let document = demo::demo_document();
    log::info!(
        "document: {} layers, {} visible entities",
        document.layers().len(),
        document.visible_entities().count()
    );

    let renderer_config = RendererConfig::from_env();
    log::debug!(
        "shaders: {} / {}",
        renderer_config.vertex_shader.display(),
        renderer_config.fragment_shader.display()
    );

    let viewer = Viewer::new(document, CameraController::new(demo::HOME_ZOOM, demo::HOME_PAN));

    Runtime::run(RuntimeConfig::default(), GpuInit::default(), renderer_config, viewer)
}
