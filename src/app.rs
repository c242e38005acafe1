//! Application wiring: connects the Wayland and EGL backends, brings up the
//! cube renderer and runs the render loop until an error or signal ends the
//! process.

use anyhow::Context;
use tracing::info;

use crate::backend::{EglDevice, WaylandConnection};
use crate::capability::DrawApi;
use crate::binder::SurfaceBinder;
use crate::renderer::{render_frame, CubeRenderer};
use crate::transform::TransformPipeline;

const WINDOW_TITLE: &str = "waycube";
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

pub fn run() -> Result<(), anyhow::Error> {
    let windowing = WaylandConnection::connect().context("connecting to the compositor")?;
    let gpu = EglDevice::new(windowing.display_ptr()).context("initializing EGL")?;

    let mut binder = SurfaceBinder::new(windowing, gpu, WINDOW_TITLE, WINDOW_WIDTH, WINDOW_HEIGHT)
        .context("binding the surface to a rendering context")?;

    let mut api = binder.gpu().draw_api();
    let renderer = CubeRenderer::new(&mut api).context("setting up the cube renderer")?;
    api.configure_pipeline_state();

    let (width, height) = binder.size();
    api.set_viewport(width, height);
    let mut pipeline = TransformPipeline::new(width, height);

    info!(width, height, "entering render loop");
    loop {
        render_frame(&mut binder, &mut pipeline, &renderer, &mut api)
            .context("rendering a frame")?;
    }
}
