//! Cube renderer: owns the compiled program, the uploaded geometry buffers
//! and the resolved attribute/uniform slots, and issues the per-frame draw.

use tracing::{debug, info};

use crate::binder::SurfaceBinder;
use crate::capability::{DrawApi, GpuContext, WindowingConnection};
use crate::error::SetupError;
use crate::geometry::{VertexLayout, CUBE_INDICES, CUBE_VERTICES};
use crate::matrix::Matrix4;
use crate::shaders::{
    COLOR_ATTRIBUTE, FRAGMENT_SHADER, MVP_UNIFORM, POSITION_ATTRIBUTE, VERTEX_SHADER,
};
use crate::transform::TransformPipeline;

pub struct CubeRenderer<D: DrawApi> {
    program: D::Program,
    vertex_buffer: D::Buffer,
    index_buffer: D::Buffer,
    mvp_slot: D::Uniform,
    layout: VertexLayout,
    index_count: i32,
}

impl<D: DrawApi> CubeRenderer<D> {
    /// Compiles the cube program, resolves its slots and uploads the static
    /// geometry. On failure, anything already created is destroyed before the
    /// error is returned.
    pub fn new(api: &mut D) -> Result<CubeRenderer<D>, SetupError> {
        let program = api.compile_program(VERTEX_SHADER, FRAGMENT_SHADER)?;
        match Self::bind_resources(api, &program) {
            Ok((vertex_buffer, index_buffer, mvp_slot, layout)) => {
                info!("cube program compiled and geometry uploaded");
                Ok(CubeRenderer {
                    program,
                    vertex_buffer,
                    index_buffer,
                    mvp_slot,
                    layout,
                    index_count: CUBE_INDICES.len() as i32,
                })
            }
            Err(err) => {
                api.destroy_program(program);
                Err(err)
            }
        }
    }

    fn bind_resources(
        api: &mut D,
        program: &D::Program,
    ) -> Result<(D::Buffer, D::Buffer, D::Uniform, VertexLayout), SetupError> {
        let position_slot = api.attribute_location(program, POSITION_ATTRIBUTE)?;
        let color_slot = api.attribute_location(program, COLOR_ATTRIBUTE)?;
        let mvp_slot = api.uniform_location(program, MVP_UNIFORM)?;
        debug!(position_slot, color_slot, "attribute slots resolved");

        let vertex_buffer = api.create_vertex_buffer(&CUBE_VERTICES)?;
        let index_buffer = match api.create_index_buffer(&CUBE_INDICES) {
            Ok(buffer) => buffer,
            Err(err) => {
                api.destroy_buffer(vertex_buffer);
                return Err(err);
            }
        };
        let layout = VertexLayout::interleaved(position_slot, color_slot);
        Ok((vertex_buffer, index_buffer, mvp_slot, layout))
    }

    /// Draws the cube with the given MVP matrix.
    pub fn draw(&self, api: &mut D, mvp: &Matrix4) {
        api.draw_indexed(
            &self.program,
            &self.vertex_buffer,
            &self.index_buffer,
            &self.layout,
            &self.mvp_slot,
            mvp,
            self.index_count,
        );
    }

    /// Destroys the buffers and the program. Consumes the renderer; the draw
    /// resources cannot be used afterwards.
    pub fn release(self, api: &mut D) {
        api.destroy_buffer(self.index_buffer);
        api.destroy_buffer(self.vertex_buffer);
        api.destroy_program(self.program);
    }
}

/// One iteration of the render loop: pump windowing events (propagating any
/// resize to both the projection and the viewport), clear, advance the
/// rotation, draw and present.
pub fn render_frame<W, G, D>(
    binder: &mut SurfaceBinder<W, G>,
    pipeline: &mut TransformPipeline,
    renderer: &CubeRenderer<D>,
    api: &mut D,
) -> Result<(), SetupError>
where
    W: WindowingConnection,
    G: GpuContext<W::Surface>,
    D: DrawApi,
{
    if let Some((width, height)) = binder.pump_frame_events()? {
        pipeline.set_viewport(width, height);
        api.set_viewport(width, height);
    }
    api.clear_frame();
    let mvp = pipeline.advance();
    renderer.draw(api, mvp);
    binder.present()
}
