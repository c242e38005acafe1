//! Capability traits for the external collaborators: the compositor protocol
//! client, the EGL-style GPU context API and the shader compiler. The core
//! only ever talks to these traits; concrete backends live in
//! [`crate::backend`] and the tests substitute mocks.

use std::fmt;

use crate::error::SetupError;
use crate::geometry::VertexLayout;
use crate::matrix::Matrix4;

/// Compositor globals the binder cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// Surface-allocator capability.
    Compositor,
    /// Shell/toplevel capability.
    Shell,
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceKind::Compositor => write!(f, "compositor"),
            InterfaceKind::Shell => write!(f, "shell"),
        }
    }
}

/// Shell events delivered synchronously from the non-blocking pump, on the
/// calling thread, before the pump returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Liveness probe; must be acknowledged with the received serial.
    Ping { serial: u32 },
    /// Compositor-driven resize carrying the new dimensions.
    Configure { width: u32, height: u32 },
    /// Irrelevant to a toplevel-only client.
    PopupDismissed,
}

/// Connection to the windowing collaborator: registry state, surface and
/// toplevel objects, event delivery.
///
/// Handles are move-only associated types with explicit destroy operations;
/// creation-order constraints are enforced by [`crate::binder::SurfaceBinder`],
/// never by caller discipline.
pub trait WindowingConnection {
    type Surface;
    type Toplevel;

    /// Blocking request/acknowledge exchange; used once at startup to
    /// guarantee the initial globals have been advertised.
    fn roundtrip(&mut self) -> Result<(), SetupError>;

    /// Drains pending events without blocking, appending them to `events` in
    /// arrival order.
    fn pump_events(&mut self, events: &mut Vec<WindowEvent>) -> Result<(), SetupError>;

    /// Whether the given global was advertised and bound.
    fn has_global(&self, kind: InterfaceKind) -> bool;

    fn create_surface(&mut self) -> Result<Self::Surface, SetupError>;

    /// Marks an opaque region covering `width`×`height`. A hint only; the
    /// compositor copies the region when it is set.
    fn set_opaque_region(&mut self, surface: &Self::Surface, width: i32, height: i32);

    fn create_toplevel(
        &mut self,
        surface: &Self::Surface,
        title: &str,
    ) -> Result<Self::Toplevel, SetupError>;

    /// Answers a [`WindowEvent::Ping`] with the serial it carried.
    fn acknowledge_ping(&mut self, toplevel: &Self::Toplevel, serial: u32);

    fn destroy_toplevel(&mut self, toplevel: Self::Toplevel);

    fn destroy_surface(&mut self, surface: Self::Surface);
}

/// Minimum framebuffer capabilities requested during config selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferRequirements {
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    /// Major version of the rendering API the context must expose.
    pub api_version: u8,
    /// Windowed surface capability rather than an offscreen buffer.
    pub windowed: bool,
}

impl Default for FramebufferRequirements {
    fn default() -> Self {
        FramebufferRequirements {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            api_version: 2,
            windowed: true,
        }
    }
}

/// The GPU context collaborator: drawable wrapping, config selection, context
/// binding and presentation. The presentation surface and rendering context
/// are owned inside the implementation; both must be destroyed before the
/// drawable they are bound to.
pub trait GpuContext<S> {
    type Drawable;
    type Config;

    fn create_drawable(
        &mut self,
        surface: &S,
        width: u32,
        height: u32,
    ) -> Result<Self::Drawable, SetupError>;

    /// Resizes the drawable in place; the bound context is untouched.
    fn resize_drawable(&mut self, drawable: &mut Self::Drawable, width: u32, height: u32);

    /// Selects a single configuration satisfying `requirements`; fails when
    /// none match.
    fn choose_config(
        &mut self,
        requirements: &FramebufferRequirements,
    ) -> Result<Self::Config, SetupError>;

    fn create_present_surface(
        &mut self,
        config: &Self::Config,
        drawable: &Self::Drawable,
    ) -> Result<(), SetupError>;

    fn create_context(&mut self, config: &Self::Config) -> Result<(), SetupError>;

    /// Binds context and presentation surface as current for the calling
    /// thread.
    fn make_current(&mut self) -> Result<(), SetupError>;

    /// Presents the frame. The only per-frame operation that may block,
    /// depending on compositor vertical-sync policy.
    fn swap_buffers(&mut self) -> Result<(), SetupError>;

    fn destroy_context(&mut self);

    fn destroy_present_surface(&mut self);

    fn destroy_drawable(&mut self, drawable: Self::Drawable);
}

/// Shader compilation plus the per-frame draw calls. Shader sources are
/// opaque GLSL text; compilation yields attribute/uniform slots by name.
pub trait DrawApi {
    type Program;
    type Buffer;
    type Uniform;

    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, SetupError>;

    fn attribute_location(
        &mut self,
        program: &Self::Program,
        name: &str,
    ) -> Result<u32, SetupError>;

    fn uniform_location(
        &mut self,
        program: &Self::Program,
        name: &str,
    ) -> Result<Self::Uniform, SetupError>;

    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<Self::Buffer, SetupError>;

    fn create_index_buffer(&mut self, data: &[u16]) -> Result<Self::Buffer, SetupError>;

    /// One-time raster state: depth test on, back-face culling on (clockwise
    /// triangles are front-facing), blending off, black clear color, clear
    /// depth 1.0.
    fn configure_pipeline_state(&mut self);

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clears color and depth.
    fn clear_frame(&mut self);

    /// Draws `index_count` indices as triangles with the interleaved layout
    /// and the given MVP uniform value.
    #[allow(clippy::too_many_arguments)]
    fn draw_indexed(
        &mut self,
        program: &Self::Program,
        vertices: &Self::Buffer,
        indices: &Self::Buffer,
        layout: &VertexLayout,
        mvp_slot: &Self::Uniform,
        mvp: &Matrix4,
        index_count: i32,
    );

    fn destroy_buffer(&mut self, buffer: Self::Buffer);

    fn destroy_program(&mut self, program: Self::Program);
}
