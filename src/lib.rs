//! Rotating-cube Wayland client.
//!
//! A row-major 4×4 matrix library ([`matrix`]) feeds a deterministic
//! model-view-projection pipeline ([`transform`]); the [`binder`] negotiates a
//! compositor surface and binds a GPU rendering context to it through the
//! capability traits in [`capability`]; the [`renderer`] owns the shader
//! program and geometry and drives the per-frame draw. Concrete Wayland and
//! EGL/GLES2 backends live in [`backend`] behind the `wayland` feature; the
//! core stays backend-agnostic and fully testable with mocks.

#[cfg(feature = "wayland")]
pub mod app;
#[cfg(feature = "wayland")]
pub mod backend;
pub mod binder;
pub mod capability;
pub mod error;
pub mod geometry;
pub mod matrix;
pub mod renderer;
pub mod shaders;
pub mod transform;

pub use binder::SurfaceBinder;
pub use capability::{
    DrawApi, FramebufferRequirements, GpuContext, InterfaceKind, WindowEvent, WindowingConnection,
};
pub use error::SetupError;
pub use matrix::Matrix4;
pub use renderer::{render_frame, CubeRenderer};
pub use transform::{RenderState, TransformPipeline};
