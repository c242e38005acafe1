//! Concrete backends for the capability traits: the Wayland protocol client
//! and the EGL/GLES2 context device.

pub mod egl;
pub mod wayland;

pub use egl::{EglDevice, GlesApi};
pub use wayland::WaylandConnection;
