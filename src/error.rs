use thiserror::Error;

use crate::capability::InterfaceKind;

/// Errors raised while bringing up the surface, context and shader program.
///
/// Every variant is a setup failure: once the context is bound and the
/// geometry is uploaded, per-frame draw calls are assumed to succeed.
/// Degenerate matrix inputs are absorbed as no-ops and never surface here.
/// The decision to abort on a setup error belongs to the top-level caller,
/// not to the component that detected it.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("compositor connection failed: {0}")]
    Connection(String),

    #[error("missing required compositor global: {0}")]
    MissingGlobal(InterfaceKind),

    #[error("surface creation failed: {0}")]
    SurfaceCreation(String),

    #[error("drawable creation failed: {0}")]
    DrawableCreation(String),

    /// No framebuffer configuration satisfied the requirements; `matched`
    /// carries the count actually returned.
    #[error("no matching framebuffer configuration (got {matched})")]
    NoMatchingConfig { matched: usize },

    #[error("presentation surface creation failed: {0}")]
    PresentSurfaceCreation(String),

    #[error("rendering context creation failed: {0}")]
    ContextCreation(String),

    #[error("could not make the rendering context current: {0}")]
    MakeCurrent(String),

    #[error("shader program setup failed: {0}")]
    ShaderSetup(String),

    #[error("geometry buffer creation failed: {0}")]
    BufferCreation(String),

    #[error("event dispatch failed: {0}")]
    Dispatch(String),

    #[error("presenting the frame failed: {0}")]
    Present(String),
}
