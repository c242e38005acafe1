//! EGL/GLES2 backend: dynamically loads libEGL, wraps the compositor surface
//! in a resizable native window and binds a GLES2 context to it. The GL entry
//! points are resolved through `eglGetProcAddress` into a [`GlesApi`].

use std::ffi::c_void;

use tracing::{debug, info};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::Proxy;
use wayland_egl::WlEglSurface;

use glow::HasContext;
use khronos_egl as egl;

use crate::capability::{DrawApi, FramebufferRequirements, GpuContext};
use crate::error::SetupError;
use crate::geometry::VertexLayout;
use crate::matrix::Matrix4;

type EglInstance = egl::DynamicInstance<egl::EGL1_4>;

/// The EGL display plus the presentation surface and context bound to it.
pub struct EglDevice {
    egl: EglInstance,
    display: egl::Display,
    present_surface: Option<egl::Surface>,
    context: Option<egl::Context>,
}

impl EglDevice {
    /// Loads libEGL at runtime and initializes the display for the given
    /// native connection.
    pub fn new(native_display: *mut c_void) -> Result<EglDevice, SetupError> {
        let egl = unsafe { EglInstance::load_required() }
            .map_err(|err| SetupError::Connection(format!("loading libEGL: {err}")))?;
        let display = unsafe { egl.get_display(native_display as egl::NativeDisplayType) }
            .ok_or_else(|| SetupError::Connection("no EGL display for connection".into()))?;
        let (major, minor) = egl
            .initialize(display)
            .map_err(|err| SetupError::Connection(format!("initializing EGL: {err}")))?;
        info!(major, minor, "EGL display initialized");
        Ok(EglDevice {
            egl,
            display,
            present_surface: None,
            context: None,
        })
    }

    /// Resolves the GL entry points through the current context. Call after
    /// `make_current`.
    pub fn draw_api(&self) -> GlesApi {
        let gl = unsafe {
            glow::Context::from_loader_function(|name| {
                match self.egl.get_proc_address(name) {
                    Some(addr) => addr as *const c_void,
                    None => std::ptr::null(),
                }
            })
        };
        GlesApi { gl }
    }

    fn release_context(&mut self) {
        if let Some(context) = self.context.take() {
            // Unbind before destroying so the context is not current anywhere.
            let _ = self.egl.make_current(self.display, None, None, None);
            let _ = self.egl.destroy_context(self.display, context);
        }
    }

    fn release_present_surface(&mut self) {
        if let Some(surface) = self.present_surface.take() {
            let _ = self.egl.destroy_surface(self.display, surface);
        }
    }
}

impl Drop for EglDevice {
    fn drop(&mut self) {
        self.release_context();
        self.release_present_surface();
        let _ = self.egl.terminate(self.display);
    }
}

impl GpuContext<WlSurface> for EglDevice {
    type Drawable = WlEglSurface;
    type Config = egl::Config;

    fn create_drawable(
        &mut self,
        surface: &WlSurface,
        width: u32,
        height: u32,
    ) -> Result<WlEglSurface, SetupError> {
        WlEglSurface::new(surface.id(), width as i32, height as i32)
            .map_err(|err| SetupError::DrawableCreation(err.to_string()))
    }

    fn resize_drawable(&mut self, drawable: &mut WlEglSurface, width: u32, height: u32) {
        drawable.resize(width as i32, height as i32, 0, 0);
    }

    fn choose_config(
        &mut self,
        requirements: &FramebufferRequirements,
    ) -> Result<egl::Config, SetupError> {
        if requirements.api_version != 2 {
            return Err(SetupError::NoMatchingConfig { matched: 0 });
        }
        let surface_bit = if requirements.windowed {
            egl::WINDOW_BIT
        } else {
            egl::PBUFFER_BIT
        };
        let attributes = [
            egl::SURFACE_TYPE,
            surface_bit,
            egl::RENDERABLE_TYPE,
            egl::OPENGL_ES2_BIT,
            egl::RED_SIZE,
            requirements.red_bits as i32,
            egl::GREEN_SIZE,
            requirements.green_bits as i32,
            egl::BLUE_SIZE,
            requirements.blue_bits as i32,
            egl::NONE,
        ];
        // Capacity 1: the driver hands back at most one matching config.
        let mut configs = Vec::with_capacity(1);
        self.egl
            .choose_config(self.display, &attributes, &mut configs)
            .map_err(|err| SetupError::ContextCreation(format!("selecting config: {err}")))?;
        let matched = configs.len();
        debug!(matched, "framebuffer config selected");
        configs
            .into_iter()
            .next()
            .ok_or(SetupError::NoMatchingConfig { matched })
    }

    fn create_present_surface(
        &mut self,
        config: &egl::Config,
        drawable: &WlEglSurface,
    ) -> Result<(), SetupError> {
        let surface = unsafe {
            self.egl.create_window_surface(
                self.display,
                *config,
                drawable.ptr() as egl::NativeWindowType,
                None,
            )
        }
        .map_err(|err| SetupError::PresentSurfaceCreation(err.to_string()))?;
        self.present_surface = Some(surface);
        Ok(())
    }

    fn create_context(&mut self, config: &egl::Config) -> Result<(), SetupError> {
        let attributes = [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE];
        let context = self
            .egl
            .create_context(self.display, *config, None, &attributes)
            .map_err(|err| SetupError::ContextCreation(err.to_string()))?;
        self.context = Some(context);
        Ok(())
    }

    fn make_current(&mut self) -> Result<(), SetupError> {
        self.egl
            .make_current(
                self.display,
                self.present_surface,
                self.present_surface,
                self.context,
            )
            .map_err(|err| SetupError::MakeCurrent(err.to_string()))
    }

    fn swap_buffers(&mut self) -> Result<(), SetupError> {
        match self.present_surface {
            Some(surface) => self
                .egl
                .swap_buffers(self.display, surface)
                .map_err(|err| SetupError::Present(err.to_string())),
            None => Err(SetupError::Present("no presentation surface bound".into())),
        }
    }

    fn destroy_context(&mut self) {
        self.release_context();
    }

    fn destroy_present_surface(&mut self) {
        self.release_present_surface();
    }

    fn destroy_drawable(&mut self, drawable: WlEglSurface) {
        // The native window is freed when the wrapper drops.
        drop(drawable);
    }
}

/// GLES2 draw calls over the loaded function pointers.
pub struct GlesApi {
    gl: glow::Context,
}

impl GlesApi {
    fn compile_stage(&self, kind: u32, source: &str) -> Result<glow::NativeShader, SetupError> {
        let gl = &self.gl;
        unsafe {
            let shader = gl
                .create_shader(kind)
                .map_err(SetupError::ShaderSetup)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(SetupError::ShaderSetup(format!("compile error: {log}")));
            }
            Ok(shader)
        }
    }
}

impl DrawApi for GlesApi {
    type Program = glow::NativeProgram;
    type Buffer = glow::NativeBuffer;
    type Uniform = glow::NativeUniformLocation;

    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<glow::NativeProgram, SetupError> {
        let vertex = self.compile_stage(glow::VERTEX_SHADER, vertex_source)?;
        let fragment = match self.compile_stage(glow::FRAGMENT_SHADER, fragment_source) {
            Ok(shader) => shader,
            Err(err) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(err);
            }
        };
        let gl = &self.gl;
        unsafe {
            let program = match gl.create_program() {
                Ok(program) => program,
                Err(message) => {
                    gl.delete_shader(vertex);
                    gl.delete_shader(fragment);
                    return Err(SetupError::ShaderSetup(message));
                }
            };
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            // The linked program keeps its own reference to the stages.
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(SetupError::ShaderSetup(format!("link error: {log}")));
            }
            Ok(program)
        }
    }

    fn attribute_location(
        &mut self,
        program: &glow::NativeProgram,
        name: &str,
    ) -> Result<u32, SetupError> {
        unsafe { self.gl.get_attrib_location(*program, name) }
            .ok_or_else(|| SetupError::ShaderSetup(format!("missing attribute {name}")))
    }

    fn uniform_location(
        &mut self,
        program: &glow::NativeProgram,
        name: &str,
    ) -> Result<glow::NativeUniformLocation, SetupError> {
        unsafe { self.gl.get_uniform_location(*program, name) }
            .ok_or_else(|| SetupError::ShaderSetup(format!("missing uniform {name}")))
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<glow::NativeBuffer, SetupError> {
        let gl = &self.gl;
        unsafe {
            let buffer = gl.create_buffer().map_err(SetupError::BufferCreation)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
            Ok(buffer)
        }
    }

    fn create_index_buffer(&mut self, data: &[u16]) -> Result<glow::NativeBuffer, SetupError> {
        let gl = &self.gl;
        unsafe {
            let buffer = gl.create_buffer().map_err(SetupError::BufferCreation)?;
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
            Ok(buffer)
        }
    }

    fn configure_pipeline_state(&mut self) {
        let gl = &self.gl;
        unsafe {
            gl.enable(glow::DEPTH_TEST);
            gl.disable(glow::BLEND);
            gl.enable(glow::CULL_FACE);
            gl.cull_face(glow::BACK);
            // The cube indices wind camera-facing triangles clockwise.
            gl.front_face(glow::CW);
            gl.clear_color(0.0, 0.0, 0.0, 1.0);
            gl.clear_depth_f32(1.0);
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
    }

    fn clear_frame(&mut self) {
        unsafe {
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT)
        };
    }

    fn draw_indexed(
        &mut self,
        program: &glow::NativeProgram,
        vertices: &glow::NativeBuffer,
        indices: &glow::NativeBuffer,
        layout: &VertexLayout,
        mvp_slot: &glow::NativeUniformLocation,
        mvp: &Matrix4,
        index_count: i32,
    ) {
        let gl = &self.gl;
        unsafe {
            gl.use_program(Some(*program));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(*vertices));
            gl.vertex_attrib_pointer_f32(
                layout.position_slot,
                layout.components,
                glow::FLOAT,
                false,
                layout.stride,
                layout.position_offset,
            );
            gl.vertex_attrib_pointer_f32(
                layout.color_slot,
                layout.components,
                glow::FLOAT,
                false,
                layout.stride,
                layout.color_offset,
            );
            gl.enable_vertex_attrib_array(layout.position_slot);
            gl.enable_vertex_attrib_array(layout.color_slot);
            gl.uniform_matrix_4_f32_slice(Some(mvp_slot), false, &mvp.to_array());
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(*indices));
            gl.draw_elements(glow::TRIANGLES, index_count, glow::UNSIGNED_SHORT, 0);
        }
    }

    fn destroy_buffer(&mut self, buffer: glow::NativeBuffer) {
        unsafe { self.gl.delete_buffer(buffer) };
    }

    fn destroy_program(&mut self, program: glow::NativeProgram) {
        unsafe { self.gl.delete_program(program) };
    }
}
