//! Wayland backend: binds the compositor and shell globals, creates the
//! surface and toplevel and translates shell-surface events into
//! [`WindowEvent`]s.

use std::ffi::c_void;
use std::io::ErrorKind;

use tracing::{debug, warn};
use wayland_client::backend::WaylandError;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_region::WlRegion;
use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::protocol::wl_shell::WlShell;
use wayland_client::protocol::wl_shell_surface::{self, WlShellSurface};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{delegate_noop, Connection, Dispatch, EventQueue, QueueHandle};

use crate::capability::{InterfaceKind, WindowEvent, WindowingConnection};
use crate::error::SetupError;

/// Registry bindings plus the queue of translated shell events.
#[derive(Default)]
struct ConnectionState {
    compositor: Option<WlCompositor>,
    shell: Option<WlShell>,
    events: Vec<WindowEvent>,
}

impl Dispatch<WlRegistry, ()> for ConnectionState {
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _data: &(),
        _conn: &Connection,
        qhandle: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version: _,
            } => match interface.as_str() {
                "wl_compositor" => {
                    debug!(name, "binding wl_compositor");
                    state.compositor =
                        Some(registry.bind::<WlCompositor, _, _>(name, 1, qhandle, ()));
                }
                "wl_shell" => {
                    debug!(name, "binding wl_shell");
                    state.shell = Some(registry.bind::<WlShell, _, _>(name, 1, qhandle, ()));
                }
                _ => {}
            },
            wl_registry::Event::GlobalRemove { name } => {
                warn!(name, "global removed");
            }
            _ => {}
        }
    }
}

impl Dispatch<WlShellSurface, ()> for ConnectionState {
    fn event(
        state: &mut Self,
        _toplevel: &WlShellSurface,
        event: wl_shell_surface::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        match event {
            wl_shell_surface::Event::Ping { serial } => {
                state.events.push(WindowEvent::Ping { serial });
            }
            wl_shell_surface::Event::Configure {
                edges: _,
                width,
                height,
            } => {
                state.events.push(WindowEvent::Configure {
                    width: width.max(0) as u32,
                    height: height.max(0) as u32,
                });
            }
            wl_shell_surface::Event::PopupDone => {
                state.events.push(WindowEvent::PopupDismissed);
            }
            _ => {}
        }
    }
}

delegate_noop!(ConnectionState: ignore WlCompositor);
delegate_noop!(ConnectionState: ignore WlShell);
delegate_noop!(ConnectionState: ignore WlSurface);
delegate_noop!(ConnectionState: ignore WlRegion);

/// Live connection to the compositor. Owns the event queue and the bound
/// globals.
pub struct WaylandConnection {
    connection: Connection,
    queue: EventQueue<ConnectionState>,
    qhandle: QueueHandle<ConnectionState>,
    state: ConnectionState,
}

impl WaylandConnection {
    /// Connects to the compositor named by the environment and requests the
    /// registry. The globals arrive with the first roundtrip.
    pub fn connect() -> Result<WaylandConnection, SetupError> {
        let connection = Connection::connect_to_env()
            .map_err(|err| SetupError::Connection(err.to_string()))?;
        let queue = connection.new_event_queue();
        let qhandle = queue.handle();
        connection.display().get_registry(&qhandle, ());
        Ok(WaylandConnection {
            connection,
            queue,
            qhandle,
            state: ConnectionState::default(),
        })
    }

    /// Raw display pointer for handing the connection to EGL.
    pub fn display_ptr(&self) -> *mut c_void {
        self.connection.backend().display_ptr() as *mut c_void
    }
}

impl WindowingConnection for WaylandConnection {
    type Surface = WlSurface;
    type Toplevel = WlShellSurface;

    fn roundtrip(&mut self) -> Result<(), SetupError> {
        self.queue
            .roundtrip(&mut self.state)
            .map_err(|err| SetupError::Dispatch(err.to_string()))?;
        Ok(())
    }

    fn pump_events(&mut self, events: &mut Vec<WindowEvent>) -> Result<(), SetupError> {
        self.connection
            .flush()
            .map_err(|err| SetupError::Dispatch(err.to_string()))?;
        if let Some(guard) = self.queue.prepare_read() {
            match guard.read() {
                Ok(_) => {}
                // Nothing to read this frame.
                Err(WaylandError::Io(err)) if err.kind() == ErrorKind::WouldBlock => {}
                Err(err) => return Err(SetupError::Dispatch(err.to_string())),
            }
        }
        self.queue
            .dispatch_pending(&mut self.state)
            .map_err(|err| SetupError::Dispatch(err.to_string()))?;
        events.append(&mut self.state.events);
        Ok(())
    }

    fn has_global(&self, kind: InterfaceKind) -> bool {
        match kind {
            InterfaceKind::Compositor => self.state.compositor.is_some(),
            InterfaceKind::Shell => self.state.shell.is_some(),
        }
    }

    fn create_surface(&mut self) -> Result<WlSurface, SetupError> {
        let compositor = self
            .state
            .compositor
            .as_ref()
            .ok_or(SetupError::MissingGlobal(InterfaceKind::Compositor))?;
        Ok(compositor.create_surface(&self.qhandle, ()))
    }

    fn set_opaque_region(&mut self, surface: &WlSurface, width: i32, height: i32) {
        if let Some(compositor) = &self.state.compositor {
            let region = compositor.create_region(&self.qhandle, ());
            region.add(0, 0, width, height);
            surface.set_opaque_region(Some(&region));
            // The compositor copies the region on set; the object can go.
            region.destroy();
        }
    }

    fn create_toplevel(
        &mut self,
        surface: &WlSurface,
        title: &str,
    ) -> Result<WlShellSurface, SetupError> {
        let shell = self
            .state
            .shell
            .as_ref()
            .ok_or(SetupError::MissingGlobal(InterfaceKind::Shell))?;
        let toplevel = shell.get_shell_surface(surface, &self.qhandle, ());
        toplevel.set_title(title.to_string());
        toplevel.set_toplevel();
        Ok(toplevel)
    }

    fn acknowledge_ping(&mut self, toplevel: &WlShellSurface, serial: u32) {
        toplevel.pong(serial);
    }

    fn destroy_toplevel(&mut self, toplevel: WlShellSurface) {
        // wl_shell_surface has no destructor request; dropping the proxy
        // releases the client-side object.
        drop(toplevel);
    }

    fn destroy_surface(&mut self, surface: WlSurface) {
        surface.destroy();
    }
}
