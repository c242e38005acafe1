//! Surface/context binder: negotiates the drawable surface from the
//! compositor, binds the GPU rendering context to it and owns both for the
//! process lifetime.
//!
//! Acquisition order is a strict dependency chain (globals → surface →
//! toplevel → drawable → config → presentation surface → context) and
//! teardown runs in exact reverse order on every exit path, including setup
//! failures, so no partially-created window is ever left behind.

use tracing::{debug, info};

use crate::capability::{
    FramebufferRequirements, GpuContext, InterfaceKind, WindowEvent, WindowingConnection,
};
use crate::error::SetupError;

pub struct SurfaceBinder<W, G>
where
    W: WindowingConnection,
    G: GpuContext<W::Surface>,
{
    windowing: W,
    gpu: G,
    surface: Option<W::Surface>,
    toplevel: Option<W::Toplevel>,
    drawable: Option<G::Drawable>,
    present_surface_bound: bool,
    context_bound: bool,
    width: u32,
    height: u32,
}

impl<W, G> SurfaceBinder<W, G>
where
    W: WindowingConnection,
    G: GpuContext<W::Surface>,
{
    /// Runs the full negotiation sequence. On any failure, everything created
    /// so far is released in reverse order before the error is returned.
    pub fn new(
        windowing: W,
        gpu: G,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Self, SetupError> {
        let mut binder = SurfaceBinder {
            windowing,
            gpu,
            surface: None,
            toplevel: None,
            drawable: None,
            present_surface_bound: false,
            context_bound: false,
            width,
            height,
        };
        match binder.initialize(title) {
            Ok(()) => Ok(binder),
            Err(err) => {
                binder.release();
                Err(err)
            }
        }
    }

    fn initialize(&mut self, title: &str) -> Result<(), SetupError> {
        // One blocking round-trip guarantees the initial globals have been
        // advertised before we check for them.
        self.windowing.roundtrip()?;
        for kind in [InterfaceKind::Compositor, InterfaceKind::Shell] {
            if !self.windowing.has_global(kind) {
                return Err(SetupError::MissingGlobal(kind));
            }
        }
        debug!("compositor and shell globals bound");

        self.surface = Some(self.windowing.create_surface()?);
        if let Some(surface) = &self.surface {
            self.windowing
                .set_opaque_region(surface, self.width as i32, self.height as i32);
            self.toplevel = Some(self.windowing.create_toplevel(surface, title)?);
            self.drawable = Some(self.gpu.create_drawable(surface, self.width, self.height)?);
        }
        debug!(width = self.width, height = self.height, "drawable created");

        let config = self.gpu.choose_config(&FramebufferRequirements::default())?;
        if let Some(drawable) = &self.drawable {
            self.gpu.create_present_surface(&config, drawable)?;
            self.present_surface_bound = true;
        }
        self.gpu.create_context(&config)?;
        self.context_bound = true;
        self.gpu.make_current()?;

        info!(
            width = self.width,
            height = self.height,
            "surface bound to rendering context"
        );
        Ok(())
    }

    /// Drains pending windowing events without blocking. Pings are
    /// acknowledged immediately with the received serial; configure events
    /// resize the drawable in place (the context is untouched) and the last
    /// new size is returned so the caller can recompute the projection.
    pub fn pump_frame_events(&mut self) -> Result<Option<(u32, u32)>, SetupError> {
        let mut events = Vec::new();
        self.windowing.pump_events(&mut events)?;

        let mut resized = None;
        for event in events {
            match event {
                WindowEvent::Ping { serial } => {
                    if let Some(toplevel) = &self.toplevel {
                        self.windowing.acknowledge_ping(toplevel, serial);
                    }
                }
                WindowEvent::Configure { width, height } => {
                    if width == 0 || height == 0 {
                        continue;
                    }
                    if let Some(drawable) = &mut self.drawable {
                        self.gpu.resize_drawable(drawable, width, height);
                    }
                    self.width = width;
                    self.height = height;
                    resized = Some((width, height));
                    debug!(width, height, "drawable resized");
                }
                WindowEvent::PopupDismissed => {}
            }
        }
        Ok(resized)
    }

    /// Swaps the presentation surface. May block on vertical sync.
    pub fn present(&mut self) -> Result<(), SetupError> {
        self.gpu.swap_buffers()
    }

    /// Current drawable dimensions.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    /// Tears everything down in exact reverse creation order: context,
    /// presentation surface, drawable, toplevel, surface. Idempotent; each
    /// handle is released exactly once.
    pub fn release(&mut self) {
        if self.context_bound {
            self.gpu.destroy_context();
            self.context_bound = false;
        }
        if self.present_surface_bound {
            self.gpu.destroy_present_surface();
            self.present_surface_bound = false;
        }
        if let Some(drawable) = self.drawable.take() {
            self.gpu.destroy_drawable(drawable);
        }
        if let Some(toplevel) = self.toplevel.take() {
            self.windowing.destroy_toplevel(toplevel);
        }
        if let Some(surface) = self.surface.take() {
            self.windowing.destroy_surface(surface);
        }
    }
}

impl<W, G> Drop for SurfaceBinder<W, G>
where
    W: WindowingConnection,
    G: GpuContext<W::Surface>,
{
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type OpLog = Rc<RefCell<Vec<String>>>;

    struct MockWindowing {
        log: OpLog,
        advertise_compositor: bool,
        advertise_shell: bool,
        queued_events: Vec<WindowEvent>,
    }

    impl MockWindowing {
        fn new(log: OpLog) -> Self {
            MockWindowing {
                log,
                advertise_compositor: true,
                advertise_shell: true,
                queued_events: Vec::new(),
            }
        }
    }

    impl WindowingConnection for MockWindowing {
        type Surface = u32;
        type Toplevel = u32;

        fn roundtrip(&mut self) -> Result<(), SetupError> {
            self.log.borrow_mut().push("roundtrip".into());
            Ok(())
        }

        fn pump_events(&mut self, events: &mut Vec<WindowEvent>) -> Result<(), SetupError> {
            self.log.borrow_mut().push("pump".into());
            events.append(&mut self.queued_events);
            Ok(())
        }

        fn has_global(&self, kind: InterfaceKind) -> bool {
            match kind {
                InterfaceKind::Compositor => self.advertise_compositor,
                InterfaceKind::Shell => self.advertise_shell,
            }
        }

        fn create_surface(&mut self) -> Result<u32, SetupError> {
            self.log.borrow_mut().push("create_surface".into());
            Ok(11)
        }

        fn set_opaque_region(&mut self, _surface: &u32, width: i32, height: i32) {
            self.log
                .borrow_mut()
                .push(format!("opaque_region:{width}x{height}"));
        }

        fn create_toplevel(&mut self, _surface: &u32, title: &str) -> Result<u32, SetupError> {
            self.log.borrow_mut().push(format!("create_toplevel:{title}"));
            Ok(22)
        }

        fn acknowledge_ping(&mut self, _toplevel: &u32, serial: u32) {
            self.log.borrow_mut().push(format!("pong:{serial}"));
        }

        fn destroy_toplevel(&mut self, toplevel: u32) {
            assert_eq!(toplevel, 22);
            self.log.borrow_mut().push("destroy_toplevel".into());
        }

        fn destroy_surface(&mut self, surface: u32) {
            assert_eq!(surface, 11);
            self.log.borrow_mut().push("destroy_surface".into());
        }
    }

    struct MockGpu {
        log: OpLog,
        fail_drawable: bool,
        config_matches: usize,
        fail_context: bool,
    }

    impl MockGpu {
        fn new(log: OpLog) -> Self {
            MockGpu {
                log,
                fail_drawable: false,
                config_matches: 1,
                fail_context: false,
            }
        }
    }

    impl GpuContext<u32> for MockGpu {
        type Drawable = u32;
        type Config = ();

        fn create_drawable(
            &mut self,
            _surface: &u32,
            width: u32,
            height: u32,
        ) -> Result<u32, SetupError> {
            if self.fail_drawable {
                return Err(SetupError::DrawableCreation("mock failure".into()));
            }
            self.log
                .borrow_mut()
                .push(format!("create_drawable:{width}x{height}"));
            Ok(33)
        }

        fn resize_drawable(&mut self, drawable: &mut u32, width: u32, height: u32) {
            assert_eq!(*drawable, 33);
            self.log
                .borrow_mut()
                .push(format!("resize_drawable:{width}x{height}"));
        }

        fn choose_config(
            &mut self,
            requirements: &FramebufferRequirements,
        ) -> Result<(), SetupError> {
            assert_eq!(*requirements, FramebufferRequirements::default());
            if self.config_matches == 0 {
                return Err(SetupError::NoMatchingConfig { matched: 0 });
            }
            self.log.borrow_mut().push("choose_config".into());
            Ok(())
        }

        fn create_present_surface(&mut self, _config: &(), _drawable: &u32) -> Result<(), SetupError> {
            self.log.borrow_mut().push("create_present_surface".into());
            Ok(())
        }

        fn create_context(&mut self, _config: &()) -> Result<(), SetupError> {
            if self.fail_context {
                return Err(SetupError::ContextCreation("mock failure".into()));
            }
            self.log.borrow_mut().push("create_context".into());
            Ok(())
        }

        fn make_current(&mut self) -> Result<(), SetupError> {
            self.log.borrow_mut().push("make_current".into());
            Ok(())
        }

        fn swap_buffers(&mut self) -> Result<(), SetupError> {
            self.log.borrow_mut().push("swap_buffers".into());
            Ok(())
        }

        fn destroy_context(&mut self) {
            self.log.borrow_mut().push("destroy_context".into());
        }

        fn destroy_present_surface(&mut self) {
            self.log.borrow_mut().push("destroy_present_surface".into());
        }

        fn destroy_drawable(&mut self, drawable: u32) {
            assert_eq!(drawable, 33);
            self.log.borrow_mut().push("destroy_drawable".into());
        }
    }

    fn count(log: &OpLog, op: &str) -> usize {
        log.borrow().iter().filter(|entry| entry.as_str() == op).count()
    }

    #[test]
    fn setup_runs_the_required_sequence_in_order() {
        let log: OpLog = Rc::default();
        let binder = SurfaceBinder::new(
            MockWindowing::new(log.clone()),
            MockGpu::new(log.clone()),
            "cube",
            1280,
            720,
        )
        .expect("setup succeeds");
        assert_eq!(binder.size(), (1280, 720));
        assert_eq!(
            *log.borrow(),
            vec![
                "roundtrip",
                "create_surface",
                "opaque_region:1280x720",
                "create_toplevel:cube",
                "create_drawable:1280x720",
                "choose_config",
                "create_present_surface",
                "create_context",
                "make_current",
            ]
        );
    }

    #[test]
    fn missing_shell_global_fails_before_any_creation() {
        let log: OpLog = Rc::default();
        let mut windowing = MockWindowing::new(log.clone());
        windowing.advertise_shell = false;
        let result = SurfaceBinder::new(windowing, MockGpu::new(log.clone()), "cube", 1280, 720);
        assert!(matches!(
            result.err(),
            Some(SetupError::MissingGlobal(InterfaceKind::Shell))
        ));
        // Nothing was created, so nothing must be destroyed.
        assert_eq!(*log.borrow(), vec!["roundtrip"]);
    }

    #[test]
    fn drawable_failure_releases_the_partial_window() {
        let log: OpLog = Rc::default();
        let mut gpu = MockGpu::new(log.clone());
        gpu.fail_drawable = true;
        let result = SurfaceBinder::new(MockWindowing::new(log.clone()), gpu, "cube", 1280, 720);
        assert!(matches!(result.err(), Some(SetupError::DrawableCreation(_))));
        let entries = log.borrow();
        assert_eq!(
            entries[entries.len() - 2..],
            ["destroy_toplevel".to_string(), "destroy_surface".to_string()]
        );
        assert_eq!(count(&log, "destroy_context"), 0);
        assert_eq!(count(&log, "destroy_present_surface"), 0);
        assert_eq!(count(&log, "destroy_drawable"), 0);
    }

    #[test]
    fn no_matching_config_releases_partial_resources() {
        let log: OpLog = Rc::default();
        let mut gpu = MockGpu::new(log.clone());
        gpu.config_matches = 0;
        let result = SurfaceBinder::new(MockWindowing::new(log.clone()), gpu, "cube", 1280, 720);
        assert!(matches!(
            result.err(),
            Some(SetupError::NoMatchingConfig { matched: 0 })
        ));
        let entries = log.borrow();
        assert_eq!(
            entries[entries.len() - 3..],
            [
                "destroy_drawable".to_string(),
                "destroy_toplevel".to_string(),
                "destroy_surface".to_string(),
            ]
        );
    }

    #[test]
    fn context_failure_releases_the_present_surface_too() {
        let log: OpLog = Rc::default();
        let mut gpu = MockGpu::new(log.clone());
        gpu.fail_context = true;
        let result = SurfaceBinder::new(MockWindowing::new(log.clone()), gpu, "cube", 1280, 720);
        assert!(matches!(result.err(), Some(SetupError::ContextCreation(_))));
        assert_eq!(count(&log, "destroy_present_surface"), 1);
        assert_eq!(count(&log, "destroy_context"), 0);
    }

    #[test]
    fn teardown_releases_in_reverse_creation_order_exactly_once() {
        let log: OpLog = Rc::default();
        let binder = SurfaceBinder::new(
            MockWindowing::new(log.clone()),
            MockGpu::new(log.clone()),
            "cube",
            1280,
            720,
        )
        .expect("setup succeeds");
        drop(binder);

        let entries = log.borrow();
        assert_eq!(
            entries[entries.len() - 5..],
            [
                "destroy_context".to_string(),
                "destroy_present_surface".to_string(),
                "destroy_drawable".to_string(),
                "destroy_toplevel".to_string(),
                "destroy_surface".to_string(),
            ]
        );
        drop(entries);
        for op in [
            "destroy_context",
            "destroy_present_surface",
            "destroy_drawable",
            "destroy_toplevel",
            "destroy_surface",
        ] {
            assert_eq!(count(&log, op), 1, "{op} must run exactly once");
        }
    }

    #[test]
    fn explicit_release_makes_drop_a_noop() {
        let log: OpLog = Rc::default();
        let mut binder = SurfaceBinder::new(
            MockWindowing::new(log.clone()),
            MockGpu::new(log.clone()),
            "cube",
            1280,
            720,
        )
        .expect("setup succeeds");
        binder.release();
        drop(binder);
        assert_eq!(count(&log, "destroy_context"), 1);
        assert_eq!(count(&log, "destroy_surface"), 1);
    }

    fn binder_with_events(
        log: &OpLog,
        events: Vec<WindowEvent>,
    ) -> SurfaceBinder<MockWindowing, MockGpu> {
        let mut windowing = MockWindowing::new(log.clone());
        windowing.queued_events = events;
        SurfaceBinder::new(windowing, MockGpu::new(log.clone()), "cube", 1280, 720)
            .expect("setup succeeds")
    }

    #[test]
    fn configure_resizes_the_drawable_but_not_the_context() {
        let log: OpLog = Rc::default();
        let mut binder = binder_with_events(
            &log,
            vec![WindowEvent::Configure {
                width: 640,
                height: 480,
            }],
        );
        let resized = binder.pump_frame_events().expect("pump succeeds");
        assert_eq!(resized, Some((640, 480)));
        assert_eq!(binder.size(), (640, 480));
        assert_eq!(count(&log, "resize_drawable:640x480"), 1);
        assert_eq!(count(&log, "create_context"), 1);
        assert_eq!(count(&log, "destroy_context"), 0);
    }

    #[test]
    fn zero_sized_configure_is_ignored() {
        let log: OpLog = Rc::default();
        let mut binder = binder_with_events(
            &log,
            vec![WindowEvent::Configure {
                width: 0,
                height: 480,
            }],
        );
        let resized = binder.pump_frame_events().expect("pump succeeds");
        assert_eq!(resized, None);
        assert_eq!(binder.size(), (1280, 720));
    }

    #[test]
    fn ping_is_acknowledged_with_the_received_serial() {
        let log: OpLog = Rc::default();
        let mut binder = binder_with_events(
            &log,
            vec![
                WindowEvent::Ping { serial: 7 },
                WindowEvent::PopupDismissed,
            ],
        );
        binder.pump_frame_events().expect("pump succeeds");
        assert_eq!(count(&log, "pong:7"), 1);
    }

    #[test]
    fn present_swaps_the_buffers() {
        let log: OpLog = Rc::default();
        let mut binder = binder_with_events(&log, Vec::new());
        binder.present().expect("present succeeds");
        assert_eq!(count(&log, "swap_buffers"), 1);
    }
}
