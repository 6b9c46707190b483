//! Native window host.
//!
//! Runs a background in a winit window: the engine paints into a
//! [`PixelCanvas`], and every executed frame is presented through the wgpu
//! [`Presenter`]. Frames are driven by `request_redraw`, which plays the part
//! of `requestAnimationFrame`.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::capability::DeviceClass;
use crate::config::EngineConfig;
use crate::engine::FrameStatus;
use crate::error::RunError;
use crate::gpu::Presenter;
use crate::host::{AmbientBackground, EngineMode, FrameHandle, Host, HostEvent, Scheduler, Subscription};
use crate::input::{pointer_event, PointerEvent};
use crate::raster::PixelCanvas;
use crate::theme::{Rgba, Theme};

/// Color behind the canvas, standing in for the page a web host would have.
fn backdrop(theme: Theme) -> Rgba {
    match theme {
        Theme::Light => Rgba::WHITE,
        Theme::Dark => Rgba::rgb(9, 9, 11),
    }
}

/// [`Host`] backed by a winit window.
pub struct WinitHost {
    window: Arc<Window>,
    next_id: u64,
    pending: Option<FrameHandle>,
    listeners: Vec<(Subscription, HostEvent)>,
}

impl WinitHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 0,
            pending: None,
            listeners: Vec::new(),
        }
    }

    pub fn is_listening(&self, event: HostEvent) -> bool {
        self.listeners.iter().any(|&(_, e)| e == event)
    }

    /// Claim the pending frame, if the redraw being handled was requested.
    pub fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Scheduler for WinitHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        // A redraw can't be withdrawn; it just finds nothing pending.
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

impl Host for WinitHost {
    fn listen(&mut self, event: HostEvent) -> Subscription {
        let subscription = Subscription(self.next());
        self.listeners.push((subscription, event));
        subscription
    }

    fn unlisten(&mut self, subscription: Subscription) {
        self.listeners.retain(|&(s, _)| s != subscription);
    }
}

type NativeBackground = AmbientBackground<WinitHost, PixelCanvas>;

struct App {
    theme: Theme,
    config: EngineConfig,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    background: Option<NativeBackground>,
    start: Instant,
    error: Option<RunError>,
}

impl App {
    fn new(theme: Theme, config: EngineConfig) -> Self {
        Self {
            theme,
            config,
            window: None,
            presenter: None,
            background: None,
            start: Instant::now(),
            error: None,
        }
    }

    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        tracing::error!(%error, "native host failed");
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let attrs = Window::default_attributes()
            .with_title("ambient-field")
            .with_inner_size(LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let presenter = pollster::block_on(Presenter::new(window.clone(), backdrop(self.theme)))?;

        let scale = window.scale_factor();
        let size: LogicalSize<f32> = window.inner_size().to_logical(scale);
        let device = DeviceClass::classify(size.width, self.config.mobile_max_width);

        let mut background = AmbientBackground::mount(
            WinitHost::new(window.clone()),
            Some(PixelCanvas::new(0, 0)),
            self.theme,
            self.config.clone(),
            device,
        );
        background.on_resize(size.width, size.height, scale as f32);
        window.request_redraw();

        self.window = Some(window);
        self.presenter = Some(presenter);
        self.background = Some(background);
        Ok(())
    }

    fn resized(&mut self, width: u32, height: u32) {
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(width, height);
        }
        let (Some(window), Some(background)) = (&self.window, &mut self.background) else {
            return;
        };

        let scale = window.scale_factor();
        let size: LogicalSize<f32> = window.inner_size().to_logical(scale);
        if background.host().is_listening(HostEvent::Resize) {
            background.on_resize(size.width, size.height, scale as f32);
        }
        if background.host().is_listening(HostEvent::CapabilityChange) {
            background.on_capability_change(DeviceClass::classify(
                size.width,
                self.config.mobile_max_width,
            ));
        }
        window.request_redraw();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.now_ms();
        let (Some(background), Some(presenter)) = (&mut self.background, &mut self.presenter) else {
            return;
        };

        let status = match background.host_mut().take_pending() {
            Some(_) => background.on_frame(now),
            None => None,
        };
        let fresh = matches!(status, Some(FrameStatus::Rendered { .. }))
            || background.mode() != EngineMode::Canvas;
        if !fresh {
            return;
        }

        if let Some(canvas) = background.canvas() {
            match presenter.present(canvas) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let (w, h) = (presenter.config.width, presenter.config.height);
                    presenter.resize(w, h);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                Err(e) => tracing::warn!(error = %e, "present failed"),
            }
        }

        if let (Some(window), Some(engine)) = (&self.window, background.engine()) {
            let stats = engine.stats();
            if stats.frame() % 60 == 0 && stats.fps() > 0.0 {
                window.set_title(&format!(
                    "ambient-field - {:.0} fps ({})",
                    stats.fps(),
                    stats.rating()
                ));
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(background) = self.background.take() {
            background.unmount();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(error) = self.init(event_loop) {
                self.fail(event_loop, error);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());

        if let Some(pointer) = pointer_event(&event, scale) {
            let now = self.now_ms();
            if let Some(background) = &mut self.background {
                match pointer {
                    PointerEvent::Moved(position)
                        if background.host().is_listening(HostEvent::PointerMove) =>
                    {
                        background.on_pointer_move(position, Vec2::ZERO, now);
                    }
                    PointerEvent::Left => background.on_pointer_leave(),
                    PointerEvent::Moved(_) => {}
                }
            }
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resized(size.width, size.height),
            WindowEvent::Occluded(occluded) => {
                if let Some(background) = &mut self.background {
                    if background.host().is_listening(HostEvent::Visibility) {
                        background.on_visibility(!occluded);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Open a window and run a background in it until the window is closed.
pub fn run(theme: Theme, config: EngineConfig) -> Result<(), RunError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(theme, config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
