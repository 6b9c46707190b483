//! Mounting a background into a host environment.
//!
//! The host (a browser page, a native window, a test harness) provides frame
//! scheduling and event subscriptions through [`Scheduler`] and [`Host`].
//! [`AmbientBackground`] is the lifecycle on top: it picks a mode from the
//! device class, subscribes to what that mode needs, drives the engine from
//! frame callbacks, and releases everything on unmount.
//!
//! ```ignore
//! let mut bg = AmbientBackground::mount(host, Some(canvas), Theme::Light, config, DeviceClass::Desktop);
//! bg.on_resize(1280.0, 720.0, 2.0);
//! // host delivers frames:
//! bg.on_frame(now_ms);
//! let host = bg.unmount();
//! ```

use std::fmt;

use glam::Vec2;

use crate::canvas::Canvas2d;
use crate::capability::{CapabilityPolicy, DeviceClass};
use crate::config::EngineConfig;
use crate::engine::{Engine, FrameStatus};
use crate::fallback::StaticFallback;
use crate::theme::Theme;

/// A pending frame request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// An active event subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(pub u64);

/// Frame scheduling, e.g. `requestAnimationFrame`.
pub trait Scheduler {
    /// Ask for one frame callback. The host later calls
    /// [`AmbientBackground::on_frame`] exactly once for it, unless cancelled.
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Events a background can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostEvent {
    Resize,
    PointerMove,
    CapabilityChange,
    Visibility,
}

/// A host environment.
pub trait Host: Scheduler {
    fn listen(&mut self, event: HostEvent) -> Subscription;
    fn unlisten(&mut self, subscription: Subscription);

    /// Render the fallback natively (e.g. as DOM markup). Returns `false` if
    /// the host can't, in which case it is painted onto the canvas instead.
    fn show_fallback(&mut self, _fallback: &StaticFallback) -> bool {
        false
    }

    fn hide_fallback(&mut self) {}
}

/// What a mounted background is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineMode {
    /// Animated canvas engine with a frame loop.
    Canvas,
    /// Static fallback, no frame loop.
    Static,
    /// No usable canvas. Nothing runs.
    Disabled,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineMode::Canvas => "canvas",
            EngineMode::Static => "static",
            EngineMode::Disabled => "disabled",
        })
    }
}

/// A background mounted into a host.
pub struct AmbientBackground<H: Host, C: Canvas2d> {
    host: H,
    canvas: Option<C>,
    theme: Theme,
    config: EngineConfig,
    device: DeviceClass,
    mode: EngineMode,
    engine: Option<Engine>,
    fallback: Option<StaticFallback>,
    /// The host renders the fallback itself; don't paint it.
    fallback_in_host: bool,
    pending_frame: Option<FrameHandle>,
    subscriptions: Vec<Subscription>,
    hidden: bool,
    /// Last measurement, replayed into a freshly built mode.
    viewport: Option<(f32, f32, f32)>,
}

impl<H: Host, C: Canvas2d> AmbientBackground<H, C> {
    /// Mount into `host`.
    ///
    /// Mobile devices get the static fallback and never start a loop. A
    /// desktop without a canvas is [`EngineMode::Disabled`].
    pub fn mount(
        host: H,
        canvas: Option<C>,
        theme: Theme,
        config: EngineConfig,
        device: DeviceClass,
    ) -> Self {
        let mut bg = Self {
            host,
            canvas,
            theme,
            config,
            device,
            mode: EngineMode::Disabled,
            engine: None,
            fallback: None,
            fallback_in_host: false,
            pending_frame: None,
            subscriptions: Vec::new(),
            hidden: false,
            viewport: None,
        };
        bg.enter(bg.select_mode());
        tracing::info!(mode = %bg.mode, theme = %bg.theme, "ambient background mounted");
        bg
    }

    fn select_mode(&self) -> EngineMode {
        if self.device.is_mobile() {
            EngineMode::Static
        } else if self.canvas.is_some() {
            EngineMode::Canvas
        } else {
            EngineMode::Disabled
        }
    }

    fn subscribe(&mut self, event: HostEvent) {
        let subscription = self.host.listen(event);
        self.subscriptions.push(subscription);
    }

    fn request_frame(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(self.host.request_frame());
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.host.cancel_frame(handle);
        }
    }

    fn enter(&mut self, mode: EngineMode) {
        self.mode = mode;
        let reactive = self.config.capability_policy == CapabilityPolicy::Reactive;

        match mode {
            EngineMode::Canvas => {
                let mut engine = Engine::new(self.theme, self.config.clone());
                if let (Some((w, h, dpr)), Some(canvas)) = (self.viewport, self.canvas.as_mut()) {
                    engine.resize(canvas, w, h, dpr);
                }
                self.engine = Some(engine);

                self.subscribe(HostEvent::Resize);
                self.subscribe(HostEvent::PointerMove);
                if self.config.pause_when_hidden {
                    self.subscribe(HostEvent::Visibility);
                }
                if reactive {
                    self.subscribe(HostEvent::CapabilityChange);
                }
                if !(self.hidden && self.config.pause_when_hidden) {
                    self.request_frame();
                }
            }
            EngineMode::Static => {
                let fallback = StaticFallback::for_theme(self.theme);
                self.fallback_in_host = self.host.show_fallback(&fallback);
                self.fallback = Some(fallback);
                self.paint_fallback();

                self.subscribe(HostEvent::Resize);
                if reactive {
                    self.subscribe(HostEvent::CapabilityChange);
                }
            }
            EngineMode::Disabled => {
                tracing::warn!("no canvas context available; ambient background disabled");
                // Crossing into the mobile breakpoint still reaches the static fallback.
                if reactive {
                    self.subscribe(HostEvent::CapabilityChange);
                }
            }
        }
    }

    /// Tear down the current mode: cancel the frame, drop every subscription.
    fn exit(&mut self) {
        self.cancel_frame();
        for subscription in self.subscriptions.drain(..) {
            self.host.unlisten(subscription);
        }
        self.engine = None;
        if self.fallback.take().is_some() && self.fallback_in_host {
            self.host.hide_fallback();
        }
        self.fallback_in_host = false;
    }

    fn paint_fallback(&mut self) {
        if self.fallback_in_host {
            return;
        }
        if let (Some(fallback), Some(canvas), Some((w, h, dpr))) =
            (&self.fallback, self.canvas.as_mut(), self.viewport)
        {
            fallback.paint(canvas, w, h, dpr);
        }
    }

    /// A requested frame fired at `now_ms`.
    ///
    /// Returns `None` if nothing was expecting a frame.
    pub fn on_frame(&mut self, now_ms: f64) -> Option<FrameStatus> {
        self.pending_frame.take()?;
        let (Some(engine), Some(canvas)) = (self.engine.as_mut(), self.canvas.as_mut()) else {
            return None;
        };
        let status = engine.frame(now_ms, canvas);
        self.request_frame();
        Some(status)
    }

    /// The container now measures `width x height` CSS px at `dpr`.
    pub fn on_resize(&mut self, width: f32, height: f32, dpr: f32) {
        self.viewport = Some((width, height, dpr));
        match self.mode {
            EngineMode::Canvas => {
                if let (Some(engine), Some(canvas)) = (self.engine.as_mut(), self.canvas.as_mut()) {
                    engine.resize(canvas, width, height, dpr);
                }
            }
            EngineMode::Static => self.paint_fallback(),
            EngineMode::Disabled => {}
        }
    }

    pub fn on_pointer_move(&mut self, client: Vec2, origin: Vec2, now_ms: f64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.pointer_moved(client, origin, now_ms);
        }
    }

    pub fn on_pointer_leave(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.pointer_left();
        }
    }

    /// The host's device classification changed.
    ///
    /// Under [`CapabilityPolicy::Reactive`] a new class tears the old mode
    /// down completely before the new one is built.
    pub fn on_capability_change(&mut self, device: DeviceClass) {
        if self.config.capability_policy == CapabilityPolicy::Once || device == self.device {
            return;
        }
        let from = self.mode;
        self.exit();
        self.device = device;
        self.enter(self.select_mode());
        tracing::info!(%from, to = %self.mode, ?device, "capability changed");
    }

    /// The surface became visible or hidden. Only acted on with
    /// `pause_when_hidden`.
    pub fn on_visibility(&mut self, visible: bool) {
        self.hidden = !visible;
        if !self.config.pause_when_hidden || self.mode != EngineMode::Canvas {
            return;
        }
        if visible {
            tracing::debug!("visible again, resuming frames");
            self.request_frame();
        } else {
            tracing::debug!("hidden, pausing frames");
            self.cancel_frame();
        }
    }

    /// Swap the theme. Rebuilds the current mode with fresh populations.
    pub fn set_theme(&mut self, theme: Theme) {
        if theme == self.theme {
            return;
        }
        self.exit();
        self.theme = theme;
        self.enter(self.select_mode());
        tracing::info!(%theme, mode = %self.mode, "theme changed");
    }

    /// Release the frame and every listener, and give the host back.
    pub fn unmount(mut self) -> H {
        let listeners = self.subscriptions.len();
        let frame_pending = self.pending_frame.is_some();
        self.exit();
        tracing::info!(listeners, frame_pending, "ambient background unmounted");
        self.host
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut Engine> {
        self.engine.as_mut()
    }

    pub fn canvas(&self) -> Option<&C> {
        self.canvas.as_ref()
    }

    pub fn fallback(&self) -> Option<&StaticFallback> {
        self.fallback.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_frame_pending(&self) -> bool {
        self.pending_frame.is_some()
    }
}

/// A deterministic [`Host`] for tests and headless runs.
///
/// Frames only fire when [`ManualHost::tick`] advances the clock, and every
/// request, cancel, listen and unlisten is counted.
#[derive(Debug, Default)]
pub struct ManualHost {
    next_id: u64,
    now_ms: f64,
    pending: Vec<FrameHandle>,
    listeners: Vec<(Subscription, HostEvent)>,
    renders_fallback: bool,
    fallback_visible: bool,
    pub frames_requested: usize,
    pub frames_cancelled: usize,
    pub frames_fired: usize,
    pub listens: usize,
    pub unlistens: usize,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend to be a host that renders the fallback as markup.
    pub fn rendering_fallback(mut self) -> Self {
        self.renders_fallback = true;
        self
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Advance the clock by `dt_ms` and fire the oldest pending frame, if
    /// any. Returns the frame's timestamp.
    pub fn tick(&mut self, dt_ms: f64) -> Option<f64> {
        self.now_ms += dt_ms;
        if self.pending.is_empty() {
            return None;
        }
        self.pending.remove(0);
        self.frames_fired += 1;
        Some(self.now_ms)
    }

    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    pub fn is_listening(&self, event: HostEvent) -> bool {
        self.listeners.iter().any(|&(_, e)| e == event)
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn fallback_visible(&self) -> bool {
        self.fallback_visible
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Scheduler for ManualHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.pending.push(handle);
        self.frames_requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|&h| h != handle);
        self.frames_cancelled += 1;
    }
}

impl Host for ManualHost {
    fn listen(&mut self, event: HostEvent) -> Subscription {
        let subscription = Subscription(self.next());
        self.listeners.push((subscription, event));
        self.listens += 1;
        subscription
    }

    fn unlisten(&mut self, subscription: Subscription) {
        self.listeners.retain(|&(s, _)| s != subscription);
        self.unlistens += 1;
    }

    fn show_fallback(&mut self, _fallback: &StaticFallback) -> bool {
        self.fallback_visible = self.renders_fallback;
        self.renders_fallback
    }

    fn hide_fallback(&mut self) {
        self.fallback_visible = false;
    }
}

impl<C: Canvas2d> AmbientBackground<ManualHost, C> {
    /// Advance the manual host's clock and deliver the frame it fires.
    pub fn tick(&mut self, dt_ms: f64) -> Option<FrameStatus> {
        let now = self.host.tick(dt_ms)?;
        self.on_frame(now)
    }
}
