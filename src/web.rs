//! Browser host (wasm32 only).
//!
//! [`WebBackground`] mounts a background behind a page section: the engine
//! paints through a `CanvasRenderingContext2d`, frames come from
//! `requestAnimationFrame`, the container is watched by a `ResizeObserver`,
//! and the mobile breakpoint by a `matchMedia` listener. Every listener is
//! removed again on [`WebBackground::unmount`].
//!
//! ```js
//! import init, { WebBackground } from "./ambient_field.js";
//! await init();
//! const bg = WebBackground.mount(section, section.querySelector("canvas"), "dark");
//! // later
//! bg.unmount();
//! ```

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use js_sys::Function;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlElement, MediaQueryList,
    MediaQueryListEvent, MouseEvent, ResizeObserver,
};

use crate::canvas::{Canvas2d, RadialGradient, Rect, Segment};
use crate::capability::{media_query, DeviceClass};
use crate::config::EngineConfig;
use crate::error::PaintError;
use crate::fallback::StaticFallback;
use crate::host::{AmbientBackground, FrameHandle, Host, HostEvent, Scheduler, Subscription};
use crate::theme::{Rgba, Theme};

fn backend(err: JsValue) -> PaintError {
    PaintError::Backend(format!("{err:?}"))
}

/// [`Canvas2d`] over a browser 2D context.
pub struct WebCanvas {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl WebCanvas {
    /// `None` if the element can't give a 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }

    fn disc(&self, center: Vec2, radius: f32) -> Result<(), JsValue> {
        self.ctx.begin_path();
        self.ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU)?;
        self.ctx.fill();
        Ok(())
    }
}

impl Canvas2d for WebCanvas {
    fn resize_backing(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn set_scale(&mut self, scale: f32) {
        let s = scale as f64;
        self.ctx.set_transform(s, 0.0, 0.0, s, 0.0, 0.0).ok();
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ctx.clear_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }

    fn stroke_path(&mut self, segments: &[Segment], color: Rgba, width: f32) {
        self.ctx.begin_path();
        for segment in segments {
            self.ctx.move_to(segment.from.x as f64, segment.from.y as f64);
            self.ctx.line_to(segment.to.x as f64, segment.to.y as f64);
        }
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.ctx.stroke();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.disc(center, radius).ok();
    }

    fn fill_radial_gradient(&mut self, gradient: &RadialGradient) -> Result<(), PaintError> {
        let (x, y, r) = (
            gradient.center.x as f64,
            gradient.center.y as f64,
            gradient.radius as f64,
        );
        let fill = self
            .ctx
            .create_radial_gradient(x, y, 0.0, x, y, r)
            .map_err(backend)?;
        for stop in &gradient.stops {
            fill.add_color_stop(stop.offset, &stop.color.to_css())
                .map_err(backend)?;
        }
        self.ctx.set_fill_style_canvas_gradient(&fill);
        self.disc(gradient.center, gradient.radius).map_err(backend)
    }
}

/// [`Host`] over the page's window, a container element and its canvas.
pub struct WebHost {
    window: web_sys::Window,
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    media: Option<MediaQueryList>,
    observer: Option<ResizeObserver>,
    fallback_root: Option<Element>,
    on_frame: Function,
    on_resize: Function,
    on_pointer: Function,
    on_media: Function,
    on_visibility: Function,
    next_id: u64,
    listeners: Vec<(Subscription, HostEvent)>,
}

impl WebHost {
    fn attach(&mut self, event: HostEvent) -> Result<(), JsValue> {
        match event {
            HostEvent::Resize => {
                let observer = ResizeObserver::new(&self.on_resize)?;
                observer.observe(&self.container);
                self.observer = Some(observer);
                self.window
                    .add_event_listener_with_callback("resize", &self.on_resize)
            }
            HostEvent::PointerMove => self
                .window
                .add_event_listener_with_callback("mousemove", &self.on_pointer),
            HostEvent::CapabilityChange => match &self.media {
                Some(media) => media.add_event_listener_with_callback("change", &self.on_media),
                None => Ok(()),
            },
            HostEvent::Visibility => match self.window.document() {
                Some(document) => document
                    .add_event_listener_with_callback("visibilitychange", &self.on_visibility),
                None => Ok(()),
            },
        }
    }

    fn detach(&mut self, event: HostEvent) -> Result<(), JsValue> {
        match event {
            HostEvent::Resize => {
                if let Some(observer) = self.observer.take() {
                    observer.disconnect();
                }
                self.window
                    .remove_event_listener_with_callback("resize", &self.on_resize)
            }
            HostEvent::PointerMove => self
                .window
                .remove_event_listener_with_callback("mousemove", &self.on_pointer),
            HostEvent::CapabilityChange => match &self.media {
                Some(media) => {
                    media.remove_event_listener_with_callback("change", &self.on_media)
                }
                None => Ok(()),
            },
            HostEvent::Visibility => match self.window.document() {
                Some(document) => document
                    .remove_event_listener_with_callback("visibilitychange", &self.on_visibility),
                None => Ok(()),
            },
        }
    }
}

impl Scheduler for WebHost {
    fn request_frame(&mut self) -> FrameHandle {
        match self.window.request_animation_frame(&self.on_frame) {
            Ok(id) => FrameHandle(id as u64),
            Err(err) => {
                tracing::warn!(?err, "requestAnimationFrame failed");
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.window.cancel_animation_frame(handle.0 as i32).ok();
    }
}

impl Host for WebHost {
    fn listen(&mut self, event: HostEvent) -> Subscription {
        if let Err(err) = self.attach(event) {
            tracing::warn!(?event, ?err, "failed to attach listener");
        }
        self.next_id += 1;
        let subscription = Subscription(self.next_id);
        self.listeners.push((subscription, event));
        subscription
    }

    fn unlisten(&mut self, subscription: Subscription) {
        let Some(pos) = self.listeners.iter().position(|&(s, _)| s == subscription) else {
            return;
        };
        let (_, event) = self.listeners.remove(pos);
        if let Err(err) = self.detach(event) {
            tracing::warn!(?event, ?err, "failed to detach listener");
        }
    }

    fn show_fallback(&mut self, fallback: &StaticFallback) -> bool {
        let Some(document) = self.window.document() else {
            return false;
        };
        let Ok(root) = document.create_element("div") else {
            return false;
        };
        root.set_inner_html(&fallback.to_html());
        if self.container.append_child(&root).is_err() {
            return false;
        }
        self.canvas.style().set_property("display", "none").ok();
        self.fallback_root = Some(root);
        true
    }

    fn hide_fallback(&mut self) {
        if let Some(root) = self.fallback_root.take() {
            root.remove();
        }
        self.canvas.style().remove_property("display").ok();
    }
}

type Slot = Rc<RefCell<Option<AmbientBackground<WebHost, WebCanvas>>>>;

/// Run `f` on the mounted background, unless it is gone or already borrowed.
fn with_background(slot: &Slot, f: impl FnOnce(&mut AmbientBackground<WebHost, WebCanvas>)) {
    if let Ok(mut guard) = slot.try_borrow_mut() {
        if let Some(bg) = guard.as_mut() {
            f(bg);
        }
    }
}

fn measure(window: &web_sys::Window, container: &HtmlElement) -> (f32, f32, f32) {
    let rect = container.get_bounding_client_rect();
    let dpr = window.device_pixel_ratio();
    (rect.width() as f32, rect.height() as f32, dpr as f32)
}

fn now_ms(window: &web_sys::Window) -> f64 {
    window.performance().map_or(0.0, |p| p.now())
}

/// Closures handed to the browser. Kept alive for the mount's lifetime.
struct Callbacks {
    _frame: Closure<dyn FnMut(f64)>,
    _resize: Closure<dyn FnMut()>,
    _pointer: Closure<dyn FnMut(MouseEvent)>,
    _media: Closure<dyn FnMut(MediaQueryListEvent)>,
    _visibility: Closure<dyn FnMut()>,
}

/// A background mounted into a page.
#[wasm_bindgen]
pub struct WebBackground {
    slot: Slot,
    _callbacks: Callbacks,
}

#[wasm_bindgen]
impl WebBackground {
    /// Mount with the default configuration.
    pub fn mount(
        container: HtmlElement,
        canvas: HtmlCanvasElement,
        theme: &str,
    ) -> Result<WebBackground, JsValue> {
        Self::mount_with_config(container, canvas, theme, "{}")
    }

    /// Mount with a JSON [`EngineConfig`] (missing fields take defaults).
    pub fn mount_with_config(
        container: HtmlElement,
        canvas: HtmlCanvasElement,
        theme: &str,
        config_json: &str,
    ) -> Result<WebBackground, JsValue> {
        let theme: Theme = theme
            .parse()
            .map_err(|e: crate::theme::UnknownTheme| JsValue::from_str(&e.to_string()))?;
        let config =
            EngineConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        let media = window
            .match_media(&media_query(config.mobile_max_width))
            .ok()
            .flatten();
        let device = DeviceClass::from_media_match(media.as_ref().is_some_and(|m| m.matches()));

        let slot: Slot = Rc::new(RefCell::new(None));

        let frame = {
            let slot = slot.clone();
            Closure::wrap(Box::new(move |now: f64| {
                with_background(&slot, |bg| {
                    bg.on_frame(now);
                });
            }) as Box<dyn FnMut(f64)>)
        };
        let resize = {
            let slot = slot.clone();
            let window = window.clone();
            let container = container.clone();
            Closure::wrap(Box::new(move || {
                let (w, h, dpr) = measure(&window, &container);
                with_background(&slot, |bg| bg.on_resize(w, h, dpr));
            }) as Box<dyn FnMut()>)
        };
        let pointer = {
            let slot = slot.clone();
            let window = window.clone();
            let canvas = canvas.clone();
            Closure::wrap(Box::new(move |event: MouseEvent| {
                let rect = canvas.get_bounding_client_rect();
                let client = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let origin = Vec2::new(rect.left() as f32, rect.top() as f32);
                let now = now_ms(&window);
                with_background(&slot, |bg| bg.on_pointer_move(client, origin, now));
            }) as Box<dyn FnMut(MouseEvent)>)
        };
        let media_change = {
            let slot = slot.clone();
            Closure::wrap(Box::new(move |event: MediaQueryListEvent| {
                let device = DeviceClass::from_media_match(event.matches());
                with_background(&slot, |bg| bg.on_capability_change(device));
            }) as Box<dyn FnMut(MediaQueryListEvent)>)
        };
        let visibility = {
            let slot = slot.clone();
            let window = window.clone();
            Closure::wrap(Box::new(move || {
                let hidden = window.document().is_some_and(|d| d.hidden());
                with_background(&slot, |bg| bg.on_visibility(!hidden));
            }) as Box<dyn FnMut()>)
        };

        let host = WebHost {
            window: window.clone(),
            container: container.clone(),
            canvas: canvas.clone(),
            media,
            observer: None,
            fallback_root: None,
            on_frame: frame.as_ref().unchecked_ref::<Function>().clone(),
            on_resize: resize.as_ref().unchecked_ref::<Function>().clone(),
            on_pointer: pointer.as_ref().unchecked_ref::<Function>().clone(),
            on_media: media_change.as_ref().unchecked_ref::<Function>().clone(),
            on_visibility: visibility.as_ref().unchecked_ref::<Function>().clone(),
            next_id: 0,
            listeners: Vec::new(),
        };

        let mut background =
            AmbientBackground::mount(host, WebCanvas::new(canvas), theme, config, device);
        let (w, h, dpr) = measure(&window, &container);
        background.on_resize(w, h, dpr);
        *slot.borrow_mut() = Some(background);

        Ok(WebBackground {
            slot,
            _callbacks: Callbacks {
                _frame: frame,
                _resize: resize,
                _pointer: pointer,
                _media: media_change,
                _visibility: visibility,
            },
        })
    }

    /// Switch palettes. Rebuilds the particle field from scratch.
    pub fn set_theme(&self, theme: &str) -> Result<(), JsValue> {
        let theme: Theme = theme
            .parse()
            .map_err(|e: crate::theme::UnknownTheme| JsValue::from_str(&e.to_string()))?;
        with_background(&self.slot, |bg| bg.set_theme(theme));
        Ok(())
    }

    /// Current mode: `"canvas"`, `"static"` or `"disabled"`.
    pub fn mode(&self) -> String {
        self.slot
            .try_borrow()
            .ok()
            .and_then(|bg| bg.as_ref().map(|bg| bg.mode().to_string()))
            .unwrap_or_else(|| "disabled".to_string())
    }

    /// Cancel the pending frame and remove every listener. The closures are
    /// dropped afterwards, so nothing can call back into the engine.
    pub fn unmount(self) {
        if let Some(background) = self.slot.borrow_mut().take() {
            background.unmount();
        }
    }
}
