//! Pointer sampling.
//!
//! The background only cares about one thing: where the pointer is, in
//! canvas-local CSS pixels. [`InputTracker`] throttles raw move events and
//! translates them out of client coordinates; the engine reads the latest
//! sample once per frame.

use glam::Vec2;

/// Where the pointer sits before the first move, and after it leaves.
/// Far enough off-canvas that nothing is repelled.
pub const POINTER_OFFSCREEN: Vec2 = Vec2::new(-1000.0, -1000.0);

/// Last accepted pointer position in canvas-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    pub position: Vec2,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            position: POINTER_OFFSCREEN,
        }
    }
}

/// Throttled pointer sampler.
#[derive(Debug, Clone)]
pub struct InputTracker {
    throttle_ms: f64,
    last_sample_ms: Option<f64>,
    pointer: PointerState,
}

impl InputTracker {
    pub fn new(throttle_ms: f64) -> Self {
        Self {
            throttle_ms,
            last_sample_ms: None,
            pointer: PointerState::default(),
        }
    }

    /// Offer a pointer move at `client` (page coordinates) over a canvas whose
    /// bounding rect starts at `origin`.
    ///
    /// Returns `true` if the sample was taken. Samples closer than the
    /// throttle interval to the previous accepted one are dropped.
    pub fn sample(&mut self, client: Vec2, origin: Vec2, now_ms: f64) -> bool {
        if let Some(last) = self.last_sample_ms {
            if now_ms - last < self.throttle_ms {
                return false;
            }
        }
        self.last_sample_ms = Some(now_ms);
        self.pointer.position = client - origin;
        true
    }

    /// Forget the pointer, e.g. when it leaves the window.
    pub fn reset(&mut self) {
        self.pointer = PointerState::default();
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn position(&self) -> Vec2 {
        self.pointer.position
    }
}

impl Default for InputTracker {
    fn default() -> Self {
        Self::new(16.0)
    }
}

/// Pointer-relevant subset of a native window event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// Moved to this logical position inside the window.
    Moved(Vec2),
    Left,
}

/// Extract a pointer event from a winit window event.
///
/// winit reports physical pixels; the result is divided by `scale_factor` so
/// it lines up with the engine's CSS-pixel coordinates.
#[cfg(not(target_arch = "wasm32"))]
pub fn pointer_event(event: &winit::event::WindowEvent, scale_factor: f64) -> Option<PointerEvent> {
    use winit::event::WindowEvent;

    match event {
        WindowEvent::CursorMoved { position, .. } => {
            let logical = position.to_logical::<f32>(scale_factor);
            Some(PointerEvent::Moved(Vec2::new(logical.x, logical.y)))
        }
        WindowEvent::CursorLeft { .. } => Some(PointerEvent::Left),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_offscreen() {
        let tracker = InputTracker::default();
        assert_eq!(tracker.position(), POINTER_OFFSCREEN);
    }

    #[test]
    fn test_translates_to_canvas_space() {
        let mut tracker = InputTracker::new(16.0);
        assert!(tracker.sample(Vec2::new(120.0, 80.0), Vec2::new(20.0, 30.0), 0.0));
        assert_eq!(tracker.position(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_throttle_drops_fast_samples() {
        let mut tracker = InputTracker::new(16.0);
        assert!(tracker.sample(Vec2::new(1.0, 1.0), Vec2::ZERO, 100.0));
        assert!(!tracker.sample(Vec2::new(2.0, 2.0), Vec2::ZERO, 110.0));
        assert_eq!(tracker.position(), Vec2::new(1.0, 1.0));

        assert!(tracker.sample(Vec2::new(3.0, 3.0), Vec2::ZERO, 116.0));
        assert_eq!(tracker.position(), Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_reset_moves_offscreen() {
        let mut tracker = InputTracker::new(0.0);
        tracker.sample(Vec2::new(5.0, 5.0), Vec2::ZERO, 0.0);
        tracker.reset();
        assert_eq!(tracker.pointer(), PointerState::default());
    }
}
