//! Canvas sizing and population size.
//!
//! [`ViewportSizer`] turns a stream of noisy container measurements into the
//! occasional confirmed resize. Measurements within the threshold of the last
//! recorded size on both axes are ignored, which filters out reflow jitter
//! such as scrollbars toggling.

use glam::Vec2;

use crate::canvas::Canvas2d;
use crate::config::EngineConfig;

/// Confirmed viewport size in CSS pixels plus device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            dpr: 1.0,
        }
    }
}

impl ViewportState {
    /// Whether both dimensions are positive. Frames are skipped until then.
    pub fn is_known(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Backing-store size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.width * self.dpr).max(0.0).floor() as u32,
            (self.height * self.dpr).max(0.0).floor() as u32,
        )
    }

    /// Resize `canvas` to this state and re-apply the DPR transform so later
    /// drawing uses CSS-pixel coordinates.
    pub fn apply<C: Canvas2d + ?Sized>(&self, canvas: &mut C) {
        let (width, height) = self.backing_size();
        canvas.resize_backing(width, height);
        canvas.set_scale(self.dpr);
    }
}

/// Debounced viewport tracker.
#[derive(Clone, Debug)]
pub struct ViewportSizer {
    threshold: f32,
    state: ViewportState,
}

impl ViewportSizer {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            state: ViewportState::default(),
        }
    }

    /// Offer a measurement. Returns the new state if it was accepted.
    ///
    /// A measurement is skipped when both deltas from the last recorded size
    /// are under the threshold. A missing or invalid `dpr` counts as 1.
    pub fn observe(&mut self, width: f32, height: f32, dpr: f32) -> Option<ViewportState> {
        if !width.is_finite() || !height.is_finite() {
            return None;
        }

        let dw = (width - self.state.width).abs();
        let dh = (height - self.state.height).abs();
        if dw < self.threshold && dh < self.threshold {
            tracing::trace!(width, height, "resize below threshold, skipped");
            return None;
        }

        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.state = ViewportState { width, height, dpr };
        tracing::debug!(width, height, dpr, "viewport resized");
        Some(self.state)
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }
}

impl Default for ViewportSizer {
    fn default() -> Self {
        Self::new(20.0)
    }
}

/// Number of particles to seed for a viewport:
/// `min(floor(w * h / area_per_particle), cap)` with the cap chosen by width.
pub fn seed_count(width: f32, height: f32, config: &EngineConfig) -> usize {
    if width <= 0.0 || height <= 0.0 {
        return 0;
    }
    let by_area = (width * height / config.area_per_particle).floor() as usize;
    by_area.min(config.max_particles_for(width))
}
