//! Frame timing.
//!
//! Hosts hand the engine a millisecond timestamp on every frame callback
//! (`requestAnimationFrame` time on the web, a monotonic clock natively).
//! [`FrameClock`] decides whether a callback does any work; [`FrameStats`]
//! measures how many did.
//!
//! # Example
//!
//! ```ignore
//! use ambient_field::time::FrameClock;
//!
//! let mut clock = FrameClock::new(12.0);
//! assert!(clock.should_run(0.0));
//! assert!(!clock.should_run(8.3)); // 120 Hz display, frame skipped
//! assert!(clock.should_run(16.6));
//! ```

use std::fmt;

/// Frame-rate ceiling.
///
/// Callbacks arriving sooner than `min_interval_ms` after the last executed
/// frame are skipped. Scheduling stays with the host's frame callback; this
/// only filters.
#[derive(Debug, Clone)]
pub struct FrameClock {
    min_interval_ms: f64,
    last_run_ms: Option<f64>,
}

impl FrameClock {
    pub fn new(min_interval_ms: f64) -> Self {
        Self {
            min_interval_ms,
            last_run_ms: None,
        }
    }

    /// Whether the frame at `now_ms` should execute. Records it if so.
    pub fn should_run(&mut self, now_ms: f64) -> bool {
        if let Some(last) = self.last_run_ms {
            if now_ms - last < self.min_interval_ms {
                return false;
            }
        }
        self.last_run_ms = Some(now_ms);
        true
    }

    /// Timestamp of the last executed frame.
    #[inline]
    pub fn last_run(&self) -> Option<f64> {
        self.last_run_ms
    }

    /// Forget the last frame so the next callback always runs.
    pub fn reset(&mut self) {
        self.last_run_ms = None;
    }
}

/// Rough quality bucket for a frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FpsRating {
    Smooth,
    Good,
    Slow,
}

impl FpsRating {
    pub fn from_fps(fps: f32) -> Self {
        if fps >= 55.0 {
            FpsRating::Smooth
        } else if fps >= 30.0 {
            FpsRating::Good
        } else {
            FpsRating::Slow
        }
    }
}

impl fmt::Display for FpsRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FpsRating::Smooth => "smooth",
            FpsRating::Good => "good",
            FpsRating::Slow => "slow",
        })
    }
}

/// Executed-frame counter with an FPS figure refreshed once per window.
#[derive(Debug, Clone)]
pub struct FrameStats {
    /// Total executed frames.
    frame_count: u64,
    /// Calculated FPS (updated once per window).
    fps: f32,
    /// Frame count at last FPS update.
    window_frame_count: u64,
    /// Start of the current measurement window.
    window_start_ms: Option<f64>,
    window_ms: f64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::with_window(1000.0)
    }

    pub fn with_window(window_ms: f64) -> Self {
        Self {
            frame_count: 0,
            fps: 0.0,
            window_frame_count: 0,
            window_start_ms: None,
            window_ms,
        }
    }

    /// Count one executed frame. Returns the new FPS when the measurement
    /// window rolled over.
    pub fn record(&mut self, now_ms: f64) -> Option<f32> {
        self.frame_count += 1;

        let Some(start) = self.window_start_ms else {
            self.window_start_ms = Some(now_ms);
            self.window_frame_count = self.frame_count;
            return None;
        };
        let elapsed = now_ms - start;
        if elapsed < self.window_ms {
            return None;
        }

        let frames = self.frame_count - self.window_frame_count;
        self.fps = (frames as f64 * 1000.0 / elapsed) as f32;
        self.window_frame_count = self.frame_count;
        self.window_start_ms = Some(now_ms);
        Some(self.fps)
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn rating(&self) -> FpsRating {
        FpsRating::from_fps(self.fps)
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_always_runs() {
        let mut clock = FrameClock::new(12.0);
        assert!(clock.should_run(5.0));
        assert_eq!(clock.last_run(), Some(5.0));
    }

    #[test]
    fn test_ceiling_skips_fast_frames() {
        let mut clock = FrameClock::new(12.0);
        assert!(clock.should_run(0.0));
        assert!(!clock.should_run(6.9));
        assert!(!clock.should_run(11.9));
        assert!(clock.should_run(12.0));
        // Skipped frames don't move the reference point.
        assert!(!clock.should_run(20.0));
        assert!(clock.should_run(24.5));
    }

    #[test]
    fn test_reset_clock() {
        let mut clock = FrameClock::new(12.0);
        clock.should_run(0.0);
        clock.reset();
        assert!(clock.should_run(1.0));
    }

    #[test]
    fn test_stats_rollover() {
        let mut stats = FrameStats::new();
        let mut reported = None;
        for i in 0..=60 {
            if let Some(fps) = stats.record(i as f64 * 1000.0 / 60.0) {
                reported = Some(fps);
            }
        }
        let fps = reported.unwrap();
        assert!((fps - 60.0).abs() < 0.5, "fps was {fps}");
        assert_eq!(stats.frame(), 61);
        assert_eq!(stats.rating(), FpsRating::Smooth);
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(FpsRating::from_fps(55.0), FpsRating::Smooth);
        assert_eq!(FpsRating::from_fps(54.9), FpsRating::Good);
        assert_eq!(FpsRating::from_fps(30.0), FpsRating::Good);
        assert_eq!(FpsRating::from_fps(29.0), FpsRating::Slow);
    }
}
