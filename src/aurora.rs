//! Large soft glows drifting behind the particles.

use glam::Vec2;
use rand::Rng;

use crate::canvas::{Canvas2d, RadialGradient};
use crate::error::PaintError;
use crate::theme::Rgba;

/// A drifting radial glow.
///
/// The gradient is built lazily on the first draw after a move and reused
/// until the next [`Aurora::update`], so it is never painted stale.
#[derive(Clone, Debug, PartialEq)]
pub struct Aurora {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Fixed at spawn, `200..500`.
    pub radius: f32,
    pub color: Rgba,
    gradient: Option<RadialGradient>,
}

impl Aurora {
    pub fn spawn<R: Rng + ?Sized>(width: f32, height: f32, color: Rgba, rng: &mut R) -> Self {
        Self {
            position: Vec2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height),
            velocity: Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * 0.2,
            radius: rng.gen::<f32>() * 300.0 + 200.0,
            color,
            gradient: None,
        }
    }

    /// Build an aurora at a known spot. Mostly for tests and demos.
    pub fn new(position: Vec2, velocity: Vec2, radius: f32, color: Rgba) -> Self {
        Self {
            position,
            velocity,
            radius,
            color,
            gradient: None,
        }
    }

    /// Drift one frame, bouncing once the center is more than `padding`
    /// outside the viewport. Invalidates the cached gradient.
    pub fn update(&mut self, bounds: Vec2, padding: f32) {
        self.position += self.velocity;

        // Point the velocity back inward instead of flipping it, so an aurora
        // stranded outside by a shrinking viewport cannot oscillate there.
        if self.position.x < -padding {
            self.velocity.x = self.velocity.x.abs();
        } else if self.position.x > bounds.x + padding {
            self.velocity.x = -self.velocity.x.abs();
        }
        if self.position.y < -padding {
            self.velocity.y = self.velocity.y.abs();
        } else if self.position.y > bounds.y + padding {
            self.velocity.y = -self.velocity.y.abs();
        }

        self.gradient = None;
    }

    /// The gradient for the current position, building it if needed.
    pub fn gradient(&mut self, edge: Rgba) -> Result<&RadialGradient, PaintError> {
        let gradient = match self.gradient {
            Some(g) => g,
            None => RadialGradient::new(self.position, self.radius, self.color, edge)?,
        };
        Ok(self.gradient.insert(gradient))
    }

    pub fn has_cached_gradient(&self) -> bool {
        self.gradient.is_some()
    }

    /// Paint the glow. Errors skip this aurora for the frame and are logged
    /// at trace level; they never reach the caller.
    pub fn draw<C: Canvas2d + ?Sized>(&mut self, canvas: &mut C, edge: Rgba) {
        let result = self
            .gradient(edge)
            .and_then(|gradient| canvas.fill_radial_gradient(gradient));
        if let Err(err) = result {
            tracing::trace!(%err, position = ?self.position, "aurora paint skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EDGE: Rgba = Rgba::rgba(255, 255, 255, 0.0);

    #[test]
    fn test_spawn_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let a = Aurora::spawn(1000.0, 600.0, Rgba::WHITE, &mut rng);
            assert!((200.0..500.0).contains(&a.radius));
            assert!(a.velocity.x.abs() <= 0.1 && a.velocity.y.abs() <= 0.1);
            assert!(!a.has_cached_gradient());
        }
    }

    #[test]
    fn test_update_invalidates_gradient() {
        let mut a = Aurora::new(Vec2::new(10.0, 10.0), Vec2::new(0.1, 0.0), 300.0, Rgba::WHITE);
        let before = a.gradient(EDGE).unwrap().center;
        assert!(a.has_cached_gradient());

        a.update(Vec2::new(100.0, 100.0), 200.0);
        assert!(!a.has_cached_gradient());

        let after = a.gradient(EDGE).unwrap().center;
        assert_eq!(after, a.position);
        assert_ne!(before, after);
    }

    #[test]
    fn test_bounce_past_padding() {
        let mut a = Aurora::new(Vec2::new(-199.95, 50.0), Vec2::new(-0.1, 0.0), 300.0, Rgba::WHITE);
        a.update(Vec2::new(100.0, 100.0), 200.0);
        assert!(a.velocity.x > 0.0);

        // Still outside after the bounce: velocity keeps pointing inward.
        a.update(Vec2::new(100.0, 100.0), 200.0);
        assert!(a.velocity.x > 0.0);
    }

    #[test]
    fn test_non_finite_draw_is_swallowed() {
        let mut a = Aurora::new(Vec2::new(f32::NAN, 0.0), Vec2::ZERO, 300.0, Rgba::WHITE);
        let mut canvas = RecordingCanvas::new();
        a.draw(&mut canvas, EDGE);
        assert_eq!(canvas.paint_count(), 0);
    }

    #[test]
    fn test_backend_failure_is_swallowed() {
        let mut a = Aurora::new(Vec2::new(50.0, 50.0), Vec2::ZERO, 300.0, Rgba::WHITE);
        let mut canvas = RecordingCanvas::new().reject_gradients(true);
        a.draw(&mut canvas, EDGE);
        assert_eq!(canvas.paint_count(), 0);
    }

    #[test]
    fn test_draw_paints_current_position() {
        let mut a = Aurora::new(Vec2::new(50.0, 60.0), Vec2::new(0.05, 0.0), 250.0, Rgba::WHITE);
        let mut canvas = RecordingCanvas::new();
        a.update(Vec2::new(100.0, 100.0), 200.0);
        a.draw(&mut canvas, EDGE);

        let g = canvas.gradients().next().copied().unwrap();
        assert_eq!(g.center, a.position);
        assert_eq!(g.radius, 250.0);
    }
}
