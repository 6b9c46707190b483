//! Drifting particles.
//!
//! A particle is plain data plus a pure [`Particle::update`]; painting is a
//! separate [`Particle::draw`] call so the physics can be tested without any
//! canvas at all.

use glam::Vec2;
use rand::Rng;

use crate::canvas::Canvas2d;
use crate::config::EngineConfig;
use crate::theme::ThemeProfile;

/// Per-frame physics constants for particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticlePhysics {
    /// Opacity gained per frame while fading in.
    pub fade_step: f32,
    /// Pointer repulsion radius.
    pub pointer_radius: f32,
    /// Displacement at zero distance from the pointer.
    pub pointer_force: f32,
}

impl Default for ParticlePhysics {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ParticlePhysics {
    fn from(config: &EngineConfig) -> Self {
        Self {
            fade_step: config.fade_step,
            pointer_radius: config.pointer_radius,
            pointer_force: config.pointer_force,
        }
    }
}

/// A single animated dot.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Seeding order, stable for the engine's lifetime. Links are deduped on it.
    pub index: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radius, fixed at spawn.
    pub size: f32,
    /// Current opacity, `0..=target_alpha`.
    pub alpha: f32,
    /// Opacity reached at the end of the fade-in.
    pub target_alpha: f32,
}

impl Particle {
    /// Spawn at a random point of the `width x height` viewport.
    ///
    /// Velocity components are in `-0.25..0.25` px/frame, size in
    /// `0.5..2.5`, and the target opacity in `0.2..0.8`. Opacity starts at 0.
    pub fn spawn<R: Rng + ?Sized>(index: u32, width: f32, height: f32, rng: &mut R) -> Self {
        Self {
            index,
            position: Vec2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height),
            velocity: Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * 0.5,
            size: rng.gen::<f32>() * 2.0 + 0.5,
            alpha: 0.0,
            target_alpha: rng.gen::<f32>() * 0.6 + 0.2,
        }
    }

    /// Advance one frame inside a `bounds.x x bounds.y` viewport.
    ///
    /// Fades in, integrates velocity, bounces off the edges, then gets pushed
    /// away from `pointer`. The position is inside the viewport afterwards.
    pub fn update(&mut self, bounds: Vec2, pointer: Vec2, physics: &ParticlePhysics) {
        if self.alpha < self.target_alpha {
            self.alpha = (self.alpha + physics.fade_step).min(self.target_alpha);
        }

        self.position += self.velocity;

        if self.position.x < 0.0 {
            self.position.x = 0.0;
            self.velocity.x = -self.velocity.x;
        }
        if self.position.x > bounds.x {
            self.position.x = bounds.x;
            self.velocity.x = -self.velocity.x;
        }
        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity.y = -self.velocity.y;
        }
        if self.position.y > bounds.y {
            self.position.y = bounds.y;
            self.velocity.y = -self.velocity.y;
        }

        // Repulsion can push past an edge; clamp without touching velocity.
        let push = pointer_force(self.position, pointer, physics);
        self.position = (self.position - push).clamp(Vec2::ZERO, bounds.max(Vec2::ZERO));
    }

    pub fn draw<C: Canvas2d + ?Sized>(&self, canvas: &mut C, theme: &ThemeProfile) {
        canvas.fill_circle(self.position, self.size, theme.particle.with_alpha(self.alpha));
    }
}

/// Force the pointer exerts on a particle at `position`.
///
/// The vector points from the particle toward the pointer with magnitude
/// `(R - d) / R * pointer_force`; the particle is displaced by its negation.
/// Zero outside the radius and exactly at the pointer.
pub fn pointer_force(position: Vec2, pointer: Vec2, physics: &ParticlePhysics) -> Vec2 {
    let delta = pointer - position;
    let dist_sq = delta.length_squared();
    let radius = physics.pointer_radius;

    if dist_sq >= radius * radius || dist_sq <= 0.0 {
        return Vec2::ZERO;
    }

    let dist = dist_sq.sqrt();
    let strength = (radius - dist) / radius;
    delta / dist * strength * physics.pointer_force
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FAR: Vec2 = Vec2::new(-1000.0, -1000.0);

    fn still(position: Vec2) -> Particle {
        Particle {
            index: 0,
            position,
            velocity: Vec2::ZERO,
            size: 1.0,
            alpha: 0.0,
            target_alpha: 0.5,
        }
    }

    #[test]
    fn test_spawn_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        for i in 0..500 {
            let p = Particle::spawn(i, 800.0, 600.0, &mut rng);
            assert_eq!(p.index, i);
            assert!((0.0..800.0).contains(&p.position.x));
            assert!((0.0..600.0).contains(&p.position.y));
            assert!(p.velocity.x.abs() <= 0.25 && p.velocity.y.abs() <= 0.25);
            assert!((0.5..2.5).contains(&p.size));
            assert!((0.2..0.8).contains(&p.target_alpha));
            assert_eq!(p.alpha, 0.0);
        }
    }

    #[test]
    fn test_fade_in_never_overshoots() {
        let physics = ParticlePhysics::default();
        let mut p = still(Vec2::new(50.0, 50.0));
        p.target_alpha = 0.205;

        let mut last = p.alpha;
        for _ in 0..40 {
            p.update(Vec2::new(100.0, 100.0), FAR, &physics);
            assert!(p.alpha >= last);
            assert!(p.alpha <= p.target_alpha);
            last = p.alpha;
        }
        assert_eq!(p.alpha, p.target_alpha);
    }

    #[test]
    fn test_bounce_reflects_velocity() {
        let physics = ParticlePhysics::default();
        let mut p = still(Vec2::new(99.9, 0.1));
        p.velocity = Vec2::new(0.25, -0.25);

        p.update(Vec2::new(100.0, 100.0), FAR, &physics);
        assert_eq!(p.position, Vec2::new(100.0, 0.0));
        assert_eq!(p.velocity, Vec2::new(-0.25, 0.25));
    }

    #[test]
    fn test_pointer_force_direction_and_magnitude() {
        let physics = ParticlePhysics::default();
        let position = Vec2::new(300.0, 200.0);
        let force = pointer_force(position, position - Vec2::new(10.0, 0.0), &physics);

        let expected = (150.0 - 10.0) / 150.0 * 1.5;
        assert!((force.x + expected).abs() < 1e-5);
        assert_eq!(force.y, 0.0);
    }

    #[test]
    fn test_pointer_force_zero_outside_and_at_pointer() {
        let physics = ParticlePhysics::default();
        let p = Vec2::new(10.0, 10.0);
        assert_eq!(pointer_force(p, p, &physics), Vec2::ZERO);
        assert_eq!(pointer_force(p, p + Vec2::new(150.0, 0.0), &physics), Vec2::ZERO);
        assert_eq!(pointer_force(p, FAR, &physics), Vec2::ZERO);
    }

    #[test]
    fn test_repulsion_pushes_away() {
        let physics = ParticlePhysics::default();
        let mut p = still(Vec2::new(300.0, 200.0));
        p.update(Vec2::new(600.0, 400.0), Vec2::new(290.0, 200.0), &physics);

        let expected = (150.0 - 10.0) / 150.0 * 1.5;
        assert!((p.position.x - (300.0 + expected)).abs() < 1e-4);
        assert_eq!(p.position.y, 200.0);
    }

    #[test]
    fn test_repulsion_clamped_at_edge() {
        let physics = ParticlePhysics::default();
        let mut p = still(Vec2::new(1.0, 50.0));
        // Pointer just inside, to the right: pushes the particle out past x = 0.
        p.update(Vec2::new(100.0, 100.0), Vec2::new(2.0, 50.0), &physics);
        assert_eq!(p.position.x, 0.0);
    }
}
