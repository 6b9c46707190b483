//! Property-based invariants for the particle physics and the spatial grid.
//!
//! 1. Particles stay inside the viewport after every update.
//! 2. Opacity never decreases and settles at the target.
//! 3. The grid never misses an entry within one cell size of a query.
//! 4. Two particles are linked exactly when closer than the link distance.

use ambient_field::engine::find_links;
use ambient_field::particle::{Particle, ParticlePhysics};
use ambient_field::spatial::SpatialGrid;
use glam::Vec2;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn bounds_strategy() -> impl Strategy<Value = Vec2> {
    (50.0f32..2000.0, 50.0f32..1200.0).prop_map(|(w, h)| Vec2::new(w, h))
}

/// A particle somewhere inside `bounds`, with an arbitrary drift.
fn particle_in(bounds: Vec2) -> impl Strategy<Value = Particle> {
    (
        0.0f32..=1.0,
        0.0f32..=1.0,
        -5.0f32..5.0,
        -5.0f32..5.0,
        0.2f32..0.8,
    )
        .prop_map(move |(fx, fy, vx, vy, target)| Particle {
            index: 0,
            position: Vec2::new(fx * bounds.x, fy * bounds.y),
            velocity: Vec2::new(vx, vy),
            size: 1.0,
            alpha: 0.0,
            target_alpha: target,
        })
}

fn pointer_strategy() -> impl Strategy<Value = Vec2> {
    (-1200.0f32..2400.0, -1200.0f32..2400.0).prop_map(|(x, y)| Vec2::new(x, y))
}

fn bounded_particle() -> impl Strategy<Value = (Vec2, Particle, Vec2)> {
    bounds_strategy().prop_flat_map(|b| (Just(b), particle_in(b), pointer_strategy()))
}

fn points_strategy() -> impl Strategy<Value = Vec<Vec2>> {
    proptest::collection::vec(
        (-500.0f32..1500.0, -500.0f32..1500.0).prop_map(|(x, y)| Vec2::new(x, y)),
        0..120,
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Containment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn particles_stay_in_bounds(
        (bounds, mut particle, pointer) in bounded_particle(),
        frames in 1usize..200,
    ) {
        let physics = ParticlePhysics::default();
        for _ in 0..frames {
            particle.update(bounds, pointer, &physics);
            let p = particle.position;
            prop_assert!(p.x >= 0.0 && p.x <= bounds.x, "x {} outside 0..={}", p.x, bounds.x);
            prop_assert!(p.y >= 0.0 && p.y <= bounds.y, "y {} outside 0..={}", p.y, bounds.y);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Opacity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn alpha_is_monotonic_then_constant(
        (bounds, mut particle, pointer) in bounded_particle(),
    ) {
        let physics = ParticlePhysics::default();
        let target = particle.target_alpha;
        let mut previous = particle.alpha;

        for _ in 0..120 {
            particle.update(bounds, pointer, &physics);
            prop_assert!(particle.alpha >= previous);
            prop_assert!(particle.alpha <= target);
            previous = particle.alpha;
        }
        // 0.8 / 0.01 = 80 frames is the longest fade.
        prop_assert_eq!(particle.alpha, target);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Grid completeness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn grid_has_no_false_negatives(
        points in points_strategy(),
        query in (-500.0f32..1500.0, -500.0f32..1500.0),
    ) {
        let query = Vec2::new(query.0, query.1);
        let mut grid = SpatialGrid::new(150.0);
        grid.rebuild(points.iter().copied());

        let near: Vec<usize> = grid.nearby(query).collect();
        for (i, p) in points.iter().enumerate() {
            if p.distance(query) < 150.0 {
                prop_assert!(near.contains(&i), "missed {} at distance {}", i, p.distance(query));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Links
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pair_linked_iff_closer_than_link_distance(
        origin in (0.0f32..800.0, 0.0f32..800.0),
        distance in 0.0f32..300.0,
        angle in 0.0f32..std::f32::consts::TAU,
    ) {
        let a = Vec2::new(origin.0, origin.1);
        let b = a + Vec2::from_angle(angle) * distance;
        let particles: Vec<Particle> = [a, b]
            .iter()
            .enumerate()
            .map(|(i, &position)| Particle {
                index: i as u32,
                position,
                velocity: Vec2::ZERO,
                size: 1.0,
                alpha: 1.0,
                target_alpha: 1.0,
            })
            .collect();

        let mut grid = SpatialGrid::new(150.0);
        grid.rebuild(particles.iter().map(|p| p.position));
        let mut links = Vec::new();
        find_links(&particles, &grid, 150.0, 0.4, &mut links);

        let d = a.distance(b);
        if d < 150.0 {
            prop_assert_eq!(links.len(), 1);
            let expected = (1.0 - d / 150.0) * 0.4;
            prop_assert!((links[0].alpha - expected).abs() < 1e-5);
            prop_assert!(links[0].alpha >= 0.0);
        } else {
            prop_assert!(links.is_empty());
        }
    }
}
