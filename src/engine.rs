//! The per-instance animation state and the frame algorithm.
//!
//! An [`Engine`] owns everything one mounted background needs: viewport,
//! pointer, particles, auroras and the spatial grid. Hosts feed it resize and
//! pointer events and call [`Engine::frame`] from their frame callback with a
//! canvas to paint into.
//!
//! A frame is split into a physics [`step`](Engine::step) and a
//! [`paint`](Engine::paint); the step never touches a canvas, so it can be
//! benchmarked and property-tested on its own.
//!
//! ```ignore
//! let mut engine = Engine::new(Theme::Dark, EngineConfig::default().with_seed(1));
//! let mut canvas = RecordingCanvas::new();
//! engine.resize(&mut canvas, 1280.0, 720.0, 1.0);
//! engine.frame(0.0, &mut canvas);
//! ```

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::aurora::Aurora;
use crate::canvas::{Canvas2d, Rect, Segment};
use crate::config::EngineConfig;
use crate::input::InputTracker;
use crate::particle::{Particle, ParticlePhysics};
use crate::spatial::SpatialGrid;
use crate::theme::{Theme, ThemeProfile};
use crate::time::{FrameClock, FrameStats};
use crate::viewport::{seed_count, ViewportSizer, ViewportState};

/// A connection line between two particles, by slice position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
    /// Opacity multiplier, `(1 - distance / link_distance) * link_alpha`.
    pub alpha: f32,
}

/// What a frame callback ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Arrived before the frame-rate ceiling allowed another frame.
    Throttled,
    /// No confirmed viewport yet.
    AwaitingViewport,
    Rendered { links: usize },
}

impl FrameStatus {
    pub fn rendered(self) -> bool {
        matches!(self, FrameStatus::Rendered { .. })
    }
}

/// One mounted background's complete state.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    profile: ThemeProfile,
    physics: ParticlePhysics,
    sizer: ViewportSizer,
    input: InputTracker,
    clock: FrameClock,
    stats: FrameStats,
    particles: Vec<Particle>,
    auroras: Vec<Aurora>,
    grid: SpatialGrid,
    links: Vec<Link>,
    rng: StdRng,
}

impl Engine {
    pub fn new(theme: Theme, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            profile: theme.profile(),
            physics: ParticlePhysics::from(&config),
            sizer: ViewportSizer::new(config.resize_threshold),
            input: InputTracker::new(config.pointer_throttle_ms),
            clock: FrameClock::new(config.min_frame_interval_ms),
            stats: FrameStats::new(),
            particles: Vec::new(),
            auroras: Vec::new(),
            grid: SpatialGrid::new(config.cell_size),
            links: Vec::new(),
            rng,
            config,
        }
    }

    pub fn theme(&self) -> Theme {
        self.profile.theme
    }

    pub fn profile(&self) -> &ThemeProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> ViewportState {
        self.sizer.state()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn auroras(&self) -> &[Aurora] {
        &self.auroras
    }

    /// Links found by the last step.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn pointer(&self) -> Vec2 {
        self.input.position()
    }

    /// Offer a container measurement.
    ///
    /// An accepted resize reallocates the canvas backing store and re-applies
    /// the DPR transform. Particles are seeded by the first accepted viewport
    /// with positive area that yields any; auroras by the first one with
    /// positive area. Populations are never re-seeded once present.
    pub fn resize<C: Canvas2d + ?Sized>(
        &mut self,
        canvas: &mut C,
        width: f32,
        height: f32,
        dpr: f32,
    ) -> bool {
        let Some(state) = self.sizer.observe(width, height, dpr) else {
            return false;
        };
        state.apply(canvas);
        if state.is_known() {
            self.seed(state.width, state.height);
        }
        true
    }

    fn seed(&mut self, width: f32, height: f32) {
        let mut seeded = false;

        if self.particles.is_empty() {
            let count = seed_count(width, height, &self.config);
            self.particles = (0..count)
                .map(|i| Particle::spawn(i as u32, width, height, &mut self.rng))
                .collect();
            seeded |= count > 0;
        }
        if self.auroras.is_empty() {
            self.auroras = self
                .profile
                .auroras
                .iter()
                .map(|&color| Aurora::spawn(width, height, color, &mut self.rng))
                .collect();
            seeded |= !self.auroras.is_empty();
        }

        if seeded {
            tracing::info!(
                particles = self.particles.len(),
                auroras = self.auroras.len(),
                width,
                height,
                "seeded populations"
            );
        }
    }

    /// Offer a pointer move in client coordinates over a canvas at `origin`.
    pub fn pointer_moved(&mut self, client: Vec2, origin: Vec2, now_ms: f64) -> bool {
        self.input.sample(client, origin, now_ms)
    }

    pub fn pointer_left(&mut self) {
        self.input.reset();
    }

    /// Run one frame callback.
    pub fn frame<C: Canvas2d + ?Sized>(&mut self, now_ms: f64, canvas: &mut C) -> FrameStatus {
        if !self.clock.should_run(now_ms) {
            return FrameStatus::Throttled;
        }
        if !self.sizer.state().is_known() {
            return FrameStatus::AwaitingViewport;
        }

        self.step();
        self.paint(canvas);

        if let Some(fps) = self.stats.record(now_ms) {
            tracing::debug!(fps, rating = %self.stats.rating(), "frame rate");
        }
        FrameStatus::Rendered {
            links: self.links.len(),
        }
    }

    /// Advance the simulation one frame without painting.
    ///
    /// Auroras drift, particles update against the current pointer, the grid
    /// is rebuilt from the updated positions, and links are recomputed.
    pub fn step(&mut self) {
        let state = self.sizer.state();
        if !state.is_known() {
            return;
        }
        let bounds = state.size();
        let pointer = self.input.position();

        for aurora in &mut self.auroras {
            aurora.update(bounds, self.config.aurora_padding);
        }
        for particle in &mut self.particles {
            particle.update(bounds, pointer, &self.physics);
        }

        self.grid.rebuild(self.particles.iter().map(|p| p.position));
        find_links(
            &self.particles,
            &self.grid,
            self.config.link_distance,
            self.config.link_alpha,
            &mut self.links,
        );
    }

    /// Paint the current state: background, reference grid, auroras,
    /// particles, then links.
    pub fn paint<C: Canvas2d + ?Sized>(&mut self, canvas: &mut C) {
        let state = self.sizer.state();
        let full = Rect::sized(state.width, state.height);

        match self.profile.background {
            Some(color) => canvas.fill_rect(full, color),
            None => canvas.clear_rect(full),
        }

        let lines = reference_grid(state.width, state.height, self.config.grid_pitch);
        canvas.stroke_path(&lines, self.profile.grid, 1.0);

        for aurora in &mut self.auroras {
            aurora.draw(canvas, self.profile.aurora_edge);
        }

        for particle in &self.particles {
            particle.draw(canvas, &self.profile);
        }

        for link in &self.links {
            let a = self.particles[link.a].position;
            let b = self.particles[link.b].position;
            canvas.stroke_line(
                a,
                b,
                self.profile.link.scale_alpha(link.alpha),
                self.config.link_width,
            );
        }
    }
}

/// Collect every particle pair closer than `link_distance` into `out`.
///
/// Each pair is reported once, from the particle with the lower
/// [`Particle::index`]. `grid` must hold the particles' current positions
/// under their slice positions.
pub fn find_links(
    particles: &[Particle],
    grid: &SpatialGrid,
    link_distance: f32,
    link_alpha: f32,
    out: &mut Vec<Link>,
) {
    out.clear();
    let max_sq = link_distance * link_distance;

    for (a, p1) in particles.iter().enumerate() {
        for b in grid.nearby(p1.position) {
            let Some(p2) = particles.get(b) else {
                continue;
            };
            if p2.index <= p1.index {
                continue;
            }
            let dist_sq = p1.position.distance_squared(p2.position);
            if dist_sq < max_sq {
                let distance = dist_sq.sqrt();
                out.push(Link {
                    a,
                    b,
                    distance,
                    alpha: (1.0 - distance / link_distance) * link_alpha,
                });
            }
        }
    }
}

/// Vertical then horizontal lines every `pitch` px, from 0 through the edge.
pub fn reference_grid(width: f32, height: f32, pitch: f32) -> Vec<Segment> {
    if pitch <= 0.0 || !width.is_finite() || !height.is_finite() {
        return Vec::new();
    }
    let columns = (width / pitch).floor() as usize + 1;
    let rows = (height / pitch).floor() as usize + 1;

    let vertical = (0..columns).map(|i| {
        let x = i as f32 * pitch;
        Segment::new(Vec2::new(x, 0.0), Vec2::new(x, height))
    });
    let horizontal = (0..rows).map(|i| {
        let y = i as f32 * pitch;
        Segment::new(Vec2::new(0.0, y), Vec2::new(width, y))
    });
    vertical.chain(horizontal).collect()
}
