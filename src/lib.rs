//! # ambient-field
//!
//! Decorative animated backgrounds for page sections: drifting particles
//! joined by proximity links, slow aurora glows behind them, and a pointer
//! that pushes particles away.
//!
//! The engine draws through the [`Canvas2d`] trait and never touches a
//! platform directly. Hosts plug in underneath:
//!
//! - the browser ([`web`], wasm32) over a `CanvasRenderingContext2d`
//! - a native window ([`window`]) painting into a [`PixelCanvas`] presented
//!   with wgpu
//! - [`ManualHost`] + [`RecordingCanvas`] for tests and headless runs
//!
//! ## Quick Start
//!
//! ```ignore
//! use ambient_field::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     ambient_field::window::run(Theme::Dark, EngineConfig::default())
//! }
//! ```
//!
//! ## Headless
//!
//! ```
//! use ambient_field::prelude::*;
//!
//! let mut bg = AmbientBackground::mount(
//!     ManualHost::new(),
//!     Some(RecordingCanvas::new()),
//!     Theme::Light,
//!     EngineConfig::default().with_seed(7),
//!     DeviceClass::Desktop,
//! );
//! bg.on_resize(1000.0, 600.0, 1.0);
//! assert!(bg.tick(16.0).is_some_and(|s| s.rendered()));
//! assert_eq!(bg.engine().map(|e| e.particles().len()), Some(50));
//! ```
//!
//! ## Modes
//!
//! On mount the device class picks a mode. Desktops run the animated canvas
//! engine ([`EngineMode::Canvas`]); mobile devices get a computation-free
//! [`StaticFallback`] ([`EngineMode::Static`]); a desktop without a canvas
//! context does nothing ([`EngineMode::Disabled`]).

pub mod aurora;
pub mod canvas;
pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod host;
pub mod input;
pub mod particle;
pub mod raster;
pub mod spatial;
pub mod theme;
pub mod time;
pub mod viewport;

#[cfg(not(target_arch = "wasm32"))]
pub mod gpu;
#[cfg(not(target_arch = "wasm32"))]
pub mod window;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use aurora::Aurora;
pub use canvas::{Canvas2d, DrawCall, RadialGradient, RecordingCanvas, Rect, Segment};
pub use capability::{CapabilityPolicy, DeviceClass};
pub use config::EngineConfig;
pub use engine::{Engine, FrameStatus, Link};
pub use error::{ConfigError, PaintError, SnapshotError};
pub use fallback::StaticFallback;
pub use glam::Vec2;
pub use host::{AmbientBackground, EngineMode, Host, HostEvent, ManualHost, Scheduler};
pub use particle::Particle;
pub use raster::PixelCanvas;
pub use spatial::SpatialGrid;
pub use theme::{Rgba, Theme, ThemeProfile};

#[cfg(not(target_arch = "wasm32"))]
pub use error::{GpuError, RunError};

/// Convenient re-exports.
///
/// ```ignore
/// use ambient_field::prelude::*;
/// ```
pub mod prelude {
    pub use crate::canvas::{Canvas2d, RecordingCanvas};
    pub use crate::capability::{CapabilityPolicy, DeviceClass};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{Engine, FrameStatus};
    pub use crate::host::{AmbientBackground, EngineMode, Host, ManualHost};
    pub use crate::raster::PixelCanvas;
    pub use crate::theme::{Rgba, Theme};
    pub use glam::Vec2;

    #[cfg(not(target_arch = "wasm32"))]
    pub use crate::error::RunError;
}
