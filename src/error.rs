//! Error types for ambient-field.
//!
//! The background is decoration, so almost nothing here ever reaches a user:
//! paint errors are swallowed per frame, and only setup failures (bad config,
//! no window, no GPU) propagate out of the native window host.

use thiserror::Error;

/// Errors from loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range, or values contradict each other.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Errors raised by a [`Canvas2d`](crate::Canvas2d) paint call.
///
/// The render loop never propagates these; the affected element is skipped
/// for the current frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaintError {
    /// Coordinates or radii were NaN or infinite.
    #[error("non-finite geometry")]
    NonFiniteGeometry,
    /// The drawing backend rejected the call.
    #[error("canvas backend error: {0}")]
    Backend(String),
}

/// Errors from exporting a rasterized frame.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame buffer is empty")]
    Empty,
}

/// Errors that can occur during GPU initialization.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system supports Vulkan, Metal, DX12 or GL")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur when running the native window host.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
