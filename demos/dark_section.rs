//! # Dark Section
//!
//! The dark theme in a native window: violet particles and two faint
//! auroras over a near-black backdrop. Move the cursor through the field to
//! push particles away.
//!
//! Run with: `cargo run --example dark_section --release`

use ambient_field::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let config = EngineConfig::default().with_pause_when_hidden(true);
    ambient_field::window::run(Theme::Dark, config)
}
