//! # Snapshot
//!
//! Runs the light theme headless on the CPU rasterizer and writes a few
//! frames as PNGs, with the pointer sweeping across the field.
//!
//! Run with: `cargo run --example snapshot -- [out_dir]`

use std::path::PathBuf;

use ambient_field::prelude::*;

fn main() {
    let out: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut bg = AmbientBackground::mount(
        ManualHost::new(),
        Some(PixelCanvas::new(0, 0)),
        Theme::Light,
        EngineConfig::default().with_seed(2024),
        DeviceClass::Desktop,
    );
    bg.on_resize(1280.0, 720.0, 1.0);

    println!("=== ambient-field snapshot ===");
    if let Some(engine) = bg.engine() {
        println!("Particles: {}", engine.particles().len());
        println!("Auroras:   {}", engine.auroras().len());
    }

    for frame in 0..240u32 {
        let x = frame as f32 / 240.0 * 1280.0;
        bg.on_pointer_move(Vec2::new(x, 360.0), Vec2::ZERO, bg.host().now());

        let Some(FrameStatus::Rendered { links }) = bg.tick(16.7) else {
            continue;
        };
        if frame % 60 != 59 {
            continue;
        }

        let path = out.join(format!("ambient-{frame:03}.png"));
        let Some(canvas) = bg.canvas() else {
            break;
        };
        match canvas.save_png(&path) {
            Ok(()) => println!("frame {frame:>3}: {links:>3} links -> {}", path.display()),
            Err(e) => {
                eprintln!("failed to write {}: {e}", path.display());
                std::process::exit(1);
            }
        }
    }

    bg.unmount();
}
