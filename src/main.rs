//! Run an ambient background in a native window.
//!
//! ```text
//! ambient-field [--theme light|dark] [--config path.json]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use ambient_field::{EngineConfig, Theme};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut theme = Theme::Light;
    let mut config = EngineConfig::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--theme" => match args.next().map(|s| s.parse::<Theme>()) {
                Some(Ok(t)) => theme = t,
                Some(Err(e)) => exit_with(&e.to_string()),
                None => exit_with("--theme needs a value"),
            },
            "--config" => match args.next() {
                Some(path) => match EngineConfig::load(&path) {
                    Ok(c) => config = c,
                    Err(e) => exit_with(&format!("{path}: {e}")),
                },
                None => exit_with("--config needs a path"),
            },
            "-h" | "--help" => {
                println!("usage: ambient-field [--theme light|dark] [--config path.json]");
                return;
            }
            other => exit_with(&format!("unknown argument `{other}`")),
        }
    }

    if let Err(e) = ambient_field::window::run(theme, config) {
        exit_with(&e.to_string());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn exit_with(message: &str) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

#[cfg(target_arch = "wasm32")]
fn main() {}
