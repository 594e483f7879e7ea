// In src/main.rs

use render_pump::{
    app::{self, EXIT_FAILURE},
    config::{Config, CONFIG},
    platform::HeadlessWindow,
};

use anyhow::Context;
use log::{error, info};
use std::process::ExitCode;

/// Main entry point for the `render-pump` application.
fn main() -> ExitCode {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting render-pump...");

    let status = match run(&CONFIG) {
        Ok(status) => status,
        Err(e) => {
            error!("render-pump failed: {:#}. Root cause: {:?}", e, e.root_cause());
            EXIT_FAILURE
        }
    };
    info!("render-pump exiting with status {}", status);
    ExitCode::from(u8::try_from(status).unwrap_or(1))
}

fn run(config: &Config) -> anyhow::Result<i32> {
    #[cfg(feature = "x11")]
    if !config.window.headless {
        let mut window = match render_pump::platform::x11::X11Window::new(&config.window) {
            Ok(window) => window,
            Err(e) => {
                error!("Failed to create X11 window: {:#}", e);
                return Ok(EXIT_FAILURE);
            }
        };
        return app::run(&mut window, config);
    }

    #[cfg(not(feature = "x11"))]
    if !config.window.headless {
        info!("Built without the x11 feature, using a headless window.");
    }

    let window = match HeadlessWindow::new(
        &config.window.title,
        config.window.width,
        config.window.height,
    )
    .context("Failed to create headless window")
    {
        Ok(window) => window,
        Err(e) => {
            error!("{:#}", e);
            return Ok(EXIT_FAILURE);
        }
    };
    let mut window = window.with_close_after_frames(config.window.headless_frame_limit);
    app::run(&mut window, config)
}
