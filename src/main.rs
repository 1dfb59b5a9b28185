//! Always-on-top countdown to the next Saturday midnight

mod logging;
mod scheduler;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use pressure_core::interaction::BASE_POINT_SIZE;
use pressure_core::{AppConfig, CountdownFormat, TICK_INTERVAL, format_countdown};
use pressure_overlay::{
    CountdownWidget, FontFace, NativeOverlay, OverlayConfig, OverlayWindow, show_fatal_message,
};

use crate::scheduler::Scheduler;

const APP_TITLE: &str = "Pressure";

#[derive(Parser, Debug)]
#[command(version, about = "Countdown to the weekend")]
struct Cli {
    /// Font file to render with (default: font.ttf next to the executable)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Read settings from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show days, hours and minutes only
    #[arg(long)]
    hide_seconds: bool,

    /// Print the current countdown and exit
    #[arg(long)]
    print_countdown: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keep stdout clean for --print-countdown
    let _guard = if cli.print_countdown {
        None
    } else {
        logging::init()
    };

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if let Some(font) = cli.font {
        config.font_path = Some(font);
    }
    if cli.hide_seconds {
        config.show_seconds = false;
    }

    if cli.print_countdown {
        let format = CountdownFormat {
            show_seconds: config.show_seconds,
            has_colon: true,
        };
        println!("{}", format_countdown(&Local::now(), format));
        return ExitCode::SUCCESS;
    }

    tracing::debug!(?config, "Configuration loaded");

    let font_path = config.resolved_font_path();
    let font = match FontFace::load(&font_path, BASE_POINT_SIZE) {
        Ok(font) => font,
        Err(e) => return fatal("Could not load the font", &e),
    };
    tracing::info!(path = ?font_path, family = font.family(), "Font ready");

    let window = match OverlayWindow::<NativeOverlay>::new(OverlayConfig::default()) {
        Ok(window) => window,
        Err(e) => return fatal("Could not create the window", &e),
    };

    let mut widget = CountdownWidget::new(window, font, &config);
    Scheduler::new(TICK_INTERVAL).run(|| widget.tick(&Local::now()));
    drop(widget);

    tracing::info!("Shut down cleanly");
    ExitCode::SUCCESS
}

fn fatal(context: &str, error: &dyn std::error::Error) -> ExitCode {
    tracing::error!(error = %error, source = ?error.source(), "{context}");
    show_fatal_message(APP_TITLE, &format!("{context}: {error}"));
    ExitCode::FAILURE
}
