//! # qrgen
//!
//! Command-line QR code generator.

use anyhow::Context;
use clap::Parser;
use qrgen_app::telemetry::init_tracing;
use qrgen_app::{execute, write_notifications, AppConfig, CliArgs, Controller};
use qrgen_core::ThemeSignal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = AppConfig::from(&args);
    tracing::debug!("Data directory: {}", config.data_dir.display());

    let mut controller = Controller::open(&config)
        .with_context(|| format!("Failed to open storage in {}", config.data_dir.display()))?;

    let signal = ThemeSignal::new(config.prefers_dark);
    controller.attach_theme_signal(&signal);

    let mut stdout = std::io::stdout().lock();
    let result = execute(&mut controller, args.command, &mut stdout).await;

    write_notifications(&mut std::io::stderr().lock(), &controller.notifications())
        .context("Failed to write notifications")?;

    controller.shutdown();
    result
}
