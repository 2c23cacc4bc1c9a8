mod app;
mod cli;
mod config;
mod logging;
mod render;

use std::process::ExitCode;

use clap::Parser;
use engine_logging::engine_warn;

fn main() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();

    // Logging depends on the config, so a bad config is reported once the logger is up.
    let (config, config_error) = match config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(err) => (config::AppConfig::default(), Some(err)),
    };
    logging::initialize(config.log);
    if let Some(err) = config_error {
        engine_warn!("{:#}; using defaults", err);
        eprintln!("Warning: {err:#}; using defaults");
    }

    let success = app::run(&cli, &config)?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
