use std::env;
use clap::Parser;
use crate::config::types::LogLevel;
use crate::error::AppRunError;
use crate::gui::application::{run_application, Overrides};

pub mod config;
pub mod device;
pub mod error;
pub mod gui;
pub mod playback;
pub mod protocol;
pub mod session;

/// Remote control for a DexRadio internet radio over Bluetooth LE.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Advertised name of the radio to connect to, instead of the configured one
    #[arg(long)]
    pub device_name: Option<String>,

    /// Log level, instead of the configured one
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

/// Everything is dispatched to the sinks, `log::set_max_level` decides what is actually written.
/// Starts out at `Info` until the config has been read.
pub fn init_logging(level: Option<LogLevel>) {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .level_for("btleplug", log::LevelFilter::Info)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
    log::set_max_level(level.map(LogLevel::to_filter).unwrap_or(log::LevelFilter::Info));
}

pub fn run(cli: Cli) -> Result<(), AppRunError> {
    let overrides = Overrides {
        device_name: cli.device_name,
        log_level: cli.log_level,
    };

    run_application(overrides)?;
    Ok(())
}
