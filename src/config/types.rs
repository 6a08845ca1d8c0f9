use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::device::constants::{DEFAULT_DEVICE_NAME, REFRESH_DELAY, VOLUME_STEP_DEGREES, WRITE_DEADLINE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// External program used to play a station on this computer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            program: "mpv".to_string(),
            args: vec!["--no-video".to_string(), "--really-quiet".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub device_name: String,
    pub log_level: LogLevel,
    pub refresh_delay_ms: u64,
    pub write_deadline_ms: u64,
    pub volume_step_degrees: u16,
    pub player: PlayerConfig,
    pub buffer_size: Option<u32>,
    // the wifi password is never stored
    pub wifi_ssid: Option<String>,
}

impl Config {
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn write_deadline(&self) -> Duration {
        Duration::from_millis(self.write_deadline_ms)
    }

    /// Clamp values that would break the session if taken literally.
    pub fn sanitize(&mut self) {
        if self.device_name.trim().is_empty() {
            self.device_name = DEFAULT_DEVICE_NAME.to_string();
        }
        self.volume_step_degrees = self.volume_step_degrees.clamp(1, 180);
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            log_level: LogLevel::Info,
            refresh_delay_ms: REFRESH_DELAY,
            write_deadline_ms: WRITE_DEADLINE,
            volume_step_degrees: VOLUME_STEP_DEGREES,
            player: PlayerConfig::default(),
            buffer_size: None,
            wifi_ssid: None,
        }
    }
}
