use std::io;
use thiserror::Error;
use msgbox::IconType;
use std::fmt::Display;
use std::str::Utf8Error;
use btleplug;
use iced;
use serde_json;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl ConfigError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            ConfigError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },
}

/// Everything that can go wrong while talking to the radio.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Bluetooth is not available on this system")]
    EnvironmentUnsupported,

    #[error("Linking was cancelled")]
    UserCancelled,

    #[error("Connecting to the radio failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("A required bluetooth characteristic is not available")]
    MissingCharacteristic,

    #[error("Not connected to the radio")]
    NotConnected,

    #[error("Writing to the command characteristic failed: {reason}")]
    WriteFailed { reason: String },

    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },
}

impl LinkError {
    /// Bluetooth itself is missing or forbidden, so retrying cannot help.
    pub fn is_environment_error(&self) -> bool {
        match self {
            LinkError::EnvironmentUnsupported => true,
            LinkError::Btle { source: btleplug::Error::PermissionDenied } => true,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Refusing to play a non-http stream: {url}")]
    NotHttp { url: String },

    #[error("Failed to start the audio player: {source}")]
    Spawn { #[from] source: io::Error },
}

pub fn error_msgbox<T: Display>(message: &'static str, error: &T) {
    let message = format!("{}: {}", message, error);
    eprintln!("{}", &message);
    if let Err(err) = msgbox::create(concat!("DexRadio Remote ", env!("CARGO_PKG_VERSION")), &message, IconType::Error) {
        eprintln!("Failed to create msgbox: {:?}", err);
    }
}
