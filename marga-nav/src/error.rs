//! Error types for MargaNav

use thiserror::Error;

/// MargaNav error type
#[derive(Error, Debug)]
pub enum NavError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scene error: {0}")]
    Scene(String),

    #[error("{0} channel closed")]
    ChannelClosed(&'static str),

    #[error("No request in flight")]
    Idle,

    #[error("No outcome for request {id} within {waited_ms} ms")]
    ReplyTimeout { id: u64, waited_ms: u64 },
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

impl From<marga::ConfigLoadError> for NavError {
    fn from(e: marga::ConfigLoadError) -> Self {
        NavError::Scene(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
