//! Configuration loading errors.

use thiserror::Error;

/// Config or scene load error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoadError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(String),
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}
