//! Error types for simulation config loading.

use thiserror::Error;

/// Errors that can occur when loading a `SimulationConfig` file.
///
/// Out-of-range values are not errors: они clamp'ятся в `sanitized()`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Failed to read config '{path}': {details}")]
    Io { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in '{path}': {details}")]
    Parse { path: String, details: String },
}
