//! Error types for the compass engine
//!
//! The runtime path (sensor callbacks, bearing getters, the render loop)
//! never fails. Errors only come out of configuration handling and the
//! lifecycle of the animation worker thread.

use thiserror::Error;

/// Compass engine error types
#[derive(Error, Debug)]
pub enum CompassError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Failed to spawn animation thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Animation thread panicked")]
    AnimationPanicked,
}

/// Result type for fallible compass operations
pub type Result<T> = core::result::Result<T, CompassError>;
