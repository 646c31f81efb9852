// src/error.rs

use thiserror::Error;

/// Everything that can go wrong while configuring or running a generation pass.
#[derive(Debug, Error)]
pub enum GenError {
    /// Invalid configuration. Reported before generation starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A degenerate footprint or partition node reached a recursive step.
    /// Callers inside the generator recover from this as an empty production.
    #[error("degenerate geometry: {0}")]
    Geometry(String),

    /// A deferred production resumed after its generation pass was superseded.
    #[error("stale production from epoch {captured} (current epoch {current})")]
    StaleProduction { captured: u64, current: u64 },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GenError {
    pub fn config(msg: impl Into<String>) -> Self {
        GenError::Configuration(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        GenError::Geometry(msg.into())
    }

    /// True for errors that a recursive step treats as natural termination.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GenError::Geometry(_) | GenError::StaleProduction { .. })
    }
}

pub type Result<T> = std::result::Result<T, GenError>;
