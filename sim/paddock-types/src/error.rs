//! Error types for simulation operations.
//!
//! The engine distinguishes recoverable errors (bad configuration, lookup
//! misses surfaced through APIs that promise a model) from invariant
//! violations, which are programming errors and panic instead.

use thiserror::Error;

/// Errors that can occur building or querying a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SimError {
    /// The raster resolution must be positive and finite.
    #[error("invalid raster resolution: {0} pixels/meter (must be positive and finite)")]
    InvalidResolution(f64),

    /// The tick interval must be nonzero.
    #[error("invalid tick interval: {0} microseconds (must be nonzero)")]
    InvalidInterval(u64),

    /// No model with the given token exists in the world.
    #[error("model not found: {token}")]
    ModelNotFound {
        /// Token of the missing model.
        token: String,
    },
}

impl SimError {
    /// Create a model-not-found error.
    #[must_use]
    pub fn model_not_found(token: impl Into<String>) -> Self {
        Self::ModelNotFound {
            token: token.into(),
        }
    }

    /// Check if this is a lookup miss.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModelNotFound { .. })
    }
}
