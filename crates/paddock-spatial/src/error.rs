//! Error types for spatial operations.

/// Errors that can occur constructing spatial structures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// The raster resolution must be positive and finite.
    #[error("raster resolution must be positive and finite, got {0} pixels/meter")]
    InvalidResolution(f64),
}
