//! World configuration.

use crate::{Bounds3, SimError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a simulation world.
///
/// # Example
///
/// ```
/// use paddock_types::WorldConfig;
///
/// let config = WorldConfig::named("arena")
///     .with_ppm(100.0)
///     .with_interval_sim(50_000);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.interval_seconds(), 0.05);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Name of the world; the root of every model token.
    pub name: String,
    /// Raster resolution of the spatial index, in pixels per meter.
    pub ppm: f64,
    /// Simulated time advanced per tick, in microseconds.
    pub interval_sim: u64,
    /// Optional extent of the world. Rays terminate where they leave it;
    /// `None` means the world is unbounded.
    pub extent: Option<Bounds3>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "world".to_owned(),
            ppm: 50.0,
            interval_sim: 100_000, // 100 ms
            extent: None,
        }
    }
}

impl WorldConfig {
    /// Create a configuration with the given world name and defaults
    /// elsewhere.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the raster resolution in pixels per meter.
    #[must_use]
    pub fn with_ppm(mut self, ppm: f64) -> Self {
        self.ppm = ppm;
        self
    }

    /// Set the simulated tick interval in microseconds.
    #[must_use]
    pub fn with_interval_sim(mut self, interval_sim: u64) -> Self {
        self.interval_sim = interval_sim;
        self
    }

    /// Bound the world to the given extent.
    #[must_use]
    pub fn with_extent(mut self, extent: Bounds3) -> Self {
        self.extent = Some(extent);
        self
    }

    /// The tick interval in seconds.
    #[must_use]
    pub fn interval_seconds(&self) -> f64 {
        self.interval_sim as f64 / 1e6
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.ppm.is_finite() || self.ppm <= 0.0 {
            return Err(SimError::InvalidResolution(self.ppm));
        }
        if self.interval_sim == 0 {
            return Err(SimError::InvalidInterval(self.interval_sim));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::Bounds;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.ppm, 50.0);
        assert_eq!(config.interval_sim, 100_000);
        assert!(config.extent.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_resolution() {
        assert_eq!(
            WorldConfig::default().with_ppm(0.0).validate(),
            Err(SimError::InvalidResolution(0.0))
        );
        assert!(WorldConfig::default()
            .with_ppm(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        assert_eq!(
            WorldConfig::default().with_interval_sim(0).validate(),
            Err(SimError::InvalidInterval(0))
        );
    }

    #[test]
    fn test_with_extent() {
        let config = WorldConfig::default().with_extent(Bounds3::new(
            Bounds::new(-10.0, 10.0),
            Bounds::new(-10.0, 10.0),
            Bounds::new(0.0, 5.0),
        ));
        assert!(config.extent.is_some());
        assert!(config.validate().is_ok());
    }
}
