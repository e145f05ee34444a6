//! Core types for the paddock 2D multi-robot simulator.
//!
//! This crate provides the foundational types shared across the paddock
//! engine:
//!
//! - [`Pose`] - planar position + height + heading, with frame composition
//! - [`Velocity`] - body-frame linear and angular rates
//! - [`Geom`] and [`Size`] - a body's bounding size and origin offset
//! - [`Color`] - RGBA appearance used by blocks and trails
//! - [`ModelId`] - world-scoped model identity
//! - [`WorldConfig`] - raster resolution, tick interval, optional extent
//!
//! # Design Philosophy
//!
//! These types are **pure data plus math**. They carry no simulation
//! behavior; they are the common language between the spatial index, the
//! model tree, sensor code built on the raytrace API, and tooling.
//!
//! # Coordinate System
//!
//! The world is planar with a height axis used only for stacking and ray
//! filtering:
//!
//! - X, Y: the plane robots move in (meters)
//! - Z: height (meters), children rest on top of their parents
//! - headings in radians, always normalized to (-pi, pi]
//!
//! # Example
//!
//! ```
//! use paddock_types::Pose;
//!
//! // A frame one meter forward, turned 90 degrees left.
//! let frame = Pose::new(1.0, 0.0, 0.0, std::f64::consts::FRAC_PI_2);
//!
//! // One meter along the frame's X axis lands at (1, 1) in the world.
//! let p = frame.compose(&Pose::new(1.0, 0.0, 0.0, 0.0));
//! assert!((p.x - 1.0).abs() < 1e-12);
//! assert!((p.y - 1.0).abs() < 1e-12);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![warn(clippy::all)]
// Allow certain clippy lints that are overly pedantic for type definitions
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to float math
    clippy::missing_errors_doc    // Error docs added where non-obvious
)]

mod color;
mod config;
mod error;
mod geom;
mod id;
mod pose;

pub use color::Color;
pub use config::WorldConfig;
pub use error::SimError;
pub use geom::{Bounds, Bounds3, Geom, Size};
pub use id::ModelId;
pub use pose::{normalize_angle, Pose, Velocity};

// Re-export the math types used throughout the engine
pub use nalgebra::{Point2, Vector2};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
