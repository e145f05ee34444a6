//! Spatial index for the paddock simulator.
//!
//! This crate provides the raster spatial structures the engine uses for
//! occupancy queries and simulated sensing:
//!
//! - [`PixelCoord`] - integer pixel coordinates
//! - [`RasterIndex`] - multi-resolution raster mapping pixels to the set of
//!   values (blocks, in the engine) occupying them
//! - [`Ray`] and [`GridTraversal`] - 2D ray / grid traversal (DDA)
//! - [`Trace`] - result of walking a ray through an index
//!
//! # Layering
//!
//! This crate has no dependency on the model tree; the per-pixel payload is
//! a caller-chosen `T`. It can be used on its own for occupancy grids,
//! visibility queries, or line rasterization.
//!
//! # Multi-resolution structure
//!
//! The pixel plane is tiled twice: [`REGION_WIDTH`]-pixel-square **regions**
//! and [`SUPER_REGION_WIDTH`]-region-square **superregions**. Each tier keeps
//! a count of the entries beneath it, so a ray crossing empty space jumps
//! whole tiles at a time instead of stepping pixel by pixel.
//!
//! # Units
//!
//! The index is constructed with a resolution in **pixels per meter**; its
//! public API speaks meters and converts internally. One pixel covers
//! `1 / ppm` meters.
//!
//! # Example
//!
//! ```
//! use paddock_spatial::{PixelCoord, RasterIndex};
//! use nalgebra::Point2;
//!
//! let mut index: RasterIndex<u32> = RasterIndex::new(10.0);
//!
//! // Occupy the pixel covering (2.05, 0.0).
//! let pixel = index.pixel_at(Point2::new(2.05, 0.0));
//! index.insert(pixel, 7);
//!
//! // A ray along +X finds it.
//! let trace = index.trace(Point2::origin(), 0.0, 10.0, |v| *v == 7);
//! assert_eq!(trace.hit, Some(7));
//! assert!((trace.range - 2.0).abs() < 0.11); // hit at the pixel boundary
//!
//! index.remove(pixel, &7);
//! assert!(index.is_empty());
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Pedantic allowances that fight the domain
#![allow(
    clippy::cast_possible_truncation, // meters -> pixel floors are intentional
    clippy::cast_precision_loss,      // pixel -> meters conversions are intentional
    clippy::module_name_repetitions
)]

mod error;
mod pixel;
mod raster;
mod raytrace;

pub use error::SpatialError;
pub use pixel::{PixelCoord, PIXELS_PER_SUPER_REGION, REGION_WIDTH, SUPER_REGION_WIDTH};
pub use raster::RasterIndex;
pub use raytrace::{GridTraversal, Ray, Trace};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};
