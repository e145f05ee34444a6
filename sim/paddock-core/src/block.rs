//! Blocks: the polygonal prisms models are built from.
//!
//! A block is a simple polygon (at least three vertices, convexity not
//! required) extruded between two heights. A model's body is an ordered
//! list of blocks. Mapping a block rasterizes its polygon edges into the
//! world's spatial index; unmapping replays the recorded pixels to remove
//! exactly the entries it inserted.

use nalgebra::Point2;
use paddock_types::{Bounds, Color, ModelId, Pose, Size};
use paddock_spatial::{PixelCoord, RasterIndex};

use crate::model::Model;

/// Weak reference from the spatial index back to a block: the owning
/// model's id plus the block's position in that model's body.
///
/// This is deliberately an index pair rather than any kind of pointer; the
/// index never owns blocks and a destroyed block removes its own entries
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef {
    /// The model owning the block.
    pub model: ModelId,
    /// The block's index in the owner's body.
    pub block: u32,
}

/// The rasterized state of a mapped block: the pixels its edges were
/// drawn into (the removal handles) and its global vertical band.
#[derive(Debug, Clone)]
pub(crate) struct Footprint {
    pixels: Vec<PixelCoord>,
    global_zmin: f64,
    global_zmax: f64,
}

/// A polygonal prism attached to a model.
#[derive(Debug, Clone)]
pub struct Block {
    points: Vec<Point2<f64>>,
    zmin: f64,
    zmax: f64,
    color: Color,
    inherit_color: bool,
    mapped: Option<Footprint>,
}

impl Block {
    /// Create a block from a polygon outline and a vertical extent.
    ///
    /// The points are copied. The rasterized footprint is undefined until
    /// the block is mapped.
    ///
    /// # Panics
    ///
    /// Panics if fewer than three vertices are given.
    pub(crate) fn new(
        points: &[Point2<f64>],
        zmin: f64,
        zmax: f64,
        color: Color,
        inherit_color: bool,
    ) -> Self {
        assert!(
            points.len() >= 3,
            "a block requires at least three vertices, got {}",
            points.len()
        );
        Self {
            points: points.to_vec(),
            zmin,
            zmax,
            color,
            inherit_color,
            mapped: None,
        }
    }

    /// An axis-aligned rectangle block spanning z in [0, 1], inheriting the
    /// owner's color. Every new model gets one of these as its default
    /// body.
    pub(crate) fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        let points = [
            Point2::new(x, y),
            Point2::new(x + width, y),
            Point2::new(x + width, y + height),
            Point2::new(x, y + height),
        ];
        Self::new(&points, 0.0, 1.0, Color::BLACK, true)
    }

    /// The polygon outline, in body-local meters.
    #[must_use]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Lower extent of the prism, body-local.
    #[must_use]
    pub fn zmin(&self) -> f64 {
        self.zmin
    }

    /// Upper extent of the prism, body-local.
    #[must_use]
    pub fn zmax(&self) -> f64 {
        self.zmax
    }

    /// Whether the block draws in its owner's color instead of its own.
    #[must_use]
    pub fn inherits_color(&self) -> bool {
        self.inherit_color
    }

    /// The color this block renders as, resolving inheritance against its
    /// owner.
    #[must_use]
    pub fn color_on(&self, owner: &Model) -> Color {
        if self.inherit_color {
            owner.color()
        } else {
            self.color
        }
    }

    /// Whether the block currently occupies the spatial index.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.mapped.is_some()
    }

    /// The block's global vertical band, available only while mapped.
    #[must_use]
    pub fn global_z_bounds(&self) -> Option<Bounds> {
        self.mapped
            .as_ref()
            .map(|footprint| Bounds::new(footprint.global_zmin, footprint.global_zmax))
    }

    /// Rasterize this block into the index at the owner's body frame.
    ///
    /// `origin` is the owner's global pose composed with its geometry
    /// offset. Records one removal handle per inserted pixel and the
    /// global vertical band for the raytracer's Z filter.
    ///
    /// # Panics
    ///
    /// Panics if the block is already mapped; map/unmap must be paired.
    pub(crate) fn map(&mut self, origin: &Pose, index: &mut RasterIndex<BlockRef>, me: BlockRef) {
        assert!(self.mapped.is_none(), "block {me:?} is already mapped");

        let global: Vec<Point2<f64>> = self
            .points
            .iter()
            .map(|point| origin.transform_point(point))
            .collect();

        let pixels = index.polygon_footprint(&global);
        for &pixel in &pixels {
            index.insert(pixel, me);
        }

        let global_zmin = origin.z + self.zmin;
        self.mapped = Some(Footprint {
            pixels,
            global_zmin,
            global_zmax: global_zmin + (self.zmax - self.zmin),
        });
    }

    /// Remove every entry this block inserted. Idempotent: unmapping an
    /// unmapped block is a no-op.
    pub(crate) fn unmap(&mut self, index: &mut RasterIndex<BlockRef>, me: BlockRef) {
        if let Some(footprint) = self.mapped.take() {
            for pixel in footprint.pixels {
                index.remove(pixel, &me);
            }
        }
    }

    /// Rescale a body so it fits a bounding size.
    ///
    /// Computes the axis-aligned bounding box over every vertex of every
    /// block, then rescales all vertices to fill `size` centered on the
    /// origin. Heights scale by `size.z / max_zmax`. Every block must be
    /// unmapped first.
    ///
    /// # Panics
    ///
    /// Panics if any vertex is NaN, or if any block is still mapped.
    pub(crate) fn scale_to_fit(blocks: &mut [Self], size: &Size) {
        if blocks.is_empty() {
            return;
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut max_z: f64 = 0.0;

        for block in blocks.iter() {
            assert!(!block.is_mapped(), "cannot rescale a mapped block");
            for point in &block.points {
                assert!(
                    point.x.is_finite() && point.y.is_finite(),
                    "block vertex is not finite"
                );
                min_x = min_x.min(point.x);
                min_y = min_y.min(point.y);
                max_x = max_x.max(point.x);
                max_y = max_y.max(point.y);
            }
            max_z = max_z.max(block.zmax);
        }

        let scale_x = max_x - min_x;
        let scale_y = max_y - min_y;
        let scale_z = size.z / max_z;

        for block in blocks.iter_mut() {
            for point in &mut block.points {
                point.x = (point.x - min_x) / scale_x * size.x - size.x / 2.0;
                point.y = (point.y - min_y) / scale_y * size.y - size.y / 2.0;
                assert!(
                    point.x.is_finite() && point.y.is_finite(),
                    "block vertex did not survive rescale"
                );
            }
            block.zmin *= scale_z;
            block.zmax *= scale_z;
        }
    }
}
