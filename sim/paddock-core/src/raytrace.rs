//! Ray queries over the world, as consumed by sensor code.
//!
//! Sensors raytrace in their own model's frame; the world transforms the
//! origin through the model's global pose, walks the spatial index, and
//! filters candidate blocks by requester, height band, and a caller
//! predicate. A ray that terminates without a hit is a normal result: the
//! sample carries a null block and the terminal point.

use nalgebra::Point2;

use paddock_types::{Color, ModelId, Pose};

use crate::block::{Block, BlockRef};
use crate::model::Model;
use crate::world::World;

/// Predicate deciding whether a ray accepts a block.
///
/// Receives the block's owning model, the block, and the requesting model.
/// The engine has already excluded the requester's own blocks before the
/// predicate runs.
pub type RayMatch<'a> = &'a dyn Fn(&Model, &Block, &Model) -> bool;

/// The result of one ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySample {
    /// Where the ray terminated, in global meters: the entry point of the
    /// struck block's pixel, or the terminal point of an unobstructed ray.
    pub point: Point2<f64>,
    /// Distance traveled in meters.
    pub range: f64,
    /// Color for visualization: the struck block's color, or the
    /// requester's own on a miss.
    pub color: Color,
    /// The struck block, or `None` when the ray reached full range or left
    /// the world.
    pub block: Option<BlockRef>,
    /// The model that requested the ray.
    pub origin: ModelId,
}

impl World {
    /// Raytrace from a global pose: position is the ray origin, heading the
    /// bearing.
    ///
    /// Blocks owned by `requester` never match. With `ztest` set, a block
    /// only matches when the ray origin's Z lies inside the block's global
    /// vertical band; the origin Z is the requester's global Z unless the
    /// caller puts an explicit offset in the origin pose. If the world has
    /// a configured extent, the ray terminates where it leaves it.
    #[must_use]
    pub fn raytrace_global(
        &self,
        origin: &Pose,
        range: f64,
        matcher: RayMatch<'_>,
        requester: ModelId,
        ztest: bool,
    ) -> RaySample {
        let requester_model = self.model_ref(requester);
        let range = self.clamp_to_extent(origin, range);
        let ray_z = origin.z;

        let trace = self.index.trace(origin.xy(), origin.a, range, |entry: &BlockRef| {
            if entry.model == requester {
                return false;
            }
            let owner = self.model_ref(entry.model);
            let Some(block) = owner.blocks().get(entry.block as usize) else {
                return false;
            };
            if ztest {
                match block.global_z_bounds() {
                    Some(band) if band.contains(ray_z) => {}
                    _ => return false,
                }
            }
            matcher(owner, block, requester_model)
        });

        let (sin, cos) = origin.a.sin_cos();
        let color = match trace.hit {
            Some(block_ref) => {
                let owner = self.model_ref(block_ref.model);
                owner.blocks()[block_ref.block as usize].color_on(owner)
            }
            None => requester_model.color(),
        };

        RaySample {
            point: Point2::new(origin.x + trace.range * cos, origin.y + trace.range * sin),
            range: trace.range,
            color,
            block: trace.hit,
            origin: requester,
        }
    }

    /// Raytrace from a pose expressed in the model's body frame.
    #[must_use]
    pub fn raytrace_from(
        &self,
        model: ModelId,
        origin: &Pose,
        range: f64,
        matcher: RayMatch<'_>,
        ztest: bool,
    ) -> RaySample {
        self.raytrace_global(
            &self.local_to_global(model, origin),
            range,
            matcher,
            model,
            ztest,
        )
    }

    /// Raytrace from the model's origin at a bearing in the model's frame.
    #[must_use]
    pub fn raytrace_bearing(
        &self,
        model: ModelId,
        bearing: f64,
        range: f64,
        matcher: RayMatch<'_>,
        ztest: bool,
    ) -> RaySample {
        self.raytrace_from(model, &Pose::from_heading(bearing), range, matcher, ztest)
    }

    /// Dispatch a fan of evenly spaced rays spanning `fov` centered on
    /// `bearing`, in the model's frame.
    ///
    /// Sample 0 lies at `bearing - fov/2` and the last at
    /// `bearing + fov/2`; a single-sample fan runs along `bearing`.
    #[must_use]
    pub fn raytrace_fan(
        &self,
        model: ModelId,
        bearing: f64,
        range: f64,
        fov: f64,
        samples: usize,
        matcher: RayMatch<'_>,
        ztest: bool,
    ) -> Vec<RaySample> {
        (0..samples)
            .map(|i| {
                let offset = if samples > 1 {
                    -fov / 2.0 + fov * (i as f64) / ((samples - 1) as f64)
                } else {
                    0.0
                };
                self.raytrace_bearing(model, bearing + offset, range, matcher, ztest)
            })
            .collect()
    }

    /// The distance at which a ray from `origin` along its heading leaves
    /// the configured world extent, clamped to `range`. Unbounded worlds
    /// return `range` unchanged.
    fn clamp_to_extent(&self, origin: &Pose, range: f64) -> f64 {
        let Some(extent) = self.config().extent else {
            return range;
        };
        let (sin, cos) = origin.a.sin_cos();
        let mut exit = range;
        for (position, direction, bounds) in
            [(origin.x, cos, extent.x), (origin.y, sin, extent.y)]
        {
            if direction > 0.0 {
                exit = exit.min((bounds.max - position) / direction);
            } else if direction < 0.0 {
                exit = exit.min((bounds.min - position) / direction);
            }
        }
        exit.max(0.0)
    }
}
