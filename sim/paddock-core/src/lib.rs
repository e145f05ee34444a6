//! Core engine of the paddock 2D multi-robot simulator.
//!
//! This crate implements the world-model-block engine: a hierarchical
//! scene of rigid bodies whose polygonal footprints are rasterized into a
//! multi-resolution spatial index, advanced by a kinematic tick loop with
//! collision stalling, and queried by a raytracer that simulated sensors
//! build on.
//!
//! - [`World`] owns every [`Model`], the spatial index, and the clock
//! - [`Model`]s form a tree; poses compose down it and children rest on
//!   top of their parents
//! - [`Block`]s are polygonal prisms; mapping one rasterizes its edges
//!   into the index, unmapping removes exactly those entries
//! - [`World::step`] advances time, moves every model with velocity
//!   (stalling those that would strike an obstacle), and runs due updates
//! - [`World::raytrace_from`] and friends answer sensor queries with
//!   requester exclusion and height-band filtering
//!
//! # Scheduling model
//!
//! Single-threaded and cooperative: nothing here spawns threads or
//! suspends. Change callbacks and update hooks run synchronously on the
//! ticking thread, after the mutation they observe.
//!
//! # Example
//!
//! ```
//! use paddock_core::World;
//! use paddock_types::{Geom, Pose, Size, Velocity, WorldConfig};
//!
//! let mut world = World::with_config(
//!     WorldConfig::named("arena").with_interval_sim(100_000),
//! ).unwrap();
//!
//! // A robot and a wall segment.
//! let robot = world.create_model(None, "position");
//! world.set_geom(robot, Geom::sized(Size::new(0.4, 0.4, 0.2)));
//! let wall = world.create_model(None, "box");
//! world.set_geom(wall, Geom::sized(Size::new(0.2, 4.0, 0.5)));
//! world.set_pose(wall, Pose::from_xy(3.0, 0.0));
//!
//! // Drive forward until the wall stalls us.
//! world.set_velocity(robot, Velocity::linear(1.0, 0.0));
//! for _ in 0..40 {
//!     world.step();
//! }
//! assert!(world.model(robot).unwrap().stall());
//! assert!(world.global_pose(robot).x < 3.0);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![warn(clippy::all)]
// Allow certain clippy lints that are overly pedantic for engine code
#![allow(
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc, // Error docs added where non-obvious
    clippy::cast_precision_loss // sample counts and pixel math use f64 deliberately
)]

mod block;
mod callback;
mod model;
mod raytrace;
mod step;
mod visit;
mod world;

pub use block::{Block, BlockRef};
pub use callback::{Callback, CallbackId, CbChange, CbWorld, ChangeKey, ModelHooks};
pub use model::{
    GuiFlags, Model, TrailPoint, Visibility, DEFAULT_UPDATE_INTERVAL, MOVE_ROTATE,
    MOVE_TRANSLATE, TRAIL_INTERVAL, TRAIL_LENGTH,
};
pub use raytrace::{RayMatch, RaySample};
pub use step::Collision;
pub use visit::{PoseStack, SceneVisitor};
pub use world::World;

// Re-export the shared data types for convenience
pub use paddock_types::{
    Bounds, Bounds3, Color, Geom, ModelId, Pose, SimError, Size, Velocity, WorldConfig,
};
