//! Models: the nodes of the scene tree.
//!
//! A model carries its kinematic state, its body of blocks, its visibility
//! to the various sensor modalities, and its lifecycle bookkeeping. All
//! mutation goes through the owning [`World`](crate::world::World), which
//! maintains the cross-model invariants (velocity list membership, spatial
//! index consistency, global-pose cache dirtiness) and fires change
//! callbacks.

use std::cell::Cell;
use std::collections::VecDeque;

use paddock_types::{Color, Geom, ModelId, Pose, Velocity};

use crate::block::Block;
use crate::callback::{CallbackRegistry, ModelHooks};

/// Maximum number of trail checkpoints retained per model.
pub const TRAIL_LENGTH: usize = 100;

/// A trail checkpoint is recorded every this many ticks.
pub const TRAIL_INTERVAL: u64 = 10;

/// Default update interval for a model, in microseconds.
pub const DEFAULT_UPDATE_INTERVAL: u64 = 10_000; // 10 ms

/// The model may be dragged in the plane.
pub const MOVE_TRANSLATE: u32 = 1;
/// The model may be rotated.
pub const MOVE_ROTATE: u32 = 2;

/// How strongly a model registers in a sensor modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// The modality does not perceive this model at all.
    Invisible,
    /// Perceived with ordinary intensity.
    #[default]
    Visible,
    /// Perceived with high intensity (e.g. retro-reflective to a laser).
    Bright,
}

impl Visibility {
    /// True for anything a sensor can perceive.
    #[must_use]
    pub fn is_visible(self) -> bool {
        self != Self::Invisible
    }
}

/// GUI presentation flags carried by every model for external renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuiFlags {
    /// Draw a heading nose.
    pub nose: bool,
    /// Draw a scaling grid.
    pub grid: bool,
    /// Draw a bounding outline.
    pub outline: bool,
    /// Mouse-move permissions, a combination of [`MOVE_TRANSLATE`] and
    /// [`MOVE_ROTATE`].
    pub movemask: u32,
}

/// One checkpoint in a model's motion trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    /// The model's local pose at the checkpoint.
    pub pose: Pose,
    /// The model's color at the checkpoint.
    pub color: Color,
    /// Simulation time of the checkpoint, in microseconds.
    pub time: u64,
}

/// A node in the scene tree.
///
/// Read access is public; mutation goes through the world so the engine's
/// invariants hold. The global-pose cache lives in `Cell`s because reads
/// happen behind `&World` during raytracing and update hooks; the
/// scheduling model is single-threaded cooperative, so this is plain
/// memoization, not shared-state concurrency.
#[derive(Debug)]
pub struct Model {
    pub(crate) id: ModelId,
    pub(crate) token: String,
    pub(crate) type_name: String,

    pub(crate) parent: Option<ModelId>,
    pub(crate) children: Vec<ModelId>,

    pub(crate) pose: Pose,
    pub(crate) global_pose: Cell<Pose>,
    pub(crate) gpose_dirty: Cell<bool>,
    pub(crate) velocity: Velocity,
    pub(crate) on_velocity_list: bool,
    pub(crate) stall: bool,
    pub(crate) disabled: bool,

    pub(crate) geom: Geom,
    pub(crate) blocks: Vec<Block>,
    pub(crate) needs_redraw: bool,

    pub(crate) color: Color,
    pub(crate) map_resolution: f64,

    pub(crate) obstacle_return: Visibility,
    pub(crate) ranger_return: Visibility,
    pub(crate) blob_return: Visibility,
    pub(crate) laser_return: Visibility,
    pub(crate) gripper_return: bool,
    pub(crate) fiducial_return: i32,
    pub(crate) fiducial_key: i32,

    pub(crate) watts: f64,
    pub(crate) gui: GuiFlags,

    pub(crate) subs: u32,
    pub(crate) last_update: u64,
    pub(crate) interval: u64,

    pub(crate) hooks: ModelHooks,
    pub(crate) callbacks: CallbackRegistry,
    pub(crate) trail: VecDeque<TrailPoint>,
}

impl Model {
    pub(crate) fn new(
        id: ModelId,
        token: String,
        type_name: String,
        parent: Option<ModelId>,
    ) -> Self {
        Self {
            id,
            token,
            type_name,
            parent,
            children: Vec::new(),
            pose: Pose::identity(),
            global_pose: Cell::new(Pose::identity()),
            gpose_dirty: Cell::new(true),
            velocity: Velocity::zero(),
            on_velocity_list: false,
            stall: false,
            disabled: false,
            geom: Geom::default(),
            blocks: Vec::new(),
            needs_redraw: true,
            color: Color::default(),
            map_resolution: 0.1,
            obstacle_return: Visibility::Visible,
            ranger_return: Visibility::Visible,
            blob_return: Visibility::Visible,
            laser_return: Visibility::Visible,
            gripper_return: false,
            fiducial_return: 0,
            fiducial_key: 0,
            watts: 0.0,
            gui: GuiFlags {
                nose: false,
                grid: false,
                outline: true,
                // Only top-level models may be dragged around.
                movemask: if parent.is_some() {
                    0
                } else {
                    MOVE_TRANSLATE | MOVE_ROTATE
                },
            },
            subs: 0,
            last_update: 0,
            interval: DEFAULT_UPDATE_INTERVAL,
            hooks: ModelHooks::default(),
            callbacks: CallbackRegistry::default(),
            trail: VecDeque::new(),
        }
    }

    /// The model's world-scoped id.
    #[must_use]
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The model's stable token, derived from its parent's token and type.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The model's type name ("position", "laser", ...).
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The parent model, if any. A parentless model hangs off the world.
    #[must_use]
    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }

    /// The model's children, in attachment order.
    #[must_use]
    pub fn children(&self) -> &[ModelId] {
        &self.children
    }

    /// The local pose, relative to the parent's frame.
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// The cached global pose, if the cache is clean.
    #[must_use]
    pub fn cached_global_pose(&self) -> Option<Pose> {
        if self.gpose_dirty.get() {
            None
        } else {
            Some(self.global_pose.get())
        }
    }

    /// The body-frame velocity.
    #[must_use]
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Whether the model's last commanded motion was suppressed by a
    /// collision.
    #[must_use]
    pub fn stall(&self) -> bool {
        self.stall
    }

    /// Whether pose updates are suspended for this model.
    #[must_use]
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// The model's bounding geometry.
    #[must_use]
    pub fn geom(&self) -> Geom {
        self.geom
    }

    /// The model's body.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Whether an external renderer should rebuild this model's visuals.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// The model's color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Preferred rasterization resolution in meters per pixel.
    ///
    /// Carried per model for tooling; the world's spatial index rasterizes
    /// at the world resolution.
    #[must_use]
    pub fn map_resolution(&self) -> f64 {
        self.map_resolution
    }

    /// Visibility to collision testing.
    #[must_use]
    pub fn obstacle_return(&self) -> Visibility {
        self.obstacle_return
    }

    /// Visibility to ranger sensors.
    #[must_use]
    pub fn ranger_return(&self) -> Visibility {
        self.ranger_return
    }

    /// Visibility to blob finders.
    #[must_use]
    pub fn blob_return(&self) -> Visibility {
        self.blob_return
    }

    /// Visibility to laser sensors.
    #[must_use]
    pub fn laser_return(&self) -> Visibility {
        self.laser_return
    }

    /// Whether a gripper can seize this model. Momentum transfer from
    /// collisions is not implemented; this is carried for sensors and
    /// future grasping logic.
    #[must_use]
    pub fn gripper_return(&self) -> bool {
        self.gripper_return
    }

    /// Fiducial identity; 0 means the model is not a fiducial.
    #[must_use]
    pub fn fiducial_return(&self) -> i32 {
        self.fiducial_return
    }

    /// Fiducial key; finders only perceive fiducials with a matching key.
    #[must_use]
    pub fn fiducial_key(&self) -> i32 {
        self.fiducial_key
    }

    /// Power draw in watts, for energy accounting by external code.
    #[must_use]
    pub fn watts(&self) -> f64 {
        self.watts
    }

    /// GUI presentation flags.
    #[must_use]
    pub fn gui(&self) -> GuiFlags {
        self.gui
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> u32 {
        self.subs
    }

    /// Simulation time of the last completed update, in microseconds.
    #[must_use]
    pub fn last_update(&self) -> u64 {
        self.last_update
    }

    /// This model's update interval, in microseconds.
    #[must_use]
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// The bounded ring of recent motion checkpoints, oldest first.
    #[must_use]
    pub fn trail(&self) -> &VecDeque<TrailPoint> {
        &self.trail
    }

    /// True when any block of this model is mapped into the index.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.blocks.iter().any(Block::is_mapped)
    }

    pub(crate) fn registry(&self) -> &CallbackRegistry {
        &self.callbacks
    }
}
