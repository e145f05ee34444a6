//! Callback hooks for model state changes and subtype dispatch.
//!
//! The engine exposes two kinds of hooks:
//!
//! - **Change callbacks**, keyed by [`ChangeKey`], fire synchronously after
//!   a model attribute mutates. They receive the model; any user data lives
//!   in the closure's captures.
//! - **Model hooks** ([`ModelHooks`]) are the per-model dispatch table that
//!   replaces subclassing: a sensor installs its own `update` routine and
//!   receives the world, so it can raytrace from inside the tick.
//!
//! Hooks are `Arc<dyn Fn>`:
//!
//! - `Arc` preserves `Clone` on the containing model
//! - `Fn` (not `FnMut`) keeps firing re-entrant and read-only
//! - `Send + Sync` bounds allow worlds to move across threads between ticks

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use paddock_types::ModelId;

use crate::model::Model;
use crate::world::World;

/// Thread-safe callback wrapper that implements Debug.
///
/// Wraps `Arc<dyn Fn(...) + Send + Sync>` and provides a Debug impl
/// (since `dyn Fn` doesn't implement Debug).
pub struct Callback<F: ?Sized>(pub Arc<F>);

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(<fn>)")
    }
}

/// Change callback: receives the model whose attribute changed.
pub type CbChange = Callback<dyn Fn(&Model) + Send + Sync>;

/// Lifecycle/update hook: receives the world and the model's id.
pub type CbWorld = Callback<dyn Fn(&World, ModelId) + Send + Sync>;

impl Callback<dyn Fn(&Model) + Send + Sync> {
    /// Wrap a closure as a change callback.
    #[must_use]
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Model) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl Callback<dyn Fn(&World, ModelId) + Send + Sync> {
    /// Wrap a closure as a lifecycle/update hook.
    #[must_use]
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&World, ModelId) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

/// The attribute whose change fires a registered callback.
///
/// Replaces keying by attribute address: every mutable model attribute with
/// a notification contract has one enumerated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChangeKey {
    /// Local pose changed (fires even when set to the same value).
    Pose,
    /// Velocity changed.
    Velocity,
    /// Geometry (size / body origin) changed.
    Geom,
    /// Color changed.
    Color,
    /// Stall flag changed (re-asserted every motion tick).
    Stall,
    /// Parent link changed.
    Parent,
    /// First subscription arrived.
    Startup,
    /// Last subscription left.
    Shutdown,
    /// The model ran its periodic update.
    Update,
    /// Obstacle visibility changed.
    ObstacleReturn,
    /// Ranger visibility changed.
    RangerReturn,
    /// Blob-finder visibility changed.
    BlobReturn,
    /// Laser visibility changed.
    LaserReturn,
    /// Gripper flag changed.
    GripperReturn,
    /// Fiducial id changed.
    FiducialReturn,
    /// Fiducial key changed.
    FiducialKey,
    /// Power draw changed.
    Watts,
    /// Map resolution changed.
    MapResolution,
    /// GUI nose flag changed.
    GuiNose,
    /// GUI grid flag changed.
    GuiGrid,
    /// GUI outline flag changed.
    GuiOutline,
    /// GUI move mask changed.
    GuiMoveMask,
}

/// Handle returned by callback registration, used to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Per-model registry of change callbacks.
#[derive(Debug, Default)]
pub(crate) struct CallbackRegistry {
    next_id: u64,
    slots: HashMap<ChangeKey, Vec<(CallbackId, CbChange)>>,
}

impl CallbackRegistry {
    /// Register a callback under a key; the returned id deregisters it.
    pub(crate) fn register(&mut self, key: ChangeKey, callback: CbChange) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.slots.entry(key).or_default().push((id, callback));
        id
    }

    /// Remove a callback by key and id. Returns whether it was present.
    pub(crate) fn remove(&mut self, key: ChangeKey, id: CallbackId) -> bool {
        let Some(list) = self.slots.get_mut(&key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(cb_id, _)| *cb_id != id);
        before != list.len()
    }

    /// Fire every callback registered under `key`.
    pub(crate) fn fire(&self, key: ChangeKey, model: &Model) {
        if let Some(list) = self.slots.get(&key) {
            for (_, callback) in list {
                (callback.0)(model);
            }
        }
    }
}

/// The per-model dispatch table for subtype behavior.
///
/// `startup` runs on the first subscription, `shutdown` on the last
/// unsubscription, and `update` every time the model's update interval
/// elapses. Sensors built on the engine install an `update` hook and store
/// their readings in their own captured state.
#[derive(Debug, Clone, Default)]
pub struct ModelHooks {
    /// Runs when the subscription count goes 0 to 1.
    pub startup: Option<CbWorld>,
    /// Runs when the subscription count returns to 0.
    pub shutdown: Option<CbWorld>,
    /// Runs on each due update tick.
    pub update: Option<CbWorld>,
}
