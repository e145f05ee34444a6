//! The world: container and service hub for the model tree.
//!
//! A [`World`] owns every model, the spatial index their blocks rasterize
//! into, and the simulation clock. All model mutation goes through world
//! methods so the engine invariants hold at every return:
//!
//! - a model is on the velocity list iff its velocity is nonzero
//! - a model is on the update list iff it has at least one subscription
//! - every mapped block's pixels are present in the index, and nothing else
//! - a clean global-pose cache equals the ancestor composition
//!
//! The tick loop and collision machinery live in the [`step`](crate::step)
//! module; ray queries in [`raytrace`](crate::raytrace).

use hashbrown::HashMap;
use rand::Rng;
use tracing::{debug, info, warn};

use paddock_types::{
    Color, Geom, ModelId, Point2, Pose, SimError, Velocity, WorldConfig,
};
use paddock_spatial::RasterIndex;

use crate::block::{Block, BlockRef};
use crate::callback::{CallbackId, CbChange, ChangeKey, ModelHooks};
use crate::model::{Model, Visibility};

/// A simulation world: the model tree, the spatial index, and the clock.
///
/// # Example
///
/// ```
/// use paddock_core::World;
/// use paddock_types::{Pose, Size, Geom};
///
/// let mut world = World::new();
/// let robot = world.create_model(None, "position");
/// world.set_geom(robot, Geom::sized(Size::new(0.5, 0.5, 0.2)));
/// world.set_pose(robot, Pose::from_xy(1.0, 2.0));
///
/// assert_eq!(world.model(robot).unwrap().token(), "world.position:0");
/// ```
pub struct World {
    config: WorldConfig,

    pub(crate) models: HashMap<ModelId, Model>,
    tokens: HashMap<String, ModelId>,
    pub(crate) roots: Vec<ModelId>,

    pub(crate) velocity_list: Vec<ModelId>,
    pub(crate) update_list: Vec<ModelId>,

    pub(crate) index: RasterIndex<BlockRef>,

    pub(crate) sim_time: u64,
    pub(crate) updates: u64,
    pub(crate) total_subs: u32,
    next_id: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(WorldConfig::default())
    }

    /// Create a world with the given configuration.
    pub fn with_config(config: WorldConfig) -> paddock_types::Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        info!(world = %config.name, ppm = config.ppm, "created world");
        let index = RasterIndex::new(config.ppm);
        Self {
            config,
            models: HashMap::new(),
            tokens: HashMap::new(),
            roots: Vec::new(),
            velocity_list: Vec::new(),
            update_list: Vec::new(),
            index,
            sim_time: 0,
            updates: 0,
            total_subs: 0,
            next_id: 0,
        }
    }

    /// The world's name; the root of every model token.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The world configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Simulated time in microseconds.
    #[must_use]
    pub fn sim_time(&self) -> u64 {
        self.sim_time
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.updates
    }

    /// Total subscriptions across all models.
    #[must_use]
    pub fn total_subscriptions(&self) -> u32 {
        self.total_subs
    }

    /// Read access to the spatial index, for diagnostics and tooling.
    #[must_use]
    pub fn spatial_index(&self) -> &RasterIndex<BlockRef> {
        &self.index
    }

    /// Ids of the top-level models, in creation order.
    #[must_use]
    pub fn roots(&self) -> &[ModelId] {
        &self.roots
    }

    /// Ids of the models with nonzero velocity, in insertion order.
    #[must_use]
    pub fn velocity_list(&self) -> &[ModelId] {
        &self.velocity_list
    }

    /// Ids of the models receiving periodic updates, in insertion order.
    #[must_use]
    pub fn update_list(&self) -> &[ModelId] {
        &self.update_list
    }

    // ---- model lifecycle ------------------------------------------------

    /// Create a model, optionally attached to a parent.
    ///
    /// The model starts at the identity pose with a default unit-square
    /// block, which is mapped into the index immediately.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not name a model in this world.
    pub fn create_model(&mut self, parent: Option<ModelId>, type_name: &str) -> ModelId {
        if let Some(parent_id) = parent {
            assert!(
                self.models.contains_key(&parent_id),
                "parent {parent_id} does not exist"
            );
        }

        let id = ModelId::new(self.next_id);
        self.next_id += 1;
        let token = self.make_token(parent, type_name);
        debug!(%token, %id, "creating model");

        let mut model = Model::new(id, token.clone(), type_name.to_owned(), parent);
        model.blocks.push(Block::rect(-0.5, -0.5, 1.0, 1.0));

        self.tokens.insert(token, id);
        self.models.insert(id, model);
        match parent {
            Some(parent_id) => self.model_mut(parent_id).children.push(id),
            None => self.roots.push(id),
        }

        self.map_model(id);
        id
    }

    /// Remove a model and its whole subtree, unmapping every block and
    /// releasing every registration.
    pub fn remove_model(&mut self, id: ModelId) {
        let parent = self.model_ref(id).parent;
        let subtree = self.subtree(id);

        for &sub_id in subtree.iter().rev() {
            self.unmap_model(sub_id);
            let Some(model) = self.models.remove(&sub_id) else {
                continue;
            };
            debug!(token = %model.token, "removing model");
            self.tokens.remove(&model.token);
            self.velocity_list.retain(|m| *m != sub_id);
            self.update_list.retain(|m| *m != sub_id);
            self.total_subs = self.total_subs.saturating_sub(model.subs);
        }

        match parent {
            Some(parent_id) => self.model_mut(parent_id).children.retain(|c| *c != id),
            None => self.roots.retain(|c| *c != id),
        }
    }

    fn make_token(&self, parent: Option<ModelId>, type_name: &str) -> String {
        let (prefix, siblings) = match parent {
            Some(parent_id) => {
                let parent_model = self.model_ref(parent_id);
                (parent_model.token.clone(), &parent_model.children)
            }
            None => (self.config.name.clone(), &self.roots),
        };
        let n = siblings
            .iter()
            .filter(|sibling| self.model_ref(**sibling).type_name == type_name)
            .count();
        format!("{prefix}.{type_name}:{n}")
    }

    // ---- lookups --------------------------------------------------------

    /// The model with the given id, if it exists.
    #[must_use]
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(&id)
    }

    /// Iterate over every model in the world, in no particular order.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Number of models in the world.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Look up a model by its full token.
    #[must_use]
    pub fn model_by_token(&self, token: &str) -> Option<ModelId> {
        self.tokens.get(token).copied()
    }

    /// Look up a model by token, failing loudly when absent.
    pub fn require_model(&self, token: &str) -> paddock_types::Result<ModelId> {
        self.model_by_token(token)
            .ok_or_else(|| SimError::model_not_found(token))
    }

    /// Look up a child of `parent` by its name relative to the parent's
    /// token. Logs and returns `None` on a miss.
    #[must_use]
    pub fn child_model(&self, parent: ModelId, name: &str) -> Option<ModelId> {
        let token = format!("{}.{}", self.model_ref(parent).token, name);
        let found = self.model_by_token(&token);
        if found.is_none() {
            warn!(%token, "model not found");
        }
        found
    }

    /// Depth-first search for a model of the given type with no
    /// subscriptions, used by device multiplexers claiming hardware.
    #[must_use]
    pub fn find_unsubscribed(&self, type_name: &str) -> Option<ModelId> {
        for &root in &self.roots {
            for id in self.subtree(root) {
                let model = self.model_ref(id);
                if model.type_name == type_name && model.subs == 0 {
                    return Some(id);
                }
            }
        }
        None
    }

    // ---- tree relations -------------------------------------------------

    /// True iff `candidate` is `of` itself or one of its ancestors.
    #[must_use]
    pub fn is_antecedent(&self, of: ModelId, candidate: ModelId) -> bool {
        let mut current = Some(of);
        while let Some(c) = current {
            if c == candidate {
                return true;
            }
            current = self.model_ref(c).parent;
        }
        false
    }

    /// True iff `candidate` is `of` itself or one of its descendants.
    #[must_use]
    pub fn is_descendent(&self, of: ModelId, candidate: ModelId) -> bool {
        self.subtree(of).contains(&candidate)
    }

    /// True iff the two models share a root.
    #[must_use]
    pub fn is_related(&self, a: ModelId, b: ModelId) -> bool {
        self.root_of(a) == self.root_of(b)
    }

    /// The top-level ancestor of a model (the model itself when parentless).
    #[must_use]
    pub fn root_of(&self, id: ModelId) -> ModelId {
        let mut current = id;
        while let Some(parent) = self.model_ref(current).parent {
            current = parent;
        }
        current
    }

    /// Reattach a model below a new parent (or detach it to the top level).
    ///
    /// # Panics
    ///
    /// Panics if the new parent is the model itself or one of its
    /// descendants; the tree must stay acyclic.
    pub fn set_parent(&mut self, id: ModelId, new_parent: Option<ModelId>) {
        if let Some(parent_id) = new_parent {
            assert!(
                !self.is_descendent(id, parent_id),
                "reparenting {id} under {parent_id} would create a cycle"
            );
        }

        self.unmap_subtree(id);

        let old_parent = self.model_ref(id).parent;
        match old_parent {
            Some(parent_id) => self.model_mut(parent_id).children.retain(|c| *c != id),
            None => self.roots.retain(|c| *c != id),
        }
        self.model_mut(id).parent = new_parent;
        match new_parent {
            Some(parent_id) => self.model_mut(parent_id).children.push(id),
            None => self.roots.push(id),
        }

        self.mark_dirty_subtree(id);
        self.map_subtree(id);
        self.fire(id, ChangeKey::Parent);
    }

    // ---- poses ----------------------------------------------------------

    /// The model's global pose: the composition of every ancestor's pose,
    /// each ancestor lifting its children by its own height.
    ///
    /// Cached; a clean cache is returned without recomputation.
    #[must_use]
    pub fn global_pose(&self, id: ModelId) -> Pose {
        let model = self.model_ref(id);
        if !model.gpose_dirty.get() {
            return model.global_pose.get();
        }

        let global = match model.parent {
            Some(parent_id) => {
                let parent_pose = self.global_pose(parent_id);
                let mut g = parent_pose.compose(&model.pose);
                // we are on top of our parent
                g.z += self.model_ref(parent_id).geom.size.z;
                g
            }
            None => model.pose,
        };

        model.global_pose.set(global);
        model.gpose_dirty.set(false);
        global
    }

    /// Transform a pose from the model's body frame into world coordinates.
    #[must_use]
    pub fn local_to_global(&self, id: ModelId, pose: &Pose) -> Pose {
        self.global_pose(id)
            .compose(&self.model_ref(id).geom.pose)
            .compose(pose)
    }

    /// Transform a pose from world coordinates into the model's frame.
    #[must_use]
    pub fn global_to_local(&self, id: ModelId, pose: &Pose) -> Pose {
        self.global_pose(id).to_local(pose)
    }

    /// Set the model's local pose.
    ///
    /// When the pose differs from the current one, the model and its
    /// descendants are unmapped, moved, marked dirty, and remapped. The
    /// pose change callback fires even when the pose is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if any pose component is not finite.
    pub fn set_pose(&mut self, id: ModelId, pose: Pose) {
        assert!(pose.is_finite(), "model pose must be finite: {pose:?}");

        if pose != self.model_ref(id).pose {
            self.unmap_subtree(id);
            self.model_mut(id).pose = pose.normalized();
            self.mark_redraw(id);
            self.mark_dirty_subtree(id);
            self.map_subtree(id);
        }

        // A model change is registered even if the pose didn't actually
        // change.
        self.fire(id, ChangeKey::Pose);
    }

    /// Set the model's pose in world coordinates.
    pub fn set_global_pose(&mut self, id: ModelId, gpose: Pose) {
        match self.model_ref(id).parent {
            None => self.set_pose(id, gpose),
            Some(parent_id) => {
                let mut frame = self.global_pose(parent_id);
                frame.z += self.model_ref(parent_id).geom.size.z;
                let local = frame.to_local(&gpose);
                self.set_pose(id, local);
            }
        }
    }

    /// Add a component-wise delta to the model's local pose.
    pub fn add_to_pose(&mut self, id: ModelId, delta: &Pose) {
        if delta.x != 0.0 || delta.y != 0.0 || delta.z != 0.0 || delta.a != 0.0 {
            let pose = self.model_ref(id).pose;
            self.set_pose(
                id,
                Pose::new(
                    pose.x + delta.x,
                    pose.y + delta.y,
                    pose.z + delta.z,
                    pose.a + delta.a,
                ),
            );
        }
    }

    /// The model's velocity expressed in the world frame.
    #[must_use]
    pub fn global_velocity(&self, id: ModelId) -> Velocity {
        let gpose = self.global_pose(id);
        let (sin, cos) = gpose.a.sin_cos();
        let v = self.model_ref(id).velocity;
        Velocity::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos, v.z, v.a)
    }

    /// Set the model's velocity from a world-frame value.
    pub fn set_global_velocity(&mut self, id: ModelId, gv: &Velocity) {
        let gpose = self.global_pose(id);
        let (sin, cos) = gpose.a.sin_cos();
        self.set_velocity(
            id,
            Velocity::new(gv.x * cos + gv.y * sin, -gv.x * sin + gv.y * cos, gv.z, gv.a),
        );
    }

    // ---- geometry and body ----------------------------------------------

    /// Set the model's bounding geometry, rescaling its body to fit and
    /// refreshing the subtree (children's heights depend on ancestor
    /// sizes).
    pub fn set_geom(&mut self, id: ModelId, geom: Geom) {
        self.unmap_subtree(id);
        {
            let model = self.model_mut(id);
            model.geom = geom;
            Block::scale_to_fit(&mut model.blocks, &geom.size);
        }
        self.mark_dirty_subtree(id);
        self.mark_redraw(id);
        self.map_subtree(id);
        self.fire(id, ChangeKey::Geom);
    }

    /// Append a block to the model's body and map it.
    ///
    /// # Panics
    ///
    /// Panics if fewer than three vertices are given.
    pub fn add_block(
        &mut self,
        id: ModelId,
        points: &[Point2<f64>],
        zmin: f64,
        zmax: f64,
        color: Color,
        inherit_color: bool,
    ) {
        let origin = self.body_frame(id);
        let Self { models, index, .. } = self;
        let Some(model) = models.get_mut(&id) else {
            panic!("no model {id} in this world");
        };
        let mut block = Block::new(points, zmin, zmax, color, inherit_color);
        let block_index = u32::try_from(model.blocks.len()).unwrap_or(u32::MAX);
        block.map(
            &origin,
            index,
            BlockRef {
                model: id,
                block: block_index,
            },
        );
        model.blocks.push(block);
        self.mark_redraw(id);
    }

    /// Append an axis-aligned rectangle block spanning z in [0, 1],
    /// inheriting the model's color.
    pub fn add_block_rect(&mut self, id: ModelId, x: f64, y: f64, width: f64, height: f64) {
        let points = [
            Point2::new(x, y),
            Point2::new(x + width, y),
            Point2::new(x + width, y + height),
            Point2::new(x, y + height),
        ];
        self.add_block(id, &points, 0.0, 1.0, Color::BLACK, true);
    }

    /// Remove every block from the model's body.
    pub fn clear_blocks(&mut self, id: ModelId) {
        self.unmap_model(id);
        self.model_mut(id).blocks.clear();
        self.mark_redraw(id);
    }

    // ---- attributes -----------------------------------------------------

    /// Set the model's velocity, maintaining the velocity-list invariant.
    ///
    /// # Panics
    ///
    /// Panics if any component is not finite.
    pub fn set_velocity(&mut self, id: ModelId, velocity: Velocity) {
        assert!(
            velocity.is_finite(),
            "model velocity must be finite: {velocity:?}"
        );

        let was_listed = self.model_ref(id).on_velocity_list;
        let nonzero = !velocity.is_zero();
        self.model_mut(id).velocity = velocity;

        if nonzero && !was_listed {
            self.model_mut(id).on_velocity_list = true;
            self.velocity_list.push(id);
        } else if !nonzero && was_listed {
            self.model_mut(id).on_velocity_list = false;
            self.velocity_list.retain(|m| *m != id);
        }

        self.fire(id, ChangeKey::Velocity);
    }

    /// Set the stall flag.
    pub fn set_stall(&mut self, id: ModelId, stall: bool) {
        self.set_and_fire(id, ChangeKey::Stall, |m| m.stall = stall);
    }

    /// Set the model's color.
    pub fn set_color(&mut self, id: ModelId, color: Color) {
        self.set_and_fire(id, ChangeKey::Color, |m| m.color = color);
        self.mark_redraw(id);
    }

    /// Set visibility to collision testing.
    pub fn set_obstacle_return(&mut self, id: ModelId, v: Visibility) {
        self.set_and_fire(id, ChangeKey::ObstacleReturn, |m| m.obstacle_return = v);
    }

    /// Set visibility to ranger sensors.
    pub fn set_ranger_return(&mut self, id: ModelId, v: Visibility) {
        self.set_and_fire(id, ChangeKey::RangerReturn, |m| m.ranger_return = v);
    }

    /// Set visibility to blob finders.
    pub fn set_blob_return(&mut self, id: ModelId, v: Visibility) {
        self.set_and_fire(id, ChangeKey::BlobReturn, |m| m.blob_return = v);
    }

    /// Set visibility to laser sensors.
    pub fn set_laser_return(&mut self, id: ModelId, v: Visibility) {
        self.set_and_fire(id, ChangeKey::LaserReturn, |m| m.laser_return = v);
    }

    /// Set whether a gripper can seize this model.
    pub fn set_gripper_return(&mut self, id: ModelId, grippable: bool) {
        self.set_and_fire(id, ChangeKey::GripperReturn, |m| m.gripper_return = grippable);
    }

    /// Set the fiducial identity (0 disables).
    pub fn set_fiducial_return(&mut self, id: ModelId, fiducial: i32) {
        self.set_and_fire(id, ChangeKey::FiducialReturn, |m| m.fiducial_return = fiducial);
    }

    /// Set the fiducial key.
    pub fn set_fiducial_key(&mut self, id: ModelId, key: i32) {
        self.set_and_fire(id, ChangeKey::FiducialKey, |m| m.fiducial_key = key);
    }

    /// Set the power draw in watts.
    pub fn set_watts(&mut self, id: ModelId, watts: f64) {
        self.set_and_fire(id, ChangeKey::Watts, |m| m.watts = watts);
    }

    /// Set the preferred rasterization resolution in meters per pixel.
    pub fn set_map_resolution(&mut self, id: ModelId, resolution: f64) {
        self.set_and_fire(id, ChangeKey::MapResolution, |m| m.map_resolution = resolution);
    }

    /// Set the GUI nose flag.
    pub fn set_gui_nose(&mut self, id: ModelId, nose: bool) {
        self.set_and_fire(id, ChangeKey::GuiNose, |m| m.gui.nose = nose);
    }

    /// Set the GUI grid flag.
    pub fn set_gui_grid(&mut self, id: ModelId, grid: bool) {
        self.set_and_fire(id, ChangeKey::GuiGrid, |m| m.gui.grid = grid);
    }

    /// Set the GUI outline flag.
    pub fn set_gui_outline(&mut self, id: ModelId, outline: bool) {
        self.set_and_fire(id, ChangeKey::GuiOutline, |m| m.gui.outline = outline);
    }

    /// Set the GUI move mask.
    pub fn set_gui_movemask(&mut self, id: ModelId, movemask: u32) {
        self.set_and_fire(id, ChangeKey::GuiMoveMask, |m| m.gui.movemask = movemask);
    }

    /// Suspend or resume pose updates for the model.
    pub fn set_disabled(&mut self, id: ModelId, disabled: bool) {
        self.model_mut(id).disabled = disabled;
    }

    /// Set the model's update interval in microseconds.
    pub fn set_update_interval(&mut self, id: ModelId, interval: u64) {
        self.model_mut(id).interval = interval;
    }

    /// Install the model's lifecycle and update hooks.
    pub fn set_hooks(&mut self, id: ModelId, hooks: ModelHooks) {
        self.model_mut(id).hooks = hooks;
    }

    /// Register a change callback on a model.
    pub fn add_callback(&mut self, id: ModelId, key: ChangeKey, callback: CbChange) -> CallbackId {
        self.model_mut(id).callbacks.register(key, callback)
    }

    /// Remove a change callback by its registration id.
    pub fn remove_callback(&mut self, id: ModelId, key: ChangeKey, callback: CallbackId) -> bool {
        self.model_mut(id).callbacks.remove(key, callback)
    }

    /// Acknowledge a model's redraw request (for external renderers).
    pub fn clear_redraw(&mut self, id: ModelId) {
        self.model_mut(id).needs_redraw = false;
    }

    /// Re-pose the model randomly inside the given rectangle until it sits
    /// in free space.
    ///
    /// # Panics
    ///
    /// Panics if no collision-free pose is found in a large number of
    /// attempts.
    pub fn place_in_free_space(
        &mut self,
        id: ModelId,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
    ) {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            if self.test_collision(id, &Pose::identity()).is_none() {
                return;
            }
            let pose = Pose::new(
                rng.gen_range(xmin..xmax),
                rng.gen_range(ymin..ymax),
                0.0,
                rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI),
            );
            self.set_pose(id, pose);
        }
        panic!("no free space found in [{xmin}, {xmax}] x [{ymin}, {ymax}]");
    }

    // ---- internals ------------------------------------------------------

    pub(crate) fn model_ref(&self, id: ModelId) -> &Model {
        match self.models.get(&id) {
            Some(model) => model,
            None => panic!("no model {id} in this world"),
        }
    }

    pub(crate) fn model_mut(&mut self, id: ModelId) -> &mut Model {
        match self.models.get_mut(&id) {
            Some(model) => model,
            None => panic!("no model {id} in this world"),
        }
    }

    /// The ids of a model and all its descendants, preorder.
    pub(crate) fn subtree(&self, id: ModelId) -> Vec<ModelId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            out.extend(self.model_ref(out[i]).children.iter().copied());
            i += 1;
        }
        out
    }

    /// Fire the change callbacks registered for `key` on a model.
    pub(crate) fn fire(&self, id: ModelId, key: ChangeKey) {
        let model = self.model_ref(id);
        model.registry().fire(key, model);
    }

    fn set_and_fire(&mut self, id: ModelId, key: ChangeKey, mutate: impl FnOnce(&mut Model)) {
        mutate(self.model_mut(id));
        self.fire(id, key);
    }

    /// The model's body frame: its global pose composed with its geometry
    /// offset. Block vertices are expressed in this frame.
    pub(crate) fn body_frame(&self, id: ModelId) -> Pose {
        self.global_pose(id).compose(&self.model_ref(id).geom.pose)
    }

    /// Rasterize every block of a model into the index.
    ///
    /// The engine pairs mapping with unmapping around every pose change;
    /// external callers taking a model out of the index must re-map it
    /// before the next tick.
    pub fn map_model(&mut self, id: ModelId) {
        let origin = self.body_frame(id);
        let Self { models, index, .. } = self;
        let Some(model) = models.get_mut(&id) else {
            panic!("no model {id} in this world");
        };
        for (i, block) in model.blocks.iter_mut().enumerate() {
            block.map(
                &origin,
                index,
                BlockRef {
                    model: id,
                    block: u32::try_from(i).unwrap_or(u32::MAX),
                },
            );
        }
    }

    /// Remove every index entry of a model's blocks. Idempotent.
    pub fn unmap_model(&mut self, id: ModelId) {
        let Self { models, index, .. } = self;
        let Some(model) = models.get_mut(&id) else {
            panic!("no model {id} in this world");
        };
        for (i, block) in model.blocks.iter_mut().enumerate() {
            block.unmap(
                index,
                BlockRef {
                    model: id,
                    block: u32::try_from(i).unwrap_or(u32::MAX),
                },
            );
        }
    }

    pub(crate) fn map_subtree(&mut self, id: ModelId) {
        for sub_id in self.subtree(id) {
            self.map_model(sub_id);
        }
    }

    pub(crate) fn unmap_subtree(&mut self, id: ModelId) {
        for sub_id in self.subtree(id) {
            self.unmap_model(sub_id);
        }
    }

    /// Invalidate the cached global pose of a model and its descendants.
    pub(crate) fn mark_dirty_subtree(&self, id: ModelId) {
        for sub_id in self.subtree(id) {
            self.model_ref(sub_id).gpose_dirty.set(true);
        }
    }

    /// Flag a model and its ancestors for redraw.
    fn mark_redraw(&mut self, id: ModelId) {
        let mut current = Some(id);
        while let Some(c) = current {
            let model = self.model_mut(c);
            model.needs_redraw = true;
            current = model.parent;
        }
    }
}
