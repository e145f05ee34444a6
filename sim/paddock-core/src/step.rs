//! The tick loop: kinematics, collision, and model updates.
//!
//! Each call to [`World::step`] advances simulated time by one interval,
//! drives the pose of every model with nonzero velocity, and runs the
//! periodic update of every subscribed model. Everything happens
//! sequentially on the calling thread; callbacks and hooks observe each
//! model's state after its mutation completes and before the next model is
//! processed.

use nalgebra::{Point2, Vector2};
use tracing::debug;

use paddock_types::{ModelId, Pose};

use crate::block::Block;
use crate::callback::ChangeKey;
use crate::model::{Model, TrailPoint, TRAIL_INTERVAL, TRAIL_LENGTH};
use crate::world::World;

/// A positive collision-test result: the first obstacle a block-edge ray
/// struck, and where.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// The model owning the struck block.
    pub model: ModelId,
    /// The global point of the strike, in meters.
    pub point: Point2<f64>,
}

impl World {
    /// Advance the simulation by one tick.
    ///
    /// Increments `sim_time` by the configured interval, then updates every
    /// model on the velocity list (in insertion order) and every model on
    /// the update list whose interval has elapsed.
    pub fn step(&mut self) {
        self.sim_time += self.config().interval_sim;
        self.updates += 1;

        for id in self.velocity_list.clone() {
            self.update_pose(id);
        }
        for id in self.update_list.clone() {
            self.update_model_if_due(id);
        }
    }

    /// Drive one model's pose from its velocity, stalling on collision.
    fn update_pose(&mut self, id: ModelId) {
        if self.model_ref(id).disabled {
            return;
        }

        if self.updates % TRAIL_INTERVAL == 0 {
            let time = self.sim_time();
            let model = self.model_mut(id);
            if model.trail.len() >= TRAIL_LENGTH {
                model.trail.pop_front();
            }
            model.trail.push_back(TrailPoint {
                pose: model.pose,
                color: model.color,
                time,
            });
        }

        let dt = self.config().interval_seconds();
        let delta = self.model_ref(id).velocity.integrate(dt);

        match self.test_collision(id, &delta) {
            Some(collision) => {
                debug!(model = %id, hit = %collision.model, "collision, stalling");
                self.set_stall(id, true);
            }
            None => {
                self.set_stall(id, false);
                let new_pose = self.model_ref(id).pose.compose(&delta);
                self.set_pose(id, new_pose);
            }
        }
    }

    /// Test whether applying `delta` to the model's pose would drive one of
    /// its block edges into an obstacle.
    ///
    /// The model is unmapped for the duration of the test so its own rays
    /// cannot strike it, and remapped before returning. Each block edge is
    /// raytraced at its displaced pose, and each vertex additionally along
    /// its displacement, so an obstacle cannot be jumped in a single large
    /// step. The test sees edge crossings only: a block entirely inside
    /// another is not reported.
    pub fn test_collision(&mut self, id: ModelId, delta: &Pose) -> Option<Collision> {
        if self.model_ref(id).blocks().is_empty() {
            return None;
        }

        self.unmap_model(id);

        let matcher = |owner: &Model, _block: &Block, requester: &Model| {
            !self.is_related(owner.id(), requester.id()) && owner.obstacle_return().is_visible()
        };

        let mut hit = None;
        let block_count = self.model_ref(id).blocks().len();
        'search: for b in 0..block_count {
            let point_count = self.model_ref(id).blocks()[b].points().len();
            for p in 0..point_count {
                let (pt1, pt2) = {
                    let points = self.model_ref(id).blocks()[b].points();
                    (points[p], points[(p + 1) % point_count])
                };

                // The edge, raytraced where the delta would put it.
                let edge = pt2 - pt1;
                let edge_range = edge.norm();
                if edge_range > 0.0 {
                    let edge_pose = Pose::new(pt1.x, pt1.y, 0.0, edge.y.atan2(edge.x));
                    let sample = self.raytrace_from(
                        id,
                        &delta.compose(&edge_pose),
                        edge_range,
                        &matcher,
                        true,
                    );
                    if let Some(block_ref) = sample.block {
                        hit = Some(Collision {
                            model: block_ref.model,
                            point: sample.point,
                        });
                        break 'search;
                    }
                }

                // The vertex, raytraced along its displacement.
                let moved = delta.compose(&Pose::new(pt1.x, pt1.y, 0.0, 0.0));
                let sweep = Vector2::new(moved.x - pt1.x, moved.y - pt1.y);
                let sweep_range = sweep.norm();
                if sweep_range > 0.0 {
                    let sweep_pose = Pose::new(pt1.x, pt1.y, 0.0, sweep.y.atan2(sweep.x));
                    let sample =
                        self.raytrace_from(id, &sweep_pose, sweep_range, &matcher, true);
                    if let Some(block_ref) = sample.block {
                        hit = Some(Collision {
                            model: block_ref.model,
                            point: sample.point,
                        });
                        break 'search;
                    }
                }
            }
        }

        self.map_model(id);
        hit
    }

    // ---- subscriptions and periodic updates -----------------------------

    /// Add a subscription to a model. The first subscription runs the
    /// startup hook and registers the model for periodic updates.
    pub fn subscribe(&mut self, id: ModelId) {
        self.model_mut(id).subs += 1;
        self.total_subs += 1;
        if self.model_ref(id).subs == 1 {
            self.startup(id);
        }
    }

    /// Drop a subscription. The last unsubscription runs the shutdown hook
    /// and deregisters the model from periodic updates.
    ///
    /// # Panics
    ///
    /// Panics on an unsubscribe without a matching subscribe.
    pub fn unsubscribe(&mut self, id: ModelId) {
        {
            let model = self.model_mut(id);
            assert!(model.subs > 0, "unsubscribe without matching subscribe");
            model.subs -= 1;
        }
        self.total_subs -= 1;
        if self.model_ref(id).subs == 0 {
            self.shutdown(id);
        }
    }

    fn startup(&mut self, id: ModelId) {
        debug!(token = %self.model_ref(id).token(), "startup");
        let hook = self.model_ref(id).hooks.startup.clone();
        if let Some(hook) = hook {
            (hook.0)(self, id);
        }
        self.update_list.push(id);
        self.fire(id, ChangeKey::Startup);
    }

    fn shutdown(&mut self, id: ModelId) {
        debug!(token = %self.model_ref(id).token(), "shutdown");
        self.update_list.retain(|m| *m != id);
        let hook = self.model_ref(id).hooks.shutdown.clone();
        if let Some(hook) = hook {
            (hook.0)(self, id);
        }
        self.fire(id, ChangeKey::Shutdown);
    }

    fn update_model_if_due(&mut self, id: ModelId) {
        let model = self.model_ref(id);
        if self.sim_time >= model.last_update + model.interval {
            self.update_model(id);
        }
    }

    /// Run a model's update immediately: its update hook, then its update
    /// callbacks, then the due-time stamp.
    pub fn update_model(&mut self, id: ModelId) {
        let hook = self.model_ref(id).hooks.update.clone();
        if let Some(hook) = hook {
            (hook.0)(self, id);
        }
        self.fire(id, ChangeKey::Update);
        self.model_mut(id).last_update = self.sim_time;
    }
}
