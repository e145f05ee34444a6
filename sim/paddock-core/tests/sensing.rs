//! Sensor-style usage of the raytrace API and the scene visitor.

use approx::assert_relative_eq;
use paddock_core::{
    CbWorld, Geom, Model, ModelHooks, Pose, PoseStack, SceneVisitor, Size, Velocity, Visibility,
    World, WorldConfig,
};
use std::sync::{Arc, Mutex};

/// A minimal ranger: an update hook sweeping a fan and recording ranges.
#[test]
fn ranger_fan_through_update_hook() {
    let mut world =
        World::with_config(WorldConfig::named("arena").with_interval_sim(100_000)).unwrap();

    let robot = world.create_model(None, "position");
    world.set_geom(robot, Geom::sized(Size::new(0.4, 0.4, 0.3)));
    let ranger = world.create_model(Some(robot), "ranger");
    world.set_geom(ranger, Geom::sized(Size::new(0.05, 0.05, 0.05)));
    // The sensor must not see the robot that carries it.
    world.set_pose(ranger, Pose::new(0.0, 0.0, -0.3, 0.0));

    // A wall dead ahead and nothing to the sides.
    let wall = world.create_model(None, "box");
    world.set_geom(wall, Geom::sized(Size::new(0.2, 6.0, 1.0)));
    world.set_pose(wall, Pose::from_xy(4.0, 0.0));

    let readings: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&readings);
    world.set_hooks(
        ranger,
        ModelHooks {
            startup: None,
            shutdown: None,
            update: Some(CbWorld::from_fn(move |world, id| {
                let matcher = |owner: &Model, _: &paddock_core::Block, requester: &Model| {
                    !world.is_related(owner.id(), requester.id())
                        && owner.ranger_return().is_visible()
                };
                let samples = world.raytrace_fan(
                    id,
                    0.0,
                    8.0,
                    std::f64::consts::PI,
                    7,
                    &matcher,
                    true,
                );
                if let Ok(mut slot) = sink.lock() {
                    *slot = samples.iter().map(|s| s.range).collect();
                }
            })),
        },
    );

    world.subscribe(ranger);
    world.step();

    let ranges = readings.lock().unwrap().clone();
    assert_eq!(ranges.len(), 7);
    // Center ray hits the wall at ~3.9 m; the sideways extremes see nothing.
    assert_relative_eq!(ranges[3], 3.9, epsilon = 0.05);
    assert_relative_eq!(ranges[0], 8.0);
    assert_relative_eq!(ranges[6], 8.0);
    // Oblique rays reach the wall farther out than the center ray.
    assert!(ranges[2] > ranges[3]);
    assert!(ranges[4] > ranges[3]);
}

/// Visibility attributes gate what a modality perceives without touching
/// the collision behavior of other modalities.
#[test]
fn visibility_gates_are_independent() {
    let mut world = World::new();
    let sensor = world.create_model(None, "ranger");
    world.set_geom(sensor, Geom::sized(Size::new(0.1, 0.1, 0.5)));
    let ghost = world.create_model(None, "box");
    world.set_geom(ghost, Geom::sized(Size::new(1.0, 1.0, 1.0)));
    world.set_pose(ghost, Pose::from_xy(3.0, 0.0));

    // Invisible to rangers, still visible to lasers.
    world.set_ranger_return(ghost, Visibility::Invisible);

    let by_ranger = |owner: &Model, _: &paddock_core::Block, _: &Model| {
        owner.ranger_return().is_visible()
    };
    let by_laser = |owner: &Model, _: &paddock_core::Block, _: &Model| {
        owner.laser_return().is_visible()
    };

    let ranger_sample = world.raytrace_bearing(sensor, 0.0, 10.0, &by_ranger, true);
    assert!(ranger_sample.block.is_none());

    let laser_sample = world.raytrace_bearing(sensor, 0.0, 10.0, &by_laser, true);
    assert_eq!(laser_sample.block.map(|b| b.model), Some(ghost));
}

/// Fiducial-style filtering: matching keys find the landmark, mismatched
/// keys do not.
#[test]
fn fiducial_key_matching() {
    let mut world = World::new();
    let finder = world.create_model(None, "fiducialfinder");
    world.set_geom(finder, Geom::sized(Size::new(0.1, 0.1, 0.5)));
    let landmark = world.create_model(None, "box");
    world.set_geom(landmark, Geom::sized(Size::new(0.5, 0.5, 1.0)));
    world.set_pose(landmark, Pose::from_xy(2.0, 0.0));
    world.set_fiducial_return(landmark, 7);
    world.set_fiducial_key(landmark, 1);

    let tuned = |owner: &Model, _: &paddock_core::Block, _: &Model| {
        owner.fiducial_return() != 0 && owner.fiducial_key() == 1
    };
    let mistuned = |owner: &Model, _: &paddock_core::Block, _: &Model| {
        owner.fiducial_return() != 0 && owner.fiducial_key() == 2
    };

    let seen = world.raytrace_bearing(finder, 0.0, 10.0, &tuned, true);
    assert_eq!(seen.block.map(|b| b.model), Some(landmark));
    let unseen = world.raytrace_bearing(finder, 0.0, 10.0, &mistuned, true);
    assert!(unseen.block.is_none());
}

struct FrameCollector {
    frames: Vec<(String, Pose)>,
}

impl SceneVisitor for FrameCollector {
    fn model(&mut self, model: &Model, frame: &Pose) {
        self.frames.push((model.token().to_owned(), *frame));
    }
}

/// The scene visitor composes the same frames the pose cache reports, and
/// visits parents before children.
#[test]
fn scene_visitor_frames_match_global_poses() {
    let mut world = World::new();
    let rover = world.create_model(None, "position");
    world.set_geom(rover, Geom::sized(Size::new(0.5, 0.5, 0.25)));
    world.set_pose(rover, Pose::new(1.0, -2.0, 0.0, 0.9));
    let mast = world.create_model(Some(rover), "mast");
    world.set_pose(mast, Pose::new(0.1, 0.0, 0.0, 0.0));
    let lone = world.create_model(None, "box");
    world.set_pose(lone, Pose::from_xy(-3.0, 4.0));

    let mut collector = FrameCollector { frames: Vec::new() };
    world.visit_scene(&mut collector);

    assert_eq!(collector.frames.len(), 3);
    assert_eq!(collector.frames[0].0, "world.position:0");
    assert_eq!(collector.frames[1].0, "world.position:0.mast:0");
    assert_eq!(collector.frames[2].0, "world.box:0");

    for (token, frame) in &collector.frames {
        let id = world.model_by_token(token).unwrap();
        let global = world.global_pose(id);
        assert_relative_eq!(frame.x, global.x, epsilon = 1e-9);
        assert_relative_eq!(frame.y, global.y, epsilon = 1e-9);
        assert_relative_eq!(frame.z, global.z, epsilon = 1e-9);
        assert_relative_eq!(frame.a, global.a, epsilon = 1e-9);
    }

    // An explicit stack is balanced after arbitrary use.
    let mut stack = PoseStack::new();
    stack.push();
    stack.shift(&Pose::from_xy(1.0, 1.0));
    stack.pop();
    assert_eq!(stack.depth(), 1);
}

/// Redraw flags propagate to ancestors and are cleared by the renderer.
#[test]
fn redraw_flags_for_renderers() {
    let mut world = World::new();
    let rover = world.create_model(None, "position");
    let mast = world.create_model(Some(rover), "mast");

    world.clear_redraw(rover);
    world.clear_redraw(mast);

    world.set_color(mast, paddock_core::Color::WHITE);
    assert!(world.model(mast).unwrap().needs_redraw());
    assert!(world.model(rover).unwrap().needs_redraw());

    world.clear_redraw(rover);
    assert!(!world.model(rover).unwrap().needs_redraw());
}

/// A moving sensor keeps observing a consistent world mid-tick: after the
/// tick, its own mapping reflects the committed pose.
#[test]
fn mover_mapping_is_consistent_after_tick() {
    let mut world =
        World::with_config(WorldConfig::named("arena").with_interval_sim(500_000)).unwrap();
    let rover = world.create_model(None, "position");
    world.set_geom(rover, Geom::sized(Size::new(0.4, 0.4, 0.4)));
    world.set_velocity(rover, Velocity::linear(1.0, 0.0));

    let observer = world.create_model(None, "ranger");
    world.set_geom(observer, Geom::sized(Size::new(0.05, 0.05, 0.5)));
    world.set_pose(observer, Pose::from_xy(0.0, -5.0));

    world.step();
    assert!(world.model(rover).unwrap().is_mapped());

    // An observer ray run after the tick sees the rover at its new spot.
    let matcher = |owner: &Model, _: &paddock_core::Block, _: &Model| {
        owner.type_name() == "position" && owner.ranger_return().is_visible()
    };
    let sample = world.raytrace_from(
        observer,
        &Pose::new(0.5, 0.0, 0.0, std::f64::consts::FRAC_PI_2),
        10.0,
        &matcher,
        false,
    );
    assert_eq!(sample.block.map(|b| b.model), Some(rover));
    assert_relative_eq!(sample.range, 4.8, epsilon = 0.05);
}
