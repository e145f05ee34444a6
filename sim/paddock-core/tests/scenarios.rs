//! End-to-end scenarios exercising the engine through its public API.

use approx::assert_relative_eq;
use paddock_core::{
    Block, CbWorld, Geom, Model, ModelHooks, Pose, Size, Velocity, World, WorldConfig,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn any_block(_: &Model, _: &Block, _: &Model) -> bool {
    true
}

/// Hierarchical pose composition: a child rides its parent's frame and
/// sits on top of its parent's height.
#[test]
fn hierarchical_pose_composition() {
    let mut world = World::new();

    let parent = world.create_model(None, "position");
    world.set_geom(parent, Geom::sized(Size::new(0.5, 0.5, 0.2)));
    world.set_pose(parent, Pose::new(1.0, 0.0, 0.0, std::f64::consts::FRAC_PI_2));

    let child = world.create_model(Some(parent), "laser");
    world.set_pose(child, Pose::new(1.0, 0.0, 0.0, 0.0));

    let global = world.global_pose(child);
    assert_relative_eq!(global.x, 1.0, epsilon = 1e-9);
    assert_relative_eq!(global.y, 1.0, epsilon = 1e-9);
    assert_relative_eq!(global.z, 0.2, epsilon = 1e-9);
    assert_relative_eq!(global.a, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);

    // Moving the parent carries the child with it.
    world.set_pose(parent, Pose::new(2.0, 0.0, 0.0, 0.0));
    let moved = world.global_pose(child);
    assert_relative_eq!(moved.x, 3.0, epsilon = 1e-9);
    assert_relative_eq!(moved.y, 0.0, epsilon = 1e-9);
}

/// Stall on collision: a fast mover stalls in place, a slow one advances.
#[test]
fn stall_on_collision() {
    let mut world =
        World::with_config(WorldConfig::named("arena").with_interval_sim(1_000_000)).unwrap();

    let a = world.create_model(None, "position");
    world.set_geom(a, Geom::sized(Size::new(1.0, 1.0, 1.0)));
    let b = world.create_model(None, "box");
    world.set_geom(b, Geom::sized(Size::new(1.0, 1.0, 1.0)));
    world.set_pose(b, Pose::from_xy(2.0, 0.0));

    // 10 m/s over a one-second tick would jump clean across b.
    world.set_velocity(a, Velocity::linear(10.0, 0.0));
    world.step();
    {
        let model = world.model(a).unwrap();
        assert!(model.stall());
        assert_relative_eq!(model.pose().x, 0.0);
    }

    // At 0.5 m/s the same tick is an unobstructed half-meter.
    world.set_velocity(a, Velocity::linear(0.5, 0.0));
    world.step();
    {
        let model = world.model(a).unwrap();
        assert!(!model.stall());
        assert_relative_eq!(model.pose().x, 0.5, epsilon = 1e-9);
    }
}

/// Raytrace across a nearly empty kilometer: the hit lands, and the tier
/// skip counters show the walk touched far fewer pixels than it crossed.
#[test]
fn raytrace_skips_empty_regions() {
    let mut world = World::new(); // 50 px/m
    let sensor = world.create_model(None, "ranger");
    world.set_geom(sensor, Geom::sized(Size::new(0.2, 0.2, 0.5)));
    let target = world.create_model(None, "box");
    world.set_geom(target, Geom::sized(Size::new(1.0, 1.0, 1.0)));
    world.set_pose(target, Pose::from_xy(900.0, 0.0));

    let sample = world.raytrace_bearing(sensor, 0.0, 1000.0, &any_block, true);
    assert_eq!(sample.block.map(|b| b.model), Some(target));
    assert_relative_eq!(sample.range, 899.5, epsilon = 0.05);

    // Repeat the walk at the index level to read the instrumentation.
    let trace = world.spatial_index().trace(
        nalgebra::Point2::origin(),
        0.0,
        1000.0,
        |entry| entry.model == target,
    );
    assert!(trace.hit.is_some());
    let pixels_crossed = (899.5_f64 * 50.0) as u64;
    assert!(trace.pixels_visited < pixels_crossed / 100);
    assert!(trace.super_regions_skipped > 10);
}

/// Map / UnMap are exact inverses: unmapping restores the pre-map index,
/// remapping restores the mapped snapshot.
#[test]
fn map_unmap_inverse() {
    let mut world = World::new();

    // A static neighbor so the pre-map state is nonempty.
    let wall = world.create_model(None, "box");
    world.set_geom(wall, Geom::sized(Size::new(0.4, 3.0, 1.0)));
    world.set_pose(wall, Pose::from_xy(-4.0, 1.0));
    let background = world.spatial_index().snapshot();

    // An octagon at an awkward pose.
    let octagon: Vec<nalgebra::Point2<f64>> = (0..8)
        .map(|i| {
            let angle = std::f64::consts::TAU * (i as f64) / 8.0 + 0.17;
            nalgebra::Point2::new(angle.cos() * 0.83, angle.sin() * 0.83)
        })
        .collect();
    let model = world.create_model(None, "box");
    world.clear_blocks(model);
    world.set_pose(model, Pose::new(2.31, -1.07, 0.0, 0.61));
    world.add_block(
        model,
        &octagon,
        0.0,
        0.7,
        paddock_core::Color::BLUE,
        false,
    );

    let mapped = world.spatial_index().snapshot();
    assert!(mapped.len() > background.len());

    world.unmap_model(model);
    assert_eq!(world.spatial_index().snapshot(), background);

    world.map_model(model);
    assert_eq!(world.spatial_index().snapshot(), mapped);
}

/// Subscription counting: startup runs on the first subscribe only,
/// shutdown on the last unsubscribe.
#[test]
fn subscription_counting() {
    let mut world = World::new();
    let model = world.create_model(None, "laser");

    let started = Arc::new(AtomicU32::new(0));
    let stopped = Arc::new(AtomicU32::new(0));
    let on_start = Arc::clone(&started);
    let on_stop = Arc::clone(&stopped);
    world.set_hooks(
        model,
        ModelHooks {
            startup: Some(CbWorld::from_fn(move |_, _| {
                on_start.fetch_add(1, Ordering::SeqCst);
            })),
            shutdown: Some(CbWorld::from_fn(move |_, _| {
                on_stop.fetch_add(1, Ordering::SeqCst);
            })),
            update: None,
        },
    );

    world.subscribe(model);
    world.subscribe(model);
    world.subscribe(model);
    world.unsubscribe(model);
    world.unsubscribe(model);

    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(stopped.load(Ordering::SeqCst), 0);
    assert_eq!(world.update_list(), &[model]);

    world.unsubscribe(model);
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
    assert!(world.update_list().is_empty());
}

/// Trail bounding: a long run keeps at most 100 checkpoints covering the
/// most recent 1000 ticks.
#[test]
fn trail_bounding() {
    let mut world = World::new();
    let rover = world.create_model(None, "position");
    world.set_geom(rover, Geom::sized(Size::new(0.3, 0.3, 0.3)));
    world.set_velocity(rover, Velocity::angular(0.001));

    for _ in 0..2000 {
        world.step();
    }

    let model = world.model(rover).unwrap();
    assert!(model.trail().len() <= 100);
    assert_eq!(model.trail().len(), 100);

    let oldest = model.trail().front().unwrap();
    let window = 1000 * world.config().interval_sim;
    assert!(
        oldest.time >= world.sim_time() - window,
        "oldest checkpoint {} older than the {}-tick window",
        oldest.time,
        1000
    );

    // Checkpoints are in time order.
    let times: Vec<u64> = model.trail().iter().map(|t| t.time).collect();
    let mut sorted = times.clone();
    sorted.sort_unstable();
    assert_eq!(times, sorted);
}
