//! Integration tests for the headless engine.
//!
//! These drive [`Engine`] with scripted and randomised clocks against a
//! [`RecordingSurface`] and check the lifecycle guarantees end to end.

use std::collections::{HashMap, HashSet};

use mandala::prelude::*;
use mandala::{MandalaError, RetiredPlane};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn engine(config: SpawnConfig, clock: ManualClock) -> Engine<ManualClock, RecordingSurface> {
    Engine::builder()
        .with_config(config)
        .with_textures(TexturePool::procedural(6))
        .with_clock(clock)
        .with_surface(RecordingSurface::new())
        .build()
        .unwrap()
}

/// Tick times with random frame lengths between 1 ms and 200 ms, plus the
/// occasional repeated tick.
fn jittered_ticks(seed: u64, frames: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut now = 0.0f32;
    (0..frames)
        .map(|_| {
            if !rng.gen_bool(0.05) {
                now += rng.gen_range(0.001..0.2);
            }
            now
        })
        .collect()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_missing_surface_is_reported() {
    let result = Engine::builder()
        .with_textures(TexturePool::procedural(1))
        .with_clock(ManualClock::default())
        .build();
    assert!(matches!(result, Err(MandalaError::MissingCollaborator("render surface"))));
}

#[test]
fn test_empty_pool_is_reported() {
    let result = Engine::builder()
        .with_textures(TexturePool::new(Vec::new()))
        .with_clock(ManualClock::default())
        .with_surface(RecordingSurface::new())
        .build();
    assert!(matches!(result, Err(MandalaError::MissingCollaborator(_))));
}

#[test]
fn test_invalid_config_is_reported() {
    for config in [
        SpawnConfig::new().with_spawn_interval(0.0),
        SpawnConfig::new().with_spawn_interval(-1.0),
        SpawnConfig::new().with_start_radius(0.0),
    ] {
        let result = Engine::builder()
            .with_config(config)
            .with_textures(TexturePool::procedural(1))
            .with_clock(ManualClock::default())
            .with_surface(RecordingSurface::new())
            .build();
        assert!(matches!(result, Err(MandalaError::InvalidConfig(_))));
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_first_burst_scenario() {
    let mut engine = engine(SpawnConfig::default(), ManualClock::new([0.0, 0.5, 0.9]));
    let camera = OrbitCamera::default();

    let spawned: Vec<usize> = (0..3).map(|_| engine.frame(&camera).unwrap().spawned).collect();
    assert_eq!(spawned, vec![0, 0, 5]);

    let frame = engine.surface().last_frame().unwrap();
    assert_eq!(frame.len(), 5);
    let order: Vec<i32> = frame.draw_order().map(|p| p.render_priority).collect();
    assert_eq!(order, vec![-4, -3, -2, -1, 0]);
    for view in &frame.planes {
        assert!((view.uniforms.time - 0.1).abs() < 1e-4);
        assert_eq!(view.position.y, -5.0);
    }
}

#[test]
fn test_textures_wrap_around_pool() {
    let config = SpawnConfig::new().with_branches(4);
    let mut engine = engine(config, ManualClock::new([0.0, 1.0, 2.0, 3.0]));
    let camera = OrbitCamera::default();
    for _ in 0..4 {
        engine.frame(&camera).unwrap();
    }

    // 12 planes over a pool of 6: ids start at 1 and wrap
    let ids: Vec<u32> = engine.lifecycle().live().iter().map(|p| p.texture().id().0).collect();
    let expected: Vec<u32> = (1..=12).map(|k| k % 6).collect();
    assert_eq!(ids, expected);
}

// ============================================================================
// Properties under jittered clocks
// ============================================================================

#[test]
fn test_priorities_unique_and_decreasing() {
    for seed in 0..8 {
        let ticks = jittered_ticks(seed, 600);
        let mut engine = engine(SpawnConfig::default(), ManualClock::new(ticks));
        let camera = OrbitCamera::default();
        let mut seen = HashSet::new();

        for _ in 0..600 {
            engine.frame(&camera).unwrap();
            let live = engine.lifecycle().live();
            for pair in live.windows(2) {
                assert!(pair[0].render_priority() > pair[1].render_priority());
            }
            for plane in live {
                seen.insert(plane.render_priority());
            }
        }
        assert_eq!(seen.len() as u64, engine.lifecycle().total_spawned());
    }
}

#[test]
fn test_every_retired_plane_released_once() {
    for seed in 0..8 {
        let ticks = jittered_ticks(seed, 1500);
        let mut engine = engine(SpawnConfig::default(), ManualClock::new(ticks));
        let camera = OrbitCamera::default();
        let mut retired: Vec<RetiredPlane> = Vec::new();

        for _ in 0..1500 {
            let report = engine.frame(&camera).unwrap();
            let threshold = engine.lifecycle().config().removal_threshold;
            for plane in &report.retired {
                assert!(plane.radius <= threshold);
            }
            retired.extend(report.retired);
            for plane in engine.lifecycle().live() {
                assert!(plane.radius() > threshold);
            }

            // Released planes never show up again
            let released: HashSet<i32> = engine.surface().released.iter().copied().collect();
            let frame = engine.surface().last_frame().unwrap();
            assert!(frame.planes.iter().all(|v| !released.contains(&v.render_priority)));
        }

        assert!(!retired.is_empty());
        let released = &engine.surface().released;
        let expected: Vec<i32> = retired.iter().map(|r| r.render_priority).collect();
        assert_eq!(released, &expected);
        let unique: HashSet<i32> = released.iter().copied().collect();
        assert_eq!(unique.len(), released.len(), "a plane was released twice");
    }
}

#[test]
fn test_opacity_and_age_monotone_per_plane() {
    let ticks = jittered_ticks(42, 2000);
    let mut engine = engine(SpawnConfig::default(), ManualClock::new(ticks));
    let camera = OrbitCamera::default();
    let max_opacity = engine.lifecycle().config().max_opacity;
    let mut last: HashMap<i32, (f32, f32)> = HashMap::new();

    for _ in 0..2000 {
        let report = engine.frame(&camera).unwrap();
        for plane in engine.lifecycle().live() {
            assert!(plane.opacity() <= max_opacity);
            if let Some(&(age, opacity)) = last.get(&plane.render_priority()) {
                if report.advanced {
                    assert!(plane.age() > age);
                }
                assert!(plane.opacity() >= opacity);
            }
            last.insert(plane.render_priority(), (plane.age(), plane.opacity()));
        }
    }
}

#[test]
fn test_at_most_one_burst_per_frame() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut now = 0.0f32;
    let ticks: Vec<f32> = (0..300)
        .map(|_| {
            // Some frames stall for several spawn intervals
            now += if rng.gen_bool(0.1) { rng.gen_range(2.0..10.0) } else { 0.016 };
            now
        })
        .collect();

    let config = SpawnConfig::default();
    let branches = config.branches as usize;
    let mut engine = engine(config, ManualClock::new(ticks));
    let camera = OrbitCamera::default();
    for _ in 0..300 {
        let spawned = engine.frame(&camera).unwrap().spawned;
        assert!(spawned == 0 || spawned == branches);
    }
}
