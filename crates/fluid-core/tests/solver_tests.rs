use fluid_core::config::{FluidConfig, InteractionInput, Obstacle, SimLimits};
use fluid_core::error::SimError;
use fluid_core::solver::FluidSim;
use fluid_core::spawn::{SpawnRegion, SpawnSettings};
use glam::Vec3;

fn small_spawn() -> SpawnSettings {
    SpawnSettings {
        regions: vec![SpawnRegion {
            centre: Vec3::new(-1.0, 0.0, 0.0),
            size: Vec3::splat(1.25),
        }],
        density: 512.0,
        ..SpawnSettings::default()
    }
}

fn small_sim() -> FluidSim {
    FluidSim::new(FluidConfig::default(), &small_spawn()).unwrap()
}

fn assert_contained(sim: &FluidSim) {
    let half = sim.config().half_bounds();
    for (i, p) in sim.positions().iter().enumerate() {
        assert!(p.is_finite(), "particle {} is not finite: {:?}", i, p);
        assert!(
            p.abs().cmple(half + Vec3::splat(1e-4)).all(),
            "particle {} escaped: {:?}",
            i,
            p
        );
    }
    for (i, v) in sim.velocities().iter().enumerate() {
        assert!(v.is_finite(), "velocity {} is not finite: {:?}", i, v);
    }
}

#[test]
fn test_spawn_count() {
    let sim = small_sim();
    assert_eq!(sim.particle_count(), 1000);
    assert_eq!(sim.positions().len(), 1000);
    assert_eq!(sim.spatial_index().particle_count(), 1000);
}

#[test]
fn test_frame_time_is_capped() {
    let mut sim = small_sim();
    let stats = sim.run_frame(1.0);
    assert!((stats.frame_time - 1.0 / 60.0).abs() < 1e-7);
    assert_eq!(stats.sub_steps, 3);
    assert!((stats.step_dt - 1.0 / 180.0).abs() < 1e-7);
    assert_eq!(stats.particle_count, 1000);
    assert!(stats.max_cell_occupancy > 0);
    assert_eq!(sim.last_frame(), stats);
}

#[test]
fn test_uncapped_and_scaled_frames() {
    let config = FluidConfig {
        max_timestep_fps: 0.0,
        time_scale: 0.5,
        iterations_per_frame: 2,
        ..FluidConfig::default()
    };
    let mut sim = FluidSim::new(config, &small_spawn()).unwrap();
    let stats = sim.run_frame(0.1);
    assert!((stats.frame_time - 0.05).abs() < 1e-7);
    assert!((stats.step_dt - 0.025).abs() < 1e-7);
    assert_eq!(stats.sub_steps, 2);
}

#[test]
fn test_paused_frame_changes_nothing() {
    let mut sim = FluidSim::new(
        FluidConfig {
            time_scale: 0.0,
            ..FluidConfig::default()
        },
        &small_spawn(),
    )
    .unwrap();
    let before = sim.positions().to_vec();
    let stats = sim.run_frame(1.0 / 60.0);
    assert_eq!(stats.sub_steps, 0);
    assert_eq!(sim.positions(), &before[..]);

    let stats = sim.run_frame(-1.0);
    assert_eq!(stats.sub_steps, 0);
    assert_eq!(sim.positions(), &before[..]);
}

#[test]
fn test_fluid_falls_and_stays_in_bounds() {
    let mut sim = small_sim();
    let mean_y = |sim: &FluidSim| sim.positions().iter().map(|p| p.y).sum::<f32>() / sim.particle_count() as f32;
    let start = mean_y(&sim);

    for _ in 0..40 {
        sim.run_frame(1.0 / 60.0);
        assert_contained(&sim);
    }

    assert!(mean_y(&sim) < start, "fluid should fall under gravity");
    for d in sim.densities() {
        assert!(d.density > 0.0 && d.near > 0.0);
    }
}

#[test]
fn test_obstacles_stay_stable() {
    for obstacle in [
        Obstacle::Sphere {
            centre: Vec3::new(-1.0, -1.0, 0.0),
            radius: 0.6,
        },
        Obstacle::Box {
            centre: Vec3::new(-1.0, -1.2, 0.0),
            size: Vec3::new(1.0, 0.5, 1.0),
            rotation: Vec3::new(0.0, 0.0, 20.0),
        },
    ] {
        let config = FluidConfig {
            obstacle,
            ..FluidConfig::default()
        };
        let mut sim = FluidSim::new(config, &small_spawn()).unwrap();
        for _ in 0..20 {
            sim.run_frame(1.0 / 60.0);
        }
        assert_contained(&sim);
    }
}

#[test]
fn test_interaction_pulls_fluid() {
    let config = FluidConfig {
        gravity: 0.0,
        ..FluidConfig::default()
    };
    let mut sim = FluidSim::new(config, &small_spawn()).unwrap();
    let point = Vec3::new(0.0, 0.0, 0.0);
    let mean_dist = |sim: &FluidSim| {
        sim.positions().iter().map(|p| p.distance(point)).sum::<f32>() / sim.particle_count() as f32
    };
    let start = mean_dist(&sim);

    sim.interaction = InteractionInput {
        point,
        pull: true,
        push: false,
    };
    for _ in 0..10 {
        sim.run_frame(1.0 / 60.0);
    }
    assert!(mean_dist(&sim) < start);
}

#[test]
fn test_update_config_applies_soft_parameters() {
    let mut sim = small_sim();
    let config = FluidConfig {
        gravity: -3.0,
        collision_damping: 4.0,
        ..FluidConfig::default()
    };
    sim.update_config(config).unwrap();
    assert_eq!(sim.config().gravity, -3.0);
    assert_eq!(sim.config().collision_damping, 1.0);
}

#[test]
fn test_non_finite_interaction_strength_is_ignored() {
    let mut sim = small_sim();
    let config = FluidConfig {
        interaction_strength: f32::NAN,
        ..FluidConfig::default()
    };
    sim.update_config(config).unwrap();
    assert_eq!(sim.config().interaction_strength, 0.0);

    sim.interaction = InteractionInput {
        point: Vec3::new(-1.0, 0.0, 0.0),
        pull: true,
        push: false,
    };
    sim.run_frame(1.0 / 60.0);
    assert_contained(&sim);
}

#[test]
fn test_update_config_rejects_layout_change() {
    let mut sim = small_sim();
    let config = FluidConfig {
        smoothing_radius: 0.3,
        ..FluidConfig::default()
    };
    assert_eq!(sim.update_config(config), Err(SimError::ResetRequired));
    assert_eq!(sim.config().smoothing_radius, 0.2);

    let config = FluidConfig {
        bounds_size: Vec3::new(6.0, 4.0, 4.0),
        ..FluidConfig::default()
    };
    assert_eq!(sim.update_config(config), Err(SimError::ResetRequired));
}

#[test]
fn test_reset_rebuilds_layout() {
    let mut sim = small_sim();
    sim.run_frame(1.0 / 60.0);

    let config = FluidConfig {
        smoothing_radius: 0.5,
        bounds_size: Vec3::new(5.0, 5.0, 5.0),
        ..FluidConfig::default()
    };
    let spawn = SpawnSettings {
        regions: vec![SpawnRegion {
            centre: Vec3::ZERO,
            size: Vec3::splat(0.5),
        }],
        density: 1000.0,
        ..SpawnSettings::default()
    };
    sim.reset(config, &spawn).unwrap();

    assert_eq!(sim.particle_count(), 125);
    assert_eq!(sim.kernels().radius, 0.5);
    assert_eq!(sim.spatial_index().layout().resolution(), glam::UVec3::splat(10));
    assert_eq!(sim.last_frame().sub_steps, 0);
    sim.run_frame(1.0 / 60.0);
    assert_contained(&sim);
}

#[test]
fn test_failed_reset_keeps_state() {
    let mut sim = small_sim();
    let before = sim.positions().to_vec();
    let config = FluidConfig {
        smoothing_radius: -1.0,
        ..FluidConfig::default()
    };
    assert_eq!(
        sim.reset(config, &small_spawn()).err(),
        Some(SimError::InvalidSmoothingRadius(-1.0))
    );
    assert_eq!(sim.positions(), &before[..]);
    assert_eq!(sim.config().smoothing_radius, 0.2);
}

#[test]
fn test_reset_is_deterministic() {
    let mut a = small_sim();
    let b = small_sim();
    a.run_frame(1.0 / 60.0);
    a.reset(FluidConfig::default(), &small_spawn()).unwrap();
    assert_eq!(a.positions(), b.positions());
}

#[test]
fn test_buffer_limits_reject_oversized_spawn() {
    let limits = SimLimits { max_buffer_bytes: 4096 };
    let err = FluidSim::with_limits(FluidConfig::default(), &small_spawn(), limits).err();
    assert!(matches!(err, Some(SimError::BufferTooLarge { .. })), "{:?}", err);
}

#[test]
fn test_invalid_config_rejected() {
    let config = FluidConfig {
        bounds_size: Vec3::new(1.0, 0.0, 1.0),
        ..FluidConfig::default()
    };
    assert!(matches!(
        FluidSim::new(config, &small_spawn()).err(),
        Some(SimError::InvalidBounds(_))
    ));

    let config = FluidConfig {
        smoothing_radius: 0.001,
        bounds_size: Vec3::splat(100.0),
        ..FluidConfig::default()
    };
    assert!(matches!(
        FluidSim::new(config, &small_spawn()).err(),
        Some(SimError::GridTooLarge { .. })
    ));
}

#[test]
fn test_from_particles_checks_lengths() {
    let err = FluidSim::from_particles(FluidConfig::default(), vec![Vec3::ZERO; 3], vec![Vec3::ZERO; 2]).err();
    assert_eq!(
        err,
        Some(SimError::ParticleCountMismatch {
            positions: 3,
            velocities: 2
        })
    );
}

#[test]
fn test_empty_simulation_steps() {
    let mut sim = FluidSim::from_particles(FluidConfig::default(), Vec::new(), Vec::new()).unwrap();
    let stats = sim.run_frame(1.0 / 60.0);
    assert_eq!(stats.particle_count, 0);
    assert_eq!(stats.max_cell_occupancy, 0);
    assert!(sim.pick(Vec3::ZERO, Vec3::X, 0.1).is_none());
}

#[test]
fn test_pick_through_sim() {
    let positions = vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0)];
    let sim = FluidSim::from_particles(FluidConfig::default(), positions, vec![Vec3::ZERO; 2]).unwrap();
    let hit = sim.pick(Vec3::new(3.0, 0.0, 0.0), Vec3::NEG_X, 0.05).unwrap();
    assert_eq!(hit.index, 0);
    assert_eq!(hit.position, Vec3::new(1.0, 0.0, 0.0));
}
