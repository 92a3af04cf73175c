// End-to-end behavior of a whole simulation: grouping, preset switches,
// guards and the parallel read phase.

use glam::Vec3;

use flocking::{
    BoidSettings, ChangePolicy, FlockError, LayerMask, Obstacle, Preset, Simulation, SimulationParams, TickId,
};

const DT: f32 = 0.02;

fn empty(parallel: bool) -> Simulation {
    let params = SimulationParams {
        num_boids: 0,
        enable_parallel: parallel,
        seed: Some(1),
        ..Default::default()
    };
    Simulation::new(&params).unwrap()
}

#[test]
fn one_pair_and_singletons() {
    let mut sim = empty(false);
    sim.spawn_boid(Vec3::ZERO, Preset::Fish);
    sim.spawn_boid(Vec3::new(0.2, 0.0, 0.0), Preset::Fish);
    for i in 2..10 {
        sim.spawn_boid(Vec3::new(i as f32 * 5.0, 0.0, 0.0), Preset::Fish);
    }

    sim.step(DT).unwrap();

    assert_eq!(sim.boid(0).unwrap().neighbor_indices(), &[1]);
    assert_eq!(sim.boid(1).unwrap().neighbor_indices(), &[0]);

    let groups = sim.compute_groups().unwrap();
    assert_eq!(groups.len(), 9);
    assert_eq!(groups[0], vec![0, 1]);
    assert!(groups[1..].iter().all(|g| g.len() == 1));
}

#[test]
fn lone_boid_cruises_at_min_speed() {
    let mut sim = empty(false);
    sim.spawn_boid(Vec3::ZERO, Preset::Fish);
    let min_speed = sim.boid(0).unwrap().settings().min_speed();

    for _ in 0..100 {
        sim.step(DT).unwrap();
        let velocity = sim.boid(0).unwrap().velocity();
        assert!((velocity.length() - min_speed).abs() < 1e-4);
        assert!(velocity.normalize().dot(Vec3::Z) > 0.9999);
    }
    assert!((sim.positions()[0].z - 100.0 * DT * min_speed).abs() < 1e-3);
}

#[test]
fn coincident_boids_are_guarded() {
    let mut sim = empty(false);
    sim.spawn_boid(Vec3::ONE, Preset::Fish);
    sim.spawn_boid(Vec3::ONE, Preset::Fish);

    let report = sim.step(DT).unwrap();
    assert_eq!(report.coincident, 2);
    for boid in sim.boids() {
        assert!(boid.velocity().is_finite());
        assert!(boid.velocity().length() >= boid.settings().min_speed() - 1e-5);
    }
    assert_eq!(sim.compute_groups().unwrap(), vec![vec![0, 1]]);
}

#[test]
fn preset_switch_is_applied_whole() {
    let params = SimulationParams {
        num_boids: 20,
        seed: Some(4),
        enable_parallel: false,
        ..Default::default()
    };
    let mut sim = Simulation::new(&params).unwrap();
    for _ in 0..10 {
        sim.step(DT).unwrap();
    }

    sim.set_preset_all(Preset::Bird);
    let bird = BoidSettings::from_preset(Preset::Bird);
    for boid in sim.boids() {
        let settings = boid.settings();
        assert_eq!(settings, &bird);
        assert!((settings.min_speed() - 0.9).abs() < 1e-6);
        assert_eq!(settings.interaction_mask(), LayerMask::default());
    }

    sim.step(DT).unwrap();
    assert!(sim.boids().iter().all(|b| b.velocity().length() >= 0.9 - 1e-4));
}

#[test]
fn parallel_and_sequential_agree() {
    let params = SimulationParams {
        num_boids: 80,
        seed: Some(11),
        waypoints: vec![Vec3::new(3.0, 0.0, 0.0), Vec3::new(-3.0, 1.0, 2.0)],
        obstacles: vec![Obstacle::Sphere { center: Vec3::new(0.0, 0.0, 1.0), radius: 0.3 }],
        ..Default::default()
    };
    let mut parallel = Simulation::new(&SimulationParams { enable_parallel: true, ..params.clone() }).unwrap();
    let mut sequential = Simulation::new(&SimulationParams { enable_parallel: false, ..params }).unwrap();

    for _ in 0..40 {
        let a = parallel.step(DT).unwrap();
        let b = sequential.step(DT).unwrap();
        assert_eq!(a, b);
    }

    assert_eq!(parallel.positions(), sequential.positions());
    assert_eq!(parallel.groups(), sequential.groups());
}

#[test]
fn waypoint_draws_boid_closer() {
    let params = SimulationParams {
        num_boids: 0,
        enable_parallel: false,
        waypoints: vec![Vec3::new(5.0, 0.0, 0.0)],
        ..Default::default()
    };
    let mut sim = Simulation::new(&params).unwrap();
    sim.spawn_boid(Vec3::ZERO, Preset::Fish);

    for _ in 0..400 {
        sim.step(DT).unwrap();
    }
    assert!(sim.positions()[0].distance(Vec3::new(5.0, 0.0, 0.0)) < 4.5);
}

#[test]
fn repeated_generation_is_skipped() {
    let mut sim = empty(true);
    sim.spawn_boid(Vec3::ZERO, Preset::Fish);
    sim.spawn_boid(Vec3::new(0.3, 0.0, 0.0), Preset::Fish);

    sim.step_tick(TickId(7), DT).unwrap();
    let positions = sim.positions().to_vec();

    let report = sim.step_tick(TickId(7), DT).unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(sim.positions(), positions.as_slice());

    // The counter moved past the explicit generation
    assert_eq!(sim.step(DT).unwrap().tick, TickId(8));
}

#[test]
fn always_publish_reports_every_pass() {
    let params = SimulationParams {
        num_boids: 6,
        seed: Some(2),
        group_interval: DT,
        change_policy: ChangePolicy::AlwaysPublish,
        ..Default::default()
    };
    let mut sim = Simulation::new(&params).unwrap();
    for _ in 0..5 {
        assert_eq!(sim.step(DT).unwrap().groups_changed, Some(true));
    }
}

#[test]
fn degenerate_collision_range_is_rejected_at_mutation() {
    let mut sim = empty(false);
    sim.spawn_boid(Vec3::ZERO, Preset::Fish);

    let boid = sim.boid_mut(0).unwrap();
    let before = boid.settings().clone();
    let err = boid.settings_mut().set_collision_optimal_distance(before.sensing_radius()).unwrap_err();
    assert!(matches!(err, FlockError::DegenerateCollisionRange { .. }));
    assert_eq!(boid.settings(), &before);

    sim.step(DT).unwrap();
    assert!(sim.boid(0).unwrap().velocity().is_finite());
}

#[test]
fn loads_config_from_file() {
    let path = std::env::temp_dir().join(format!("flocking-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        num_boids = 12
        preset = "bird"
        seed = 99
        waypoints = [[1.0, 0.0, 1.0]]

        [[obstacles]]
        shape = "box"
        center = [0.0, 0.0, 3.0]
        half_extents = [1.0, 1.0, 0.2]
        "#,
    )
    .unwrap();

    let params = SimulationParams::load(&path);
    std::fs::remove_file(&path).ok();
    let params = params.unwrap();

    let sim = Simulation::new(&params).unwrap();
    assert_eq!(sim.len(), 12);
    assert_eq!(sim.obstacles().len(), 1);
    assert_eq!(sim.waypoints().len(), 1);
    assert!(sim.boids().iter().all(|b| b.preset() == Preset::Bird));
}

#[test]
fn missing_config_is_an_io_error() {
    let err = SimulationParams::load("/nonexistent/flocking.toml").unwrap_err();
    assert!(matches!(err, FlockError::Io(_)));
}
