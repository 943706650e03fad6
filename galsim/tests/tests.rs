use std::path::PathBuf;

use galsim::{
    commit_lanes, integrate_partition, merge_collisions, net_force, overlaps, pair_force, prune_non_finite,
};
use galsim::{ConfigError, Diagnostics, Engine, EngineError, GalaxySpawner, Lane, NVec2, Parameters, Partition};
use galsim::{RoundExecutor, Scenario, ScenarioConfig, Scheduler, SchedulerConfig, SpawnParams, Star, StarArena, WorkerPool};

use proptest::prelude::*;
use rand::rngs::mock::StepRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Star at rest with a fixed color
pub fn star(x: f64, y: f64, m: f64) -> Star {
    Star::new(NVec2::new(x, y), NVec2::zeros(), m, [255, 255, 255])
}

pub fn moving_star(x: f64, y: f64, vx: f64, vy: f64, m: f64) -> Star {
    Star::new(NVec2::new(x, y), NVec2::new(vx, vy), m, [255, 255, 255])
}

/// Default physics parameters for tests
pub fn test_params() -> Parameters {
    Parameters {
        dt: 0.04,
        G: 1.0,
        min_distance: 1.0e-2,
        density: 1.0,
    }
}

/// Seeded galaxy around the origin
pub fn seeded_galaxy(seed: u64) -> Vec<Star> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    GalaxySpawner::default().spawn(NVec2::zeros(), &mut rng)
}

fn engine_with(stars: Vec<Star>, params: Parameters, scheduler: Scheduler, workers: usize) -> Engine {
    Engine::new(stars, params, scheduler, workers, GalaxySpawner::default(), Some(1)).unwrap()
}

fn no_pair_overlaps(stars: &[Star], params: &Parameters) -> bool {
    (0..stars.len()).all(|i| ((i + 1)..stars.len()).all(|j| !overlaps(&stars[i], &stars[j], params)))
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_two_star_scenario_no_merge() {
    let p = test_params();
    let a = star(0.0, 0.0, 10.0);
    let b = star(5.0, 0.0, 20.0);

    assert!(!overlaps(&a, &b, &p), "radii should not reach across 5 units");

    // 1 * 10 * 20 / 5^2 = 8, pointing from a toward b
    let f = pair_force(&a, &b, &p);
    assert!((f - NVec2::new(8.0, 0.0)).norm() < 1e-12, "unexpected force {:?}", f);
}

#[test]
fn gravity_is_antisymmetric() {
    let p = test_params();
    let a = star(-1.3, 2.0, 3.0);
    let b = star(4.1, -0.7, 7.5);

    let fab = pair_force(&a, &b, &p);
    let fba = pair_force(&b, &a, &p);

    assert!((fab.norm() - fba.norm()).abs() < 1e-12);
    assert!((fab + fba).norm() < 1e-12, "forces not opposite: {:?} {:?}", fab, fba);
}

#[test]
fn gravity_inverse_square_law() {
    let p = test_params();
    let near = pair_force(&star(0.0, 0.0, 1.0), &star(1.0, 0.0, 1.0), &p);
    let far = pair_force(&star(0.0, 0.0, 1.0), &star(2.0, 0.0, 1.0), &p);

    let ratio = near.norm() / far.norm();
    assert!((ratio - 4.0).abs() < 1e-9, "Expected ~4x, got {}", ratio);
}

#[test]
fn gravity_coincident_centres_contribute_nothing() {
    let p = test_params();
    let f = pair_force(&star(1.0, 1.0, 5.0), &star(1.0, 1.0, 5.0), &p);
    assert_eq!(f, NVec2::zeros());
}

#[test]
fn gravity_distance_floor_bounds_magnitude() {
    let p = test_params();
    let f = pair_force(&star(0.0, 0.0, 1.0), &star(1.0e-9, 0.0, 1.0), &p);

    let bound = p.G / (p.min_distance * p.min_distance);
    assert!(f.iter().all(|c| c.is_finite()));
    assert!(f.norm() <= bound * (1.0 + 1e-12), "floor failed; force too large");
    assert!(f.x > 0.0, "still attractive");
}

#[test]
fn gravity_net_force_cancels_for_symmetric_neighbours() {
    let p = test_params();
    let stars = vec![star(0.0, 0.0, 1.0), star(-3.0, 0.0, 2.0), star(3.0, 0.0, 2.0)];
    assert!(net_force(0, &stars, &p).norm() < 1e-12);
    assert!(net_force(1, &stars, &p).x > 0.0);
}

// ==================================================================================
// Star tests
// ==================================================================================

#[test]
fn star_update_is_semi_implicit_euler() {
    let mut s = moving_star(0.0, 0.0, 1.0, 0.0, 2.0);
    s.add_force(NVec2::new(3.0, 0.0));
    s.add_force(NVec2::new(1.0, 0.0));
    assert_eq!(s.force(), NVec2::new(4.0, 0.0));

    s.update(0.5);

    // v = 1 + 4 / 2 * 0.5 = 2, x uses the new velocity: 2 * 0.5 = 1
    assert!((s.v - NVec2::new(2.0, 0.0)).norm() < 1e-12);
    assert!((s.x - NVec2::new(1.0, 0.0)).norm() < 1e-12, "position used stale velocity");
    assert_eq!(s.force(), NVec2::zeros(), "force not reset");
}

#[test]
fn star_radius_grows_with_mass() {
    let p = test_params();
    let masses = [0.01, 0.5, 1.0, 10.0, 20.0, 1.0e4];
    for pair in masses.windows(2) {
        assert!(p.radius(pair[0]) < p.radius(pair[1]));
    }
}

#[test]
fn star_merge_keeps_heavier_position() {
    let light = moving_star(0.0, 0.0, 1.0, 0.0, 10.0);
    let heavy = Star::new(NVec2::new(0.5, 0.0), NVec2::new(0.0, 1.0), 20.0, [1, 2, 3]);

    let merged = light.merge(&heavy);
    assert_eq!(merged.m, 30.0);
    assert_eq!(merged.x, heavy.x);
    assert_eq!(merged.color, heavy.color);
    assert!((merged.v - NVec2::new(1.0 / 3.0, 2.0 / 3.0)).norm() < 1e-12);

    // Inputs untouched
    assert_eq!(light.m, 10.0);
    assert_eq!(heavy.x, NVec2::new(0.5, 0.0));
}

#[test]
fn star_merge_tie_keeps_receiver_position() {
    let a = star(1.0, 0.0, 5.0);
    let b = star(2.0, 0.0, 5.0);
    assert_eq!(a.merge(&b).x, a.x);
    assert_eq!(b.merge(&a).x, b.x);
}

// ==================================================================================
// Collision tests
// ==================================================================================

#[test]
fn collision_two_star_scenario_merge() {
    let p = test_params();
    let mut stars = vec![moving_star(0.0, 0.0, 1.0, 0.0, 10.0), moving_star(0.5, 0.0, 0.0, 1.0, 20.0)];

    let merges = merge_collisions(&mut stars, &p);

    assert_eq!(merges, 1);
    assert_eq!(stars.len(), 1);
    assert_eq!(stars[0].m, 30.0);
    assert_eq!(stars[0].x, NVec2::new(0.5, 0.0));
    assert!((stars[0].v - NVec2::new(1.0 / 3.0, 2.0 / 3.0)).norm() < 1e-12);
}

#[test]
fn collision_chain_merges_against_same_star() {
    let p = test_params();
    // Each neighbour overlaps the first star but they are all removed in one sweep
    let mut stars = vec![star(0.0, 0.0, 50.0), star(1.0, 0.0, 1.0), star(-1.0, 0.0, 1.0), star(0.0, 1.0, 1.0)];

    let merges = merge_collisions(&mut stars, &p);
    assert_eq!(merges, 3);
    assert_eq!(stars.len(), 1);
    assert_eq!(stars[0].m, 53.0);
    assert_eq!(stars[0].x, NVec2::zeros());
}

#[test]
fn collision_grown_star_reaches_earlier_neighbour() {
    let p = test_params();
    // Star 1 only overlaps star 0 after star 0 absorbs the heavy star 2 and
    // jumps to its position, so a single sweep would leave an overlap behind
    let mut stars = vec![star(0.0, 0.0, 1.0), star(1.5, 0.0, 1.0), star(2.5, 0.0, 100.0)];
    assert!(!overlaps(&stars[0], &stars[1], &p));

    let merges = merge_collisions(&mut stars, &p);
    assert_eq!(merges, 2);
    assert_eq!(stars.len(), 1);
    assert_eq!(stars[0].m, 102.0);
}

#[test]
fn collision_merge_reaches_fixed_point() {
    let p = test_params();
    let mut stars = seeded_galaxy(3);
    let before: Diagnostics = Diagnostics::measure(&stars);

    merge_collisions(&mut stars, &p);
    assert!(no_pair_overlaps(&stars, &p), "overlap left after merge phase");

    let once = stars.clone();
    assert_eq!(merge_collisions(&mut stars, &p), 0);
    assert_eq!(stars, once, "second merge pass changed the collection");

    let after = Diagnostics::measure(&stars);
    assert!((after.total_mass - before.total_mass).abs() < 1e-9 * before.total_mass);
    assert!((after.momentum - before.momentum).norm() < 1e-9 * before.total_mass.max(1.0));
}

#[test]
fn collision_prune_removes_only_non_finite() {
    let mut stars = vec![star(0.0, 0.0, 1.0), star(f64::NAN, 0.0, 1.0), star(3.0, 0.0, 1.0), star(0.0, f64::INFINITY, 1.0)];

    assert_eq!(prune_non_finite(&mut stars), 2);
    assert_eq!(stars, vec![star(0.0, 0.0, 1.0), star(3.0, 0.0, 1.0)]);
}

// ==================================================================================
// Spawner tests
// ==================================================================================

#[test]
fn spawn_bounds_and_tangential_velocity() {
    let center = NVec2::new(120.0, -40.0);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let stars = GalaxySpawner::default().spawn(center, &mut rng);

    assert!((500..=999).contains(&stars.len()), "count {}", stars.len());

    let mut spins = Vec::new();
    for s in &stars {
        let offset = s.x - center;
        let r = offset.norm();
        assert!(r < 200.0, "star outside the base radius: {}", r);
        assert!(s.m.is_finite() && s.m > 0.0);
        assert!(s.m <= 100.0 + 1e-9, "mass guard exceeded: {}", s.m);

        // Below the 0.01 floor the mass is pinned at 100
        if r > 0.02 {
            // mass = 10 / sqrt(r)
            assert!((s.m * r.sqrt() - 10.0).abs() < 1e-6);
            // velocity perpendicular to the radial direction
            assert!(s.v.dot(&offset).abs() <= 1e-9 * s.v.norm() * r + 1e-12);
            let cross = offset.x * s.v.y - offset.y * s.v.x;
            if cross != 0.0 {
                spins.push(cross.signum());
            }
        }
    }

    assert!(!spins.is_empty());
    assert!(spins.iter().all(|&s| s == spins[0]), "galaxy does not rotate coherently");
}

#[test]
fn spawn_is_reproducible_for_a_seed() {
    assert_eq!(seeded_galaxy(11), seeded_galaxy(11));
}

#[test]
fn spawn_guards_star_at_exact_centre() {
    // An all-zero generator places every star on the centre
    let mut rng = StepRng::new(0, 0);
    let spawner = GalaxySpawner::new(SpawnParams::default());
    let stars = spawner.spawn(NVec2::new(5.0, 5.0), &mut rng);

    assert!(!stars.is_empty());
    for s in &stars {
        assert_eq!(s.x, NVec2::new(5.0, 5.0));
        assert!(s.m.is_finite());
        assert!((s.m - 100.0).abs() < 1e-9);
    }
}

// ==================================================================================
// Round / worker pool tests
// ==================================================================================

#[test]
fn round_lanes_cover_every_index_once() {
    let p = test_params();
    let stars = seeded_galaxy(5);
    let partition = Partition::new(4);

    let mut lanes = vec![Lane::new(); 4];
    for (k, lane) in lanes.iter_mut().enumerate() {
        integrate_partition(&stars, partition, k, &p, lane);
        assert!(lane.iter().all(|(i, _)| partition.owner(*i) == k));
    }

    let mut out = stars.clone();
    assert_eq!(commit_lanes(&mut out, lanes.iter()), stars.len());
}

#[test]
fn round_kernel_applies_net_force() {
    let p = test_params();
    let stars = vec![moving_star(0.0, 0.0, 0.0, 1.0, 2.0), star(4.0, 0.0, 3.0), star(0.0, -6.0, 1.5)];

    let mut lane = Lane::new();
    integrate_partition(&stars, Partition::new(1), 0, &p, &mut lane);

    for (i, integrated) in lane {
        let mut expected = stars[i];
        expected.add_force(net_force(i, &stars, &p));
        expected.update(p.dt);
        assert_eq!(integrated, expected, "star {}", i);
    }
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "lanes do not cover the collection")]
fn round_commit_rejects_partial_lanes() {
    let p = test_params();
    let stars = seeded_galaxy(5);
    let partition = Partition::new(2);

    // Only worker 0's half of the collection
    let mut lane = Lane::new();
    integrate_partition(&stars, partition, 0, &p, &mut lane);

    let mut out = stars.clone();
    commit_lanes(&mut out, [&lane]);
}

#[test]
fn round_arena_survives_panic_while_locked() {
    let arena = StarArena::new(vec![star(0.0, 0.0, 1.0), star(3.0, 0.0, 1.0)]);

    let held = arena.clone();
    let result = std::thread::spawn(move || {
        let mut stars = held.write();
        stars.push(star(9.0, 9.0, 1.0));
        panic!("writer died holding the lock");
    })
    .join();
    assert!(result.is_err());

    // The lock is released on unwind and the collection stays usable
    assert_eq!(arena.len(), 3);
    arena.write().pop();
    assert_eq!(arena.snapshot().len(), 2);
}

#[test]
fn round_pool_counts_two_generations_per_round() {
    let arena = StarArena::new(vec![star(0.0, 0.0, 1.0), star(10.0, 0.0, 1.0), star(0.0, 10.0, 1.0)]);
    let mut pool = WorkerPool::spawn(3, arena, test_params()).unwrap();

    for _ in 0..4 {
        pool.run_round().unwrap();
    }
    assert_eq!(pool.rounds(), 4);
    assert_eq!(pool.generation(), 8);
    pool.shutdown();
}

#[test]
fn round_each_star_integrated_exactly_once() {
    // Without gravity every star drifts v * dt per round; a missed or doubled
    // index would end up somewhere else
    let params = Parameters {
        dt: 1.0,
        G: 0.0,
        ..test_params()
    };
    let stars: Vec<Star> = (0..10).map(|i| moving_star(i as f64 * 10.0, 0.0, 1.0, 0.5, 1.0)).collect();

    for workers in [1, 3, 4, 16] {
        let arena = StarArena::new(stars.clone());
        let mut pool = WorkerPool::spawn(workers, arena.clone(), params).unwrap();
        for _ in 0..3 {
            pool.run_round().unwrap();
        }

        for (i, s) in arena.snapshot().iter().enumerate() {
            assert_eq!(s.x, NVec2::new(i as f64 * 10.0 + 3.0, 1.5), "workers = {}", workers);
        }
    }
}

#[test]
fn round_executors_agree_bit_for_bit() {
    let p = test_params();
    let run = |scheduler| {
        let mut engine = engine_with(seeded_galaxy(9), p, scheduler, 4);
        for _ in 0..5 {
            engine.step().unwrap();
        }
        engine.stars()
    };

    let serial = run(Scheduler::Serial);
    assert_eq!(run(Scheduler::Pool), serial);
    assert_eq!(run(Scheduler::ForkJoin), serial);
}

#[test]
fn round_conserves_momentum_for_isolated_pair() {
    let p = test_params();
    let mut engine = engine_with(
        vec![moving_star(0.0, 0.0, 0.3, 0.0, 10.0), moving_star(5.0, 0.0, 0.0, -0.2, 20.0)],
        p,
        Scheduler::Pool,
        2,
    );
    let before = engine.diagnostics();
    engine.step().unwrap();
    let after = engine.diagnostics();

    assert_eq!(after.count, 2);
    assert!((after.momentum - before.momentum).norm() < 1e-12);
}

// ==================================================================================
// Engine tests
// ==================================================================================

#[test]
fn engine_rejects_zero_workers() {
    for scheduler in [Scheduler::Pool, Scheduler::ForkJoin, Scheduler::Serial] {
        let result = Engine::new(Vec::new(), test_params(), scheduler, 0, GalaxySpawner::default(), None);
        assert!(matches!(result, Err(EngineError::NoWorkers)));
    }
}

#[test]
fn engine_nan_purge_leaves_others_untouched() {
    let p = test_params();
    let clean = vec![moving_star(0.0, 0.0, 0.1, 0.0, 2.0), moving_star(20.0, 0.0, 0.0, 0.1, 3.0)];

    let mut with_nan = clean.clone();
    with_nan.insert(1, star(f64::NAN, f64::NAN, 1.0));

    let mut dirty = engine_with(with_nan, p, Scheduler::Pool, 3);
    let mut reference = engine_with(clean, p, Scheduler::Pool, 3);

    let report = dirty.step().unwrap();
    reference.step().unwrap();

    assert_eq!(report.pruned, 1);
    assert_eq!(report.stars, 2);
    assert_eq!(dirty.stars(), reference.stars());
}

#[test]
fn engine_inserted_star_joins_next_step() {
    let p = test_params();
    let mut engine = engine_with(vec![star(0.0, 0.0, 5.0)], p, Scheduler::Pool, 2);
    engine.step().unwrap();

    // Lands on the first star, so it is merged before the round runs
    engine.insert(star(0.1, 0.0, 1.0));
    engine.insert(star(30.0, 0.0, 1.0));
    assert_eq!(engine.len(), 3);

    let report = engine.step().unwrap();
    assert_eq!(report.merges, 1);
    assert_eq!(report.stars, 2);
    assert!((engine.diagnostics().total_mass - 7.0).abs() < 1e-12);
}

#[test]
fn engine_step_merges_before_round() {
    let p = test_params();
    let mut engine = engine_with(
        vec![moving_star(0.0, 0.0, 1.0, 0.0, 10.0), moving_star(0.5, 0.0, 0.0, 1.0, 20.0)],
        p,
        Scheduler::Pool,
        4,
    );

    let report = engine.step().unwrap();
    assert_eq!(report.merges, 1);
    assert_eq!(report.frame, 1);
    assert_eq!(engine.len(), 1);

    // A lone star just drifts with its merged velocity
    let s = engine.stars()[0];
    let v = NVec2::new(1.0 / 3.0, 2.0 / 3.0);
    assert!((s.x - (NVec2::new(0.5, 0.0) + v * p.dt)).norm() < 1e-12);
}

#[test]
fn engine_spawn_and_step_empty_sky() {
    let mut engine = engine_with(Vec::new(), test_params(), Scheduler::Pool, 4);
    engine.step().unwrap();
    assert!(engine.is_empty());

    let added = engine.spawn_galaxy(NVec2::new(400.0, 300.0));
    assert_eq!(engine.len(), added);

    let report = engine.step().unwrap();
    assert_eq!(report.frame, 2);
    assert!(engine.with_stars(|stars| stars.iter().all(Star::is_finite)));
}

// ==================================================================================
// Configuration tests
// ==================================================================================

#[test]
fn config_defaults_fill_missing_sections() {
    let cfg = ScenarioConfig::from_yaml_str("engine:\n  workers: 2\n").unwrap();
    assert_eq!(cfg.engine.scheduler, SchedulerConfig::Pool);
    assert_eq!(cfg.parameters.dt, 0.04);
    assert_eq!(cfg.spawner.max_stars, 999);
    assert_eq!(cfg.view.width, 800);
    assert!(cfg.galaxies.is_empty());
}

#[test]
fn config_rejects_invalid_values() {
    let zero_workers = ScenarioConfig::from_yaml_str("engine:\n  workers: 0\n");
    assert!(matches!(zero_workers, Err(ConfigError::Invalid(_))));

    let bad_center = ScenarioConfig::from_yaml_str("engine:\n  workers: 2\ngalaxies:\n  - center: [1.0, 2.0, 3.0]\n");
    assert!(matches!(bad_center, Err(ConfigError::Invalid(_))));

    let bad_scheduler = ScenarioConfig::from_yaml_str("engine:\n  workers: 2\n  scheduler: \"threads\"\n");
    assert!(matches!(bad_scheduler, Err(ConfigError::Parse(_))));
}

#[test]
fn config_bundled_scenario_builds_engine() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join("two_galaxies.yaml");
    let cfg = ScenarioConfig::from_path(&path).unwrap();
    let scenario = Scenario::build_scenario(cfg).unwrap();

    assert_eq!(scenario.scheduler, Scheduler::Pool);
    assert_eq!(scenario.galaxies.len(), 2);
    assert_eq!(scenario.seed, Some(42));

    let engine = scenario.into_engine().unwrap();
    assert!((1000..=1998).contains(&engine.len()));
}

// ==================================================================================
// Property tests
// ==================================================================================

proptest! {
    #[test]
    fn prop_partition_complete_and_disjoint(n in 0usize..400, workers in 1usize..17) {
        let p = Partition::new(workers);
        let mut hits = vec![0u32; n];
        for k in 0..workers {
            for i in p.owned(k, n) {
                hits[i] += 1;
            }
        }
        prop_assert!(hits.iter().all(|&h| h == 1));
    }

    #[test]
    fn prop_merge_conserves_mass_and_momentum(
        ma in 0.01f64..100.0, mb in 0.01f64..100.0,
        vax in -10.0f64..10.0, vay in -10.0f64..10.0,
        vbx in -10.0f64..10.0, vby in -10.0f64..10.0
    ) {
        let a = moving_star(0.0, 0.0, vax, vay, ma);
        let b = moving_star(1.0, 1.0, vbx, vby, mb);
        let merged = a.merge(&b);

        prop_assert_eq!(merged.m, ma + mb);
        let before = ma * a.v + mb * b.v;
        let after = merged.m * merged.v;
        prop_assert!((after - before).norm() <= 1e-9 * (1.0 + before.norm()));
    }
}
