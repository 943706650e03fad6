use std::time::Instant;

use crate::simulation::engine::{Engine, EngineError, Scheduler};
use crate::simulation::params::Parameters;
use crate::simulation::scenario::GalaxySpawner;
use crate::simulation::states::{NVec2, Star};

/// Helper to build a deterministic collection of size `n`
/// Stars are tiny so nothing merges and every step does the full O(n^2) work
fn make_stars(n: usize) -> Vec<Star> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            // deterministic positions, no rand needed
            let x = NVec2::new((i_f * 0.37).sin() * 500.0, (i_f * 0.13).cos() * 500.0);
            Star::new(x, NVec2::zeros(), 1.0, [255, 255, 255])
        })
        .collect()
}

fn make_params() -> Parameters {
    Parameters {
        density: 1.0e9, // radius ~ 2e-5, no collisions
        ..Parameters::default()
    }
}

/// Milliseconds per step for one executor
fn time_steps(n: usize, scheduler: Scheduler, workers: usize, steps: usize) -> Result<f64, EngineError> {
    let mut engine = Engine::new(make_stars(n), make_params(), scheduler, workers, GalaxySpawner::default(), Some(0))?;

    // Warm up
    engine.step()?;

    let t0 = Instant::now();
    for _ in 0..steps {
        engine.step()?;
    }
    Ok(t0.elapsed().as_secs_f64() * 1000.0 / steps as f64)
}

/// Compare the three round executors over a range of star counts
/// Paste output directly into a spreadsheet to graph
pub fn bench_executors(workers: usize) -> Result<(), EngineError> {
    println!("N,serial_ms,pool_ms,fork_join_ms");

    for n in [250, 500, 1000, 2000, 4000] {
        // Large n: fewer steps to avoid minutes of runtime
        let steps = if n <= 1000 { 10 } else { 2 };

        let serial = time_steps(n, Scheduler::Serial, workers, steps)?;
        let pool = time_steps(n, Scheduler::Pool, workers, steps)?;
        let fork_join = time_steps(n, Scheduler::ForkJoin, workers, steps)?;

        println!("{n},{serial:.3},{pool:.3},{fork_join:.3}");
    }
    Ok(())
}
