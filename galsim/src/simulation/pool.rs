//! Fixed pool of long-lived force workers
//!
//! W threads are started once and live until the pool is dropped. A single
//! `RoundBarrier` with W + 1 parties (the workers plus the coordinator) fences
//! every round in two generations:
//!
//! 1. start: the coordinator's first arrival completes the generation the
//!    workers have been waiting on since the previous round, and everyone
//!    is released
//! 2. end: each worker integrates its partition, then arrives again; the
//!    coordinator's second arrival only completes once all W workers are in,
//!    so it returns exactly when the round's work is done
//!
//! Between rounds the workers sit in the start arrival, so the coordinator
//! can mutate the collection freely. During a round workers only read the
//! arena and write their own lane.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::simulation::barrier::RoundBarrier;
use crate::simulation::engine::{EngineError, RoundExecutor};
use crate::simulation::integrator::{commit_lanes, integrate_partition, Lane};
use crate::simulation::params::Parameters;
use crate::simulation::partition::Partition;
use crate::simulation::states::StarArena;

struct PoolShared {
    arena: StarArena,
    params: Parameters,
    partition: Partition,
    barrier: RoundBarrier,
    lanes: Vec<Mutex<Lane>>, // lanes[k] is written only by worker k
}

pub struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Vec<JoinHandle<()>>,
    rounds: u64,
}

impl WorkerPool {
    /// Start `workers` threads operating on `arena`
    pub fn spawn(workers: usize, arena: StarArena, params: Parameters) -> Result<Self, EngineError> {
        if workers == 0 {
            return Err(EngineError::NoWorkers);
        }

        let shared = Arc::new(PoolShared {
            arena,
            params,
            partition: Partition::new(workers),
            barrier: RoundBarrier::new(workers + 1),
            lanes: (0..workers).map(|_| Mutex::new(Lane::new())).collect(),
        });

        let mut pool = WorkerPool {
            shared,
            handles: Vec::with_capacity(workers),
            rounds: 0,
        };

        for k in 0..workers {
            let shared = Arc::clone(&pool.shared);
            // On failure `pool` is dropped here, which closes the barrier and
            // joins the workers already started
            let handle = thread::Builder::new()
                .name(format!("galsim-worker-{k}"))
                .spawn(move || worker_loop(&shared, k))?;
            pool.handles.push(handle);
        }

        log::info!("worker pool started with {workers} workers");
        Ok(pool)
    }

    /// Barrier generations completed so far (two per round)
    pub fn generation(&self) -> u64 {
        self.shared.barrier.generation()
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Close the barrier and join every worker
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.shared.barrier.close();
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_owned();
            if handle.join().is_err() {
                log::warn!("{name} panicked before shutdown");
            }
        }
        log::info!("worker pool stopped after {} rounds", self.rounds);
    }
}

impl RoundExecutor for WorkerPool {
    fn workers(&self) -> usize {
        self.shared.partition.workers()
    }

    fn run_round(&mut self) -> Result<(), EngineError> {
        let barrier = &self.shared.barrier;

        // Start: release the workers waiting since the last round
        barrier.wait().ok_or(EngineError::PoolClosed)?;
        // End: blocks until every worker has finished its partition
        barrier.wait().ok_or(EngineError::PoolClosed)?;

        let mut stars = self.shared.arena.write();
        let lanes: Vec<_> = self
            .shared
            .lanes
            .iter()
            .map(|lane| lane.lock())
            .collect();
        commit_lanes(&mut stars, lanes.iter().map(|lane| &**lane));

        self.rounds += 1;
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Closes the barrier if the worker unwinds, so nobody waits for it forever
struct CloseOnPanic<'a>(&'a RoundBarrier);

impl Drop for CloseOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.close();
        }
    }
}

fn worker_loop(shared: &PoolShared, k: usize) {
    let _guard = CloseOnPanic(&shared.barrier);

    loop {
        // Wait for the coordinator to open the round
        if shared.barrier.wait().is_none() {
            break;
        }

        {
            let stars = shared.arena.read();
            let mut lane = shared.lanes[k].lock();
            integrate_partition(&stars, shared.partition, k, &shared.params, &mut lane);
        }

        // Report this partition as done
        if shared.barrier.wait().is_none() {
            break;
        }
    }

    log::debug!("worker {k} exiting");
}
