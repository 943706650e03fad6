//! Round coordinator: drives one simulation step per call
//!
//! A step is
//! 1. prune stars whose position went non-finite
//! 2. merge overlapping stars (serial, to a fixed point)
//! 3. run one parallel force/integration round through a `RoundExecutor`
//!
//! The collection is only mutated by the coordinator in steps 1-2 and by the
//! executor's lane commit at the end of step 3.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use thiserror::Error;

use crate::simulation::collisions::{merge_collisions, prune_non_finite};
use crate::simulation::diagnostics::Diagnostics;
use crate::simulation::integrator::{commit_lanes, integrate_partition, Lane};
use crate::simulation::params::Parameters;
use crate::simulation::partition::Partition;
use crate::simulation::pool::WorkerPool;
use crate::simulation::scenario::GalaxySpawner;
use crate::simulation::states::{NVec2, Star, StarArena};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("failed to build fork-join thread pool: {0}")]
    ForkJoin(#[from] rayon::ThreadPoolBuildError),

    #[error("worker pool closed while a round was in flight")]
    PoolClosed,

    #[error("at least one worker is required")]
    NoWorkers,
}

/// How the parallel round is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheduler {
    /// Long-lived workers fenced by the round barrier
    #[default]
    Pool,
    /// One rayon task per partition, spawned and joined every round
    ForkJoin,
    /// The coordinator integrates every partition itself
    Serial,
}

/// Something that can run one force/integration round over the arena it
/// was built with. Returns once every star has been integrated.
pub trait RoundExecutor: Send + Sync {
    fn run_round(&mut self) -> Result<(), EngineError>;
    fn workers(&self) -> usize;
}

/// Fork-join rounds on a dedicated rayon pool of W threads
pub struct ForkJoin {
    arena: StarArena,
    params: Parameters,
    partition: Partition,
    pool: rayon::ThreadPool,
    lanes: Vec<Lane>,
}

impl ForkJoin {
    pub fn new(workers: usize, arena: StarArena, params: Parameters) -> Result<Self, EngineError> {
        if workers == 0 {
            return Err(EngineError::NoWorkers);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|k| format!("galsim-forkjoin-{k}"))
            .build()?;

        Ok(Self {
            arena,
            params,
            partition: Partition::new(workers),
            pool,
            lanes: vec![Lane::new(); workers],
        })
    }
}

impl RoundExecutor for ForkJoin {
    fn workers(&self) -> usize {
        self.partition.workers()
    }

    fn run_round(&mut self) -> Result<(), EngineError> {
        let partition = self.partition;
        let params = self.params;

        {
            let stars = self.arena.read();
            let snapshot: &[Star] = stars.as_slice();
            let lanes = &mut self.lanes;
            self.pool.install(|| {
                lanes.par_iter_mut().enumerate().for_each(|(k, lane)| {
                    integrate_partition(snapshot, partition, k, &params, lane);
                });
            });
        }

        commit_lanes(&mut self.arena.write(), self.lanes.iter());
        Ok(())
    }
}

/// Every partition integrated in turn on the calling thread
pub struct Serial {
    arena: StarArena,
    params: Parameters,
    partition: Partition,
    lanes: Vec<Lane>,
}

impl Serial {
    pub fn new(workers: usize, arena: StarArena, params: Parameters) -> Self {
        let partition = Partition::new(workers);
        Self {
            arena,
            params,
            partition,
            lanes: vec![Lane::new(); partition.workers()],
        }
    }
}

impl RoundExecutor for Serial {
    fn workers(&self) -> usize {
        self.partition.workers()
    }

    fn run_round(&mut self) -> Result<(), EngineError> {
        {
            let stars = self.arena.read();
            for (k, lane) in self.lanes.iter_mut().enumerate() {
                integrate_partition(&stars, self.partition, k, &self.params, lane);
            }
        }
        commit_lanes(&mut self.arena.write(), self.lanes.iter());
        Ok(())
    }
}

/// What happened during one `Engine::step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub frame: u64, // frame number after the step
    pub pruned: usize, // stars removed for non-finite positions
    pub merges: usize, // pairwise merges performed
    pub stars: usize, // stars integrated this round
}

pub struct Engine {
    arena: StarArena,
    params: Parameters,
    executor: Box<dyn RoundExecutor>,
    spawner: GalaxySpawner,
    rng: ChaCha8Rng,
    frame: u64,
}

impl Engine {
    /// Build an engine over `stars` with `workers` force workers.
    /// `seed` fixes the spawner's random stream; `None` seeds from entropy.
    pub fn new(
        stars: Vec<Star>,
        params: Parameters,
        scheduler: Scheduler,
        workers: usize,
        spawner: GalaxySpawner,
        seed: Option<u64>,
    ) -> Result<Self, EngineError> {
        let arena = StarArena::new(stars);

        let executor: Box<dyn RoundExecutor> = match scheduler {
            Scheduler::Pool => Box::new(WorkerPool::spawn(workers, arena.clone(), params)?),
            Scheduler::ForkJoin => Box::new(ForkJoin::new(workers, arena.clone(), params)?),
            Scheduler::Serial => {
                if workers == 0 {
                    return Err(EngineError::NoWorkers);
                }
                Box::new(Serial::new(workers, arena.clone(), params))
            }
        };

        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            arena,
            params,
            executor,
            spawner,
            rng,
            frame: 0,
        })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn workers(&self) -> usize {
        self.executor.workers()
    }

    /// Frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Copy of the current stars
    pub fn stars(&self) -> Vec<Star> {
        self.arena.snapshot()
    }

    /// Borrow the current stars without copying them
    pub fn with_stars<R>(&self, f: impl FnOnce(&[Star]) -> R) -> R {
        let stars = self.arena.read();
        f(stars.as_slice())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.with_stars(Diagnostics::measure)
    }

    /// Add a single star; it takes part from the next step on
    pub fn insert(&mut self, star: Star) {
        self.arena.write().push(star);
    }

    /// Add a rotating galaxy centred on `center`. Returns the number of stars
    /// added.
    pub fn spawn_galaxy(&mut self, center: NVec2) -> usize {
        let galaxy = self.spawner.spawn(center, &mut self.rng);
        let count = galaxy.len();
        self.arena.write().extend(galaxy);
        log::info!("spawned galaxy of {count} stars at ({:.1}, {:.1})", center.x, center.y);
        count
    }

    /// Advance the simulation by one fixed step of `params.dt`
    pub fn step(&mut self) -> Result<StepReport, EngineError> {
        let (pruned, merges, stars) = {
            let mut stars = self.arena.write();
            let pruned = prune_non_finite(&mut stars);
            let merges = merge_collisions(&mut stars, &self.params);
            (pruned, merges, stars.len())
        };

        // The collection is frozen until the round returns
        self.executor.run_round()?;
        self.frame += 1;

        log::trace!("frame {}: {stars} stars, {pruned} pruned, {merges} merges", self.frame);

        Ok(StepReport {
            frame: self.frame,
            pruned,
            merges,
            stars,
        })
    }
}
