pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{Star, StarArena, NVec2, Rgb};
pub use simulation::params::Parameters;
pub use simulation::forces::{pair_force, net_force};
pub use simulation::partition::Partition;
pub use simulation::integrator::{integrate_partition, commit_lanes, Lane};
pub use simulation::collisions::{merge_collisions, prune_non_finite, overlaps};
pub use simulation::barrier::RoundBarrier;
pub use simulation::pool::WorkerPool;
pub use simulation::engine::{Engine, EngineError, RoundExecutor, Scheduler, StepReport, ForkJoin, Serial};
pub use simulation::diagnostics::Diagnostics;
pub use simulation::scenario::{GalaxySpawner, SpawnParams, Scenario};

pub use configuration::config::{ScenarioConfig, EngineConfig, ParametersConfig, SpawnerConfig, ViewConfig, GalaxyConfig, SchedulerConfig, ConfigError};

pub use visualization::canvas::{Canvas, Bitmap, draw_star};
pub use visualization::input::{SpawnTrigger, ViewOffset};
pub use visualization::viewer::run_viewer;

pub use benchmark::benchmark::bench_executors;
