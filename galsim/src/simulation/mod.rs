pub mod states;
pub mod params;
pub mod forces;
pub mod partition;
pub mod integrator;
pub mod collisions;
pub mod barrier;
pub mod pool;
pub mod engine;
pub mod diagnostics;
pub mod scenario;
