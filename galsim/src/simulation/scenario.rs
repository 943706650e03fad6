//! Galaxy spawning and scenario construction
//!
//! `GalaxySpawner` generates rotating disks of stars. `Scenario` takes a
//! validated `ScenarioConfig` (YAML-facing) and produces the runtime bundle:
//! - engine settings (scheduler, worker count)
//! - numerical parameters (`Parameters`)
//! - spawner settings and the galaxies present at frame 0
//! - view settings consumed by the viewer

use std::f64::consts::TAU;

use rand::Rng;

use crate::configuration::config::{ConfigError, ScenarioConfig, ViewConfig};
use crate::simulation::engine::{Engine, EngineError, Scheduler};
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec2, Star};

/// Runtime settings for `GalaxySpawner`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    pub min_stars: usize, // inclusive
    pub max_stars: usize, // inclusive
    pub min_radius: f64, // base radius R drawn once per galaxy
    pub max_radius: f64,
    pub min_speed: f64, // tangential speed factor drawn per star
    pub max_speed: f64,
    pub mass_coefficient: f64, // m = coefficient / sqrt(d)
    pub min_center_distance: f64, // floor on d for the mass law
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            min_stars: 500,
            max_stars: 999,
            min_radius: 50.0,
            max_radius: 200.0,
            min_speed: 0.25,
            max_speed: 1.25,
            mass_coefficient: 10.0,
            min_center_distance: 1.0e-2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GalaxySpawner {
    pub params: SpawnParams,
}

impl GalaxySpawner {
    pub fn new(params: SpawnParams) -> Self {
        Self { params }
    }

    /// Generate one galaxy centred on `center`.
    ///
    /// - star count uniform in `[min_stars, max_stars]`
    /// - base radius R uniform in `[min_radius, max_radius)`, once per galaxy
    /// - star distance r = sqrt(U(0,R)) * sqrt(U(0,R)), biased to the centre
    /// - tangential velocity sqrt(r) * direction * U(min_speed, max_speed),
    ///   with one rotation direction for the whole galaxy
    /// - mass = mass_coefficient / sqrt(max(d, min_center_distance))
    pub fn spawn<R: Rng + ?Sized>(&self, center: NVec2, rng: &mut R) -> Vec<Star> {
        let p = &self.params;

        let count = rng.gen_range(p.min_stars..=p.max_stars);
        let radius = rng.gen_range(p.min_radius..p.max_radius);

        // Clockwise or counter-clockwise, shared by every star
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };

        (0..count)
            .map(|_| {
                let angle = rng.gen_range(0.0..TAU);
                let r = rng.gen_range(0.0..radius).sqrt() * rng.gen_range(0.0..radius).sqrt();

                // Offset from the centre and the tangent perpendicular to it
                let radial = NVec2::new(angle.cos(), angle.sin());
                let tangent = NVec2::new(-angle.sin(), angle.cos());
                let offset = radial * r;

                let speed = r.sqrt() * direction * rng.gen_range(p.min_speed..p.max_speed);
                let v = tangent * speed;

                let d = offset.norm().max(p.min_center_distance);
                let m = p.mass_coefficient / d.sqrt();

                let color = [
                    rng.gen_range(192..=255),
                    rng.gen_range(192..=255),
                    rng.gen_range(128..192),
                ];

                Star::new(center + offset, v, m, color)
            })
            .collect()
    }
}

/// Fully-initialized runtime scenario built from a [`ScenarioConfig`]
#[derive(Debug, Clone)]
pub struct Scenario {
    pub scheduler: Scheduler,
    pub workers: usize,
    pub parameters: Parameters,
    pub spawner: GalaxySpawner,
    pub seed: Option<u64>,
    pub galaxies: Vec<NVec2>, // centres spawned before the first frame
    pub view: ViewConfig,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;

        // Parameters (runtime) from ParametersConfig
        let p_cfg = &cfg.parameters;
        let parameters = Parameters {
            dt: p_cfg.dt,
            G: p_cfg.G,
            min_distance: p_cfg.min_distance,
            density: p_cfg.density,
        };

        // Spawner (runtime) from SpawnerConfig
        let s_cfg = &cfg.spawner;
        let spawner = GalaxySpawner::new(SpawnParams {
            min_stars: s_cfg.min_stars,
            max_stars: s_cfg.max_stars,
            min_radius: s_cfg.min_radius,
            max_radius: s_cfg.max_radius,
            min_speed: s_cfg.min_speed,
            max_speed: s_cfg.max_speed,
            mass_coefficient: s_cfg.mass_coefficient,
            min_center_distance: s_cfg.min_center_distance,
        });

        let galaxies = cfg
            .galaxies
            .iter()
            .map(|g| NVec2::new(g.center[0], g.center[1]))
            .collect();

        Ok(Self {
            scheduler: cfg.engine.scheduler.into(),
            workers: cfg.engine.workers,
            parameters,
            spawner,
            seed: p_cfg.seed,
            galaxies,
            view: cfg.view,
        })
    }

    /// Start the engine and spawn the initial galaxies
    pub fn into_engine(self) -> Result<Engine, EngineError> {
        let mut engine = Engine::new(
            Vec::new(),
            self.parameters,
            self.scheduler,
            self.workers,
            self.spawner,
            self.seed,
        )?;

        for center in self.galaxies {
            engine.spawn_galaxy(center);
        }
        Ok(engine)
    }
}
