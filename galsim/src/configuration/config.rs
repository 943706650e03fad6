//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – worker count and round scheduler
//! - [`ParametersConfig`] – numerical parameters and physical constants
//! - [`SpawnerConfig`]    – distributions used when spawning a galaxy
//! - [`ViewConfig`]       – window size and trail fading
//! - [`GalaxyConfig`]     – galaxies present before the first frame
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! Only `engine.workers` is required; every other field has a default.
//!
//! ```yaml
//! engine:
//!   workers: 4
//!   scheduler: "pool"       # or "fork_join", "serial"
//!
//! parameters:
//!   dt: 0.04                # fixed step size
//!   G: 1.0                  # gravitational constant
//!   min_distance: 1.0e-2    # distance floor for the force law
//!   density: 1.0            # radius = sqrt(m / (pi * density))
//!   seed: 42                # omit for a fresh random stream each run
//!
//! spawner:
//!   min_stars: 500
//!   max_stars: 999
//!   min_radius: 50.0
//!   max_radius: 200.0
//!   min_speed: 0.25
//!   max_speed: 1.25
//!   mass_coefficient: 10.0
//!   min_center_distance: 1.0e-2
//!
//! view:
//!   width: 800
//!   height: 600
//!   darken: 0.92
//!
//! galaxies:
//!   - center: [ 400.0, 300.0 ]
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::simulation::engine::Scheduler;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid scenario: {0}")]
    Invalid(String),
}

/// Which executor runs the parallel round
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerConfig {
    #[default]
    #[serde(rename = "pool")] // Long-lived workers and a round barrier
    Pool,

    #[serde(rename = "fork_join")] // One rayon task per partition per round
    ForkJoin,

    #[serde(rename = "serial")] // Coordinator does all the work
    Serial,
}

impl From<SchedulerConfig> for Scheduler {
    fn from(cfg: SchedulerConfig) -> Self {
        match cfg {
            SchedulerConfig::Pool => Scheduler::Pool,
            SchedulerConfig::ForkJoin => Scheduler::ForkJoin,
            SchedulerConfig::Serial => Scheduler::Serial,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub workers: usize, // number of force workers
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub dt: f64,           // time step size
    pub G: f64,            // gravitational constant
    pub min_distance: f64, // distance floor, keeps forces finite at near-contact
    pub density: f64,      // star density, fixes the mass -> radius law
    pub seed: Option<u64>, // deterministic seed to make runs reproducible
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            dt: 0.04,
            G: 1.0,
            min_distance: 1.0e-2,
            density: 1.0,
            seed: None,
        }
    }
}

/// Distributions used by the galaxy spawner
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SpawnerConfig {
    pub min_stars: usize,
    pub max_stars: usize,
    pub min_radius: f64,
    pub max_radius: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub mass_coefficient: f64,
    pub min_center_distance: f64, // guards the mass law at the exact centre
}

impl Default for SpawnerConfig {
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

/// Window and rendering surface settings
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub width: u32,
    pub height: u32,
    pub darken: f32, // per-frame fade factor for trails, 1.0 keeps everything
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            darken: 0.92,
        }
    }
}

/// A galaxy spawned before the first frame
#[derive(Deserialize, Debug, Clone)]
pub struct GalaxyConfig {
    pub center: Vec<f64>, // [x, y] in simulation units (pixels)
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub spawner: SpawnerConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub galaxies: Vec<GalaxyConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let cfg: ScenarioConfig = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        let cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;
        cfg.validate()?;
        log::info!("loaded scenario {}", path.display());
        Ok(cfg)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.parameters;
        let s = &self.spawner;
        let v = &self.view;

        check(self.engine.workers >= 1, "engine.workers must be at least 1")?;
        check(p.dt > 0.0 && p.dt.is_finite(), "parameters.dt must be positive")?;
        check(p.G.is_finite(), "parameters.G must be finite")?;
        check(p.min_distance > 0.0, "parameters.min_distance must be positive")?;
        check(p.density > 0.0 && p.density.is_finite(), "parameters.density must be positive")?;

        check(s.min_stars >= 1, "spawner.min_stars must be at least 1")?;
        check(s.min_stars <= s.max_stars, "spawner.min_stars exceeds spawner.max_stars")?;
        check(s.min_radius > 0.0, "spawner.min_radius must be positive")?;
        check(s.min_radius < s.max_radius, "spawner.min_radius must be below spawner.max_radius")?;
        check(s.min_speed < s.max_speed, "spawner.min_speed must be below spawner.max_speed")?;
        check(s.mass_coefficient > 0.0, "spawner.mass_coefficient must be positive")?;
        check(s.min_center_distance > 0.0, "spawner.min_center_distance must be positive")?;

        check(v.width > 0 && v.height > 0, "view size must be non-zero")?;
        check((0.0..=1.0).contains(&v.darken), "view.darken must be within [0, 1]")?;

        for (i, g) in self.galaxies.iter().enumerate() {
            if g.center.len() != 2 {
                return Err(ConfigError::Invalid(format!(
                    "galaxies[{i}].center needs 2 components, got {}",
                    g.center.len()
                )));
            }
        }
        Ok(())
    }
}

fn check(ok: bool, msg: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid(msg.to_owned()))
    }
}
