//! Core state types for the galaxy simulation.
//!
//! Defines the 2D star record and the shared collection it lives in:
//! - `Star`      position, velocity, mass, display color and the force
//!   accumulated during the current round
//! - `StarArena` index-addressed handle to the star collection, shared by the
//!   coordinator (merge, spawn, prune) and the workers (force rounds)

use std::sync::Arc;

use nalgebra::Vector2;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::simulation::params::Parameters;

pub type NVec2 = Vector2<f64>;

/// Display color, assigned at spawn time and never changed afterwards
pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub m: f64, // mass
    pub color: Rgb,
    force: NVec2, // accumulated this round, reset by `update`
}

impl Star {
    pub fn new(x: NVec2, v: NVec2, m: f64, color: Rgb) -> Self {
        Self {
            x,
            v,
            m,
            color,
            force: NVec2::zeros(),
        }
    }

    /// Force accumulated since the last `update`
    pub fn force(&self) -> NVec2 {
        self.force
    }

    pub fn radius(&self, params: &Parameters) -> f64 {
        params.radius(self.m)
    }

    pub fn add_force(&mut self, f: NVec2) {
        self.force += f;
    }

    /// Semi-implicit Euler step
    /// Velocity is kicked first and the *new* velocity drifts the position:
    /// v_n+1 = v_n + F/m * dt
    /// x_n+1 = x_n + v_n+1 * dt
    pub fn update(&mut self, dt: f64) {
        self.v += self.force / self.m * dt;
        self.x += self.v * dt;
        self.force = NVec2::zeros();
    }

    /// Fuse two stars into one, conserving mass and momentum.
    ///
    /// The heavier input keeps its position (and color); on equal masses the
    /// receiver wins. Neither input is modified.
    pub fn merge(&self, other: &Star) -> Star {
        let m = self.m + other.m;
        let v = (self.m * self.v + other.m * other.v) / m;
        let survivor = if other.m > self.m { other } else { self };

        Star::new(survivor.x, v, m, survivor.color)
    }

    /// False once the position has picked up a NaN or infinity
    pub fn is_finite(&self) -> bool {
        self.x.x.is_finite() && self.x.y.is_finite()
    }
}

/// Shared, index-addressed star collection.
///
/// Cloning the arena clones the handle, not the stars. The coordinator takes
/// the write side between rounds; workers take the read side during a round.
/// The two never overlap because rounds are fenced by the round barrier, so
/// the lock is never contended in practice.
#[derive(Debug, Clone, Default)]
pub struct StarArena {
    stars: Arc<RwLock<Vec<Star>>>,
}

impl StarArena {
    pub fn new(stars: Vec<Star>) -> Self {
        Self {
            stars: Arc::new(RwLock::new(stars)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<Star>> {
        self.stars.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<Star>> {
        self.stars.write()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current collection
    pub fn snapshot(&self) -> Vec<Star> {
        self.read().clone()
    }
}
