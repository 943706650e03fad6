//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - fixed integration step size (`dt`),
//! - gravitational constant (`G`),
//! - distance floor used by the force kernel (`min_distance`),
//! - star density, which fixes the mass -> radius law

use std::f64::consts::PI;

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub dt: f64, // step size, independent of wall-clock frame time
    pub G: f64, // gravitational constant
    pub min_distance: f64, // distance floor for inverse-square forces
    pub density: f64, // mass per unit disk area
}

impl Parameters {
    /// Radius of a star of mass `m`: the disk of area `m / density`
    /// Strictly increasing in `m`
    pub fn radius(&self, m: f64) -> f64 {
        (m / (PI * self.density)).sqrt()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            dt: 0.04,
            G: 1.0,
            min_distance: 1.0e-2,
            density: 1.0,
        }
    }
}
