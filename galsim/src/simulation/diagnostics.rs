//! Conserved quantities of a star collection, used for headless progress
//! logs and conservation checks.

use crate::simulation::states::{NVec2, Star};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub count: usize,
    pub total_mass: f64,
    pub momentum: NVec2, // sum of m * v
    pub center_of_mass: NVec2, // zero for an empty collection
}

impl Diagnostics {
    pub fn measure(stars: &[Star]) -> Self {
        let total_mass: f64 = stars.iter().map(|s| s.m).sum();
        let momentum = stars.iter().fold(NVec2::zeros(), |p, s| p + s.m * s.v);
        let weighted = stars.iter().fold(NVec2::zeros(), |c, s| c + s.m * s.x);

        let center_of_mass = if total_mass > 0.0 {
            weighted / total_mass
        } else {
            NVec2::zeros()
        };

        Self {
            count: stars.len(),
            total_mass,
            momentum,
            center_of_mass,
        }
    }
}
