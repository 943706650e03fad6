//! Pairwise Newtonian gravity for the star collection
//!
//! Exact O(n^2) summation: every star feels every other star. Each side of a
//! pair computes its own force from the same frozen snapshot, so the two
//! results are equal and opposite without sharing any work.

use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec2, Star};

/// Force on `a` due to `b`
///
/// force = -G * m_a * m_b / d^2 * unit(a.x - b.x)
///
/// The distance in the denominator is floored at `params.min_distance`.
/// Exactly coincident centres have no direction, so they contribute nothing.
pub fn pair_force(a: &Star, b: &Star, params: &Parameters) -> NVec2 {
    // diff points from b to a, attraction pulls a along -diff
    let diff = a.x - b.x;
    let dist = diff.norm();
    if dist == 0.0 {
        return NVec2::zeros();
    }

    // Unit vector from b to a
    let unit = diff / dist;

    // Floored distance keeps the magnitude bounded for near misses
    let d = dist.max(params.min_distance);

    -unit * params.G * a.m * b.m / (d * d)
}

/// Net force on star `i` from every other star in `stars`
pub fn net_force(i: usize, stars: &[Star], params: &Parameters) -> NVec2 {
    let si = &stars[i];
    stars
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != i) // no self-interaction
        .fold(NVec2::zeros(), |acc, (_, sj)| acc + pair_force(si, sj, params))
}
