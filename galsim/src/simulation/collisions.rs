//! Serial collision pass run by the coordinator before every round
//!
//! - `prune_non_finite` drops stars whose position has gone NaN/infinite
//! - `merge_collisions` fuses overlapping stars until no pair overlaps

use crate::simulation::params::Parameters;
use crate::simulation::states::Star;

/// Two stars overlap when their centres are closer than the sum of radii
pub fn overlaps(a: &Star, b: &Star, params: &Parameters) -> bool {
    (a.x - b.x).norm() < a.radius(params) + b.radius(params)
}

/// Remove every star with a non-finite position, keeping the order of the
/// rest. Returns how many were removed.
pub fn prune_non_finite(stars: &mut Vec<Star>) -> usize {
    let before = stars.len();
    stars.retain(Star::is_finite);
    before - stars.len()
}

/// One O(n^2) sweep over pairs i < j. A merged star replaces entry `i`,
/// entry `j` is removed, and `j` is not advanced so the star shifted into
/// slot `j` is tested against the grown star too.
fn merge_sweep(stars: &mut Vec<Star>, params: &Parameters) -> usize {
    let mut merges = 0;
    let mut i = 0;
    while i < stars.len() {
        let mut j = i + 1;
        while j < stars.len() {
            if overlaps(&stars[i], &stars[j], params) {
                stars[i] = stars[i].merge(&stars[j]);
                stars.remove(j);
                merges += 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    merges
}

/// Merge overlapping stars until a fixed point: on return no pair in
/// `stars` overlaps. A grown star can reach pairs an earlier sweep already
/// passed, so sweeps repeat until one performs no merge. Returns the total
/// number of merges.
pub fn merge_collisions(stars: &mut Vec<Star>, params: &Parameters) -> usize {
    let mut total = 0;
    loop {
        let merges = merge_sweep(stars, params);
        if merges == 0 {
            return total;
        }
        total += merges;
    }
}
