//! Per-round integration kernel shared by every executor
//!
//! A round reads one frozen snapshot of the collection. Each worker integrates
//! only the stars it owns and writes the results into its own lane; the
//! coordinator commits the lanes once every worker has finished.

use crate::simulation::forces::net_force;
use crate::simulation::params::Parameters;
use crate::simulation::partition::Partition;
use crate::simulation::states::Star;

/// Integrated stars produced by one worker, tagged with their index
pub type Lane = Vec<(usize, Star)>;

/// Integrate the stars owned by worker `k` against the snapshot `stars`
/// - accumulate the pairwise force from every other star
/// - apply one semi-implicit Euler step of `params.dt`
///
/// `stars` is never written; results land in `lane`, which is cleared first
/// so its allocation is reused across rounds.
pub fn integrate_partition(stars: &[Star], partition: Partition, k: usize, params: &Parameters, lane: &mut Lane) {
    lane.clear();

    for i in partition.owned(k, stars.len()) {
        let mut star = stars[i];
        star.add_force(net_force(i, stars, params));
        star.update(params.dt);
        lane.push((i, star));
    }
}

/// Write every lane back into the collection. Returns the number of stars
/// written.
///
/// The lanes must come from a complete partition of `stars`: every index
/// written exactly once. Debug builds panic if any star was left out.
pub fn commit_lanes<'a, I>(stars: &mut [Star], lanes: I) -> usize
where
    I: IntoIterator<Item = &'a Lane>,
{
    let mut written = 0;
    for lane in lanes {
        for &(i, star) in lane {
            stars[i] = star;
            written += 1;
        }
    }
    debug_assert_eq!(written, stars.len(), "lanes do not cover the collection");
    written
}
