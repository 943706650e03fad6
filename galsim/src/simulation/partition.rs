//! Static work partition: worker `k` of `W` owns every index `i` with
//! `i % W == k`. Load-oblivious, but no two workers ever own the same index.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    workers: usize,
}

impl Partition {
    /// `workers` is clamped to at least one
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Worker that owns index `i`
    pub fn owner(&self, i: usize) -> usize {
        i % self.workers
    }

    /// Indices below `n` owned by worker `k`, ascending
    pub fn owned(&self, k: usize, n: usize) -> impl Iterator<Item = usize> {
        (k..n).step_by(self.workers)
    }
}
