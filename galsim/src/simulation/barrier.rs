//! Reusable, generation-counted rendezvous for one coordinator and W workers.
//!
//! Every `parties`-th arrival completes the current generation and releases
//! everyone waiting on it. A round of the simulation uses two generations:
//! one to start the workers, one to collect them.
//!
//! The barrier can be closed. Closing wakes every waiter and makes all
//! current and future `wait` calls return `None`; it is how the pool tells
//! its workers to exit, and how a panicking worker unblocks the coordinator.

use parking_lot::{Condvar, Mutex, MutexGuard};

#[derive(Debug)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    closed: bool,
}

#[derive(Debug)]
pub struct RoundBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl RoundBarrier {
    /// `parties` is clamped to at least one
    pub fn new(parties: usize) -> Self {
        Self {
            parties: parties.max(1),
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                closed: false,
            }),
            cvar: Condvar::new(),
        }
    }

    /// Number of generations completed so far
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Arrive and block until the current generation completes.
    ///
    /// Returns the generation this arrival belonged to, or `None` if the
    /// barrier was closed before it completed.
    pub fn wait(&self) -> Option<u64> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }

        let generation = state.generation;
        state.arrived += 1;

        if state.arrived == self.parties {
            // Last arrival: open the gate and start the next generation
            state.arrived = 0;
            state.generation += 1;
            self.cvar.notify_all();
            return Some(generation);
        }

        // Loop guards against spurious wakeups
        while state.generation == generation && !state.closed {
            self.cvar.wait(&mut state);
        }

        if state.generation == generation {
            // Woken by `close`, the generation never completed
            None
        } else {
            Some(generation)
        }
    }

    /// Close the barrier and release everyone blocked on it
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.cvar.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock()
    }
}
