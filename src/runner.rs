//! Lane scheduling for the non-discovering kernels.
//!
//! A [`Runner`] names the parallelism of a call: how many worker lanes to
//! run (`0` means one per hardware thread), the kill token polled at every
//! task boundary, and the queue depth used by the dynamic crew
//! (see [`crate::crew`]).
//!
//! Kernels whose workload is known up front frame it as one task per vertex,
//! partitioned by hash: vertex `v` belongs to lane `hash(v) % lanes`. Each
//! lane's shard runs to completion on one pool thread in order, so a
//! vertex's mutations stay single-owner for the duration of a kernel, and
//! the phase barrier is the join at the end of the parallel iterator.

use crate::error::{Error, Result};
use log::debug;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation handle.
///
/// Cloning shares the flag; killing is sticky. Kernels poll at task-loop
/// heads, phase boundaries, and fixpoint rounds, and return
/// [`Error::Killed`] once the flag is observed.
#[derive(Clone, Default)]
pub struct KillToken(Arc<AtomicBool>);

impl KillToken {
    /// A fresh, unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the switch. In-flight tasks finish; no new work is scheduled.
    pub fn kill(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Has the switch been tripped?
    pub fn is_killed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Parallelism policy passed to every kernel.
#[derive(Clone)]
pub struct Runner {
    /// Worker lane count; `0` requests one lane per hardware thread.
    pub lanes: usize,
    /// Cancellation handle shared with the caller.
    pub kill: KillToken,
    /// Bound of each crew queue; producers block (locally buffering) when a
    /// remote lane's queue is full.
    pub queue_depth: usize,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            lanes: 0,
            kill: KillToken::new(),
            queue_depth: 64,
        }
    }
}

impl Runner {
    /// A runner with an explicit lane count and a fresh kill token.
    pub fn with_lanes(lanes: usize) -> Self {
        Self {
            lanes,
            ..Self::default()
        }
    }

    /// A runner sharing the given kill token.
    pub fn killable(lanes: usize, kill: KillToken) -> Self {
        Self {
            lanes,
            kill,
            ..Self::default()
        }
    }

    /// The effective lane count (resolving `0` to the hardware thread
    /// count).
    pub fn lane_count(&self) -> usize {
        if self.lanes == 0 {
            num_cpus::get().max(1)
        } else {
            self.lanes
        }
    }

    /// Poll the kill switch.
    pub(crate) fn check(&self) -> Result<()> {
        if self.kill.is_killed() {
            Err(Error::Killed)
        } else {
            Ok(())
        }
    }

    /// A pool with one thread per lane, built per kernel call.
    pub(crate) fn pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.lane_count())
            .build()
            .map_err(|_| Error::OutOfMemory)
    }
}

/// First-error slot shared across lanes.
///
/// Stores the first error posted and raises a kernel-local stop flag so
/// other lanes short-circuit; later posts are discarded. The caller's
/// kill token is left alone — it belongs to the caller, and an error in
/// one kernel must not poison the next call sharing the token.
pub(crate) struct ErrorSlot<'r> {
    slot: OnceLock<Error>,
    stop: AtomicBool,
    runner: &'r Runner,
}

impl<'r> ErrorSlot<'r> {
    pub(crate) fn new(runner: &'r Runner) -> Self {
        Self {
            slot: OnceLock::new(),
            stop: AtomicBool::new(false),
            runner,
        }
    }

    /// Record an error (first writer wins) and stop the kernel.
    pub(crate) fn post(&self, e: Error) {
        let _ = self.slot.set(e);
        self.stop.store(true, Ordering::Release);
    }

    /// Should lanes drain instead of working?
    pub(crate) fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire) || self.runner.kill.is_killed()
    }

    /// The recorded error, if any. A bare kill with no posted error reads
    /// back as [`Error::Killed`].
    pub(crate) fn verdict(&self) -> Result<()> {
        if let Some(e) = self.slot.get() {
            return Err(e.clone());
        }
        self.runner.check()
    }
}

/// Partition `count` items into `lanes` shards by the given hash.
///
/// Shard membership is stable for a given lane count, which is all the
/// determinism the kernels need: within a shard, items run in order.
pub(crate) fn shards_by_hash(
    count: usize,
    lanes: usize,
    hash: impl Fn(usize) -> u64,
) -> Vec<Vec<usize>> {
    let lanes = lanes.max(1);
    let mut shards: Vec<Vec<usize>> = vec![Vec::new(); lanes];
    for i in 0..count {
        shards[(hash(i) as usize) % lanes].push(i);
    }
    shards
}

/// Run one closure per shard on the runner's pool and collect the per-shard
/// results in shard order. The closure is expected to poll the kill token
/// between items; this function polls once per shard on its behalf as well.
pub(crate) fn run_shards<S: Send>(
    runner: &Runner,
    shards: Vec<Vec<usize>>,
    work: impl Fn(&[usize]) -> Result<S> + Send + Sync,
) -> Result<Vec<S>> {
    use rayon::prelude::*;

    runner.check()?;
    debug!(
        "scheduling {} shard(s) across {} lane(s)",
        shards.len(),
        runner.lane_count()
    );
    let pool = runner.pool()?;
    pool.install(|| {
        shards
            .par_iter()
            .map(|shard| {
                runner.check()?;
                work(shard)
            })
            .collect()
    })
}
