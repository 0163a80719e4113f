//! Pre-built graphs and helpers for realistic tests.
//!
//! The fixtures are hypercubic: every vertex is a bit pattern, every edge
//! flips one bit and is labeled by the axis. Hypercubes exercise the whole
//! engine — regular degrees, predictable counts, a natural acyclic
//! variant, and enough symmetry to make every kernel's outcome checkable
//! in closed form.

use crate::error::Result;
use crate::graph::Graph;
use crate::ops::build::Builder;
use crate::runner::{KillToken, Runner};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of one bits in a pattern.
pub fn popcount(v: u64) -> u64 {
    v.count_ones() as u64
}

/// Binomial coefficient, ignoring overflow.
pub fn choose(n: u64, k: u64) -> u64 {
    let mut c = 1;
    let mut n = n;
    for d in 1..=k {
        c = c * n / d;
        n -= 1;
    }
    c
}

/// The arrangement recursion the induction fixtures satisfy:
/// `variations(n) = n * (variations(n - 1) + 1)`, `variations(0) = 0`.
pub fn variations(n: u64) -> u64 {
    if n == 0 { 0 } else { n * (variations(n - 1) + 1) }
}

/// A builder for the full hypercube of the given dimension: each vertex
/// has one outgoing edge per axis, labeled by the axis index, to the
/// vertex differing in exactly that bit.
pub fn hypercube_builder(dim: u32) -> Builder<u64, u64> {
    Builder::new(move |v: &u64, edges: &mut crate::ops::build::Connections<u64, u64>| {
        for axis in 0..dim as u64 {
            edges.connect(axis, v ^ (1 << axis));
        }
        Ok(())
    })
    .natural_edge_order()
}

/// As [`hypercube_builder`], but only edges toward the vertex with more
/// one bits survive, making the cube acyclic from 0 up to the maximum.
pub fn acyclic_hypercube_builder(dim: u32) -> Builder<u64, u64> {
    Builder::new(move |v: &u64, edges: &mut crate::ops::build::Connections<u64, u64>| {
        for axis in 0..dim as u64 {
            let w = v ^ (1 << axis);
            if popcount(w) > popcount(*v) {
                edges.connect(axis, w);
            }
        }
        Ok(())
    })
    .natural_edge_order()
}

/// Build the full hypercube.
pub fn hypercube(dim: u32, runner: &Runner) -> Result<Graph<u64, u64>> {
    Graph::build(&hypercube_builder(dim), 0, runner)
}

/// Build the acyclic hypercube.
pub fn acyclic_hypercube(dim: u32, runner: &Runner) -> Result<Graph<u64, u64>> {
    Graph::build(&acyclic_hypercube_builder(dim), 0, runner)
}

/// Tracks how many [`Counted`] values created against it are still alive.
#[derive(Clone, Default)]
pub struct DropLedger(Arc<AtomicUsize>);

impl DropLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live values.
    pub fn live(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

/// A payload wrapper whose instances are counted in a [`DropLedger`],
/// so tests can assert that destruction ran exactly once per value.
pub struct Counted<T> {
    pub value: T,
    ledger: DropLedger,
}

impl<T> Counted<T> {
    pub fn new(value: T, ledger: &DropLedger) -> Self {
        ledger.0.fetch_add(1, Ordering::AcqRel);
        Self {
            value,
            ledger: ledger.clone(),
        }
    }
}

impl<T: Clone> Clone for Counted<T> {
    fn clone(&self) -> Self {
        Counted::new(self.value.clone(), &self.ledger)
    }
}

impl<T> Drop for Counted<T> {
    fn drop(&mut self) {
        self.ledger.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T: std::hash::Hash> std::hash::Hash for Counted<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: PartialEq> PartialEq for Counted<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for Counted<T> {}

impl<T: std::fmt::Debug> std::fmt::Debug for Counted<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// Kills a token after a fixed number of observations.
///
/// There are no intrinsic timeouts in the engine; a caller wanting to
/// bound or fault-inject a kernel wires the kill token to something like
/// this and calls [`TripWire::poll`] from a callback.
pub struct TripWire {
    kill: KillToken,
    limit: usize,
    seen: AtomicUsize,
}

impl TripWire {
    /// Trip `kill` once `limit` observations have been recorded.
    pub fn new(kill: KillToken, limit: usize) -> Self {
        Self {
            kill,
            limit,
            seen: AtomicUsize::new(0),
        }
    }

    /// Record one observation.
    pub fn poll(&self) {
        if self.seen.fetch_add(1, Ordering::AcqRel) + 1 >= self.limit {
            self.kill.kill();
        }
    }

    /// Observations recorded so far.
    pub fn seen(&self) -> usize {
        self.seen.load(Ordering::Acquire)
    }
}
