//! The traversal kernels and their operator bundles.
//!
//! Every kernel follows the same skeleton: derive the working set from the
//! zone, shard it across lanes, run the kernel-specific per-vertex
//! procedure, converge at the barrier, optionally iterate to a fixed point,
//! and finalize serially. Each kernel consumes exactly one bundle value
//! naming its callbacks and policy knobs; the bundles live next to their
//! kernels and are re-exported at the crate root.

pub mod build;
pub mod classify;
pub mod compose;
pub mod fabricate;
pub mod filter;
pub mod induce;
pub mod mapreduce;
pub mod merge;
pub mod mutate;
pub mod postpone;
pub mod split;
pub mod spread;
pub mod stretch;
