//! Testing utilities for trestle graphs.
//!
//! This module provides what the crate's own test suite is built from and
//! what downstream users need to test their transformations:
//!
//! - **Assertions**: structural equality of graphs, degree regularity,
//!   partition shape
//! - **Fixtures**: hypercube builders and the combinatorial helpers that
//!   predict their shapes
//! - **Destructor accounting**: the [`Counted`] payload tracks live
//!   instances so a test can assert that every payload was dropped
//!   exactly once
//! - **Fault injection**: a [`TripWire`] kills a shared token after a
//!   fixed number of observations, driving the cancellation paths
//!   deterministically
//!
//! # Quick Start
//!
//! ```
//! use trestle::{Graph, Runner};
//! use trestle::testing::*;
//!
//! # fn main() -> trestle::Result<()> {
//! let runner = Runner::with_lanes(2);
//! let cube = Graph::build(&hypercube_builder(4), 0, &runner)?;
//! assert_regular(&cube, 4, 4);
//! assert_eq!(cube.vertex_count(&runner)?, 16);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
