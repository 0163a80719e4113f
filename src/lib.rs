//! # Trestle
//!
//! A **parallel graph transformation engine** for Rust. Trestle builds,
//! analyzes, and rewrites labeled directed multigraphs whose vertices and
//! edges carry arbitrary user-defined payloads, spreading every operation
//! across a configurable number of worker *lanes* and keeping it
//! cancellable throughout.
//!
//! ## Key Features
//!
//! - **Connector-driven construction** - describe a vertex's outgoing
//!   edges and let the engine run the traversal to its fixed point
//! - **A closed kernel family** - build, spread, mutate, filter,
//!   fabricate, mapreduce, merge, compose, split, postpone, induce,
//!   stretch, and partition
//! - **Hash-consing** - vertices are deduplicated under a user-supplied
//!   order; edge labels are interned when an edge order is configured
//! - **Lane parallelism** - every kernel shards its work by vertex hash;
//!   a lane count of 0 means one lane per hardware thread
//! - **Cooperative cancellation** - a shared kill token is polled at every
//!   task boundary
//! - **Type-safe** - payloads are generic parameters, callbacks are typed
//!   closures, failures are a closed error enum
//!
//! ## Quick Start
//!
//! ```
//! use trestle::{Builder, Graph, Runner};
//!
//! # fn main() -> trestle::Result<()> {
//! // A 3-dimensional hypercube: from each vertex, one edge per axis to
//! // the vertex differing in that bit.
//! let builder = Builder::new(|v: &u64, edges| {
//!     for axis in 0..3u64 {
//!         edges.connect(axis, v ^ (1 << axis));
//!     }
//!     Ok(())
//! })
//! .natural_edge_order();
//!
//! let runner = Runner::with_lanes(3);
//! let cube = Graph::build(&builder, 0u64, &runner)?;
//!
//! assert_eq!(cube.vertex_count(&runner)?, 8);
//! assert_eq!(cube.edge_count(&runner)?, 24);
//! cube.free_now(&runner)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### `Graph`
//!
//! A [`Graph<V, E>`] owns its vertices, their insertion-ordered outgoing
//! edge lists, and the incoming back-references. It always holds exactly
//! the vertices reachable from its root. Between kernel calls the graph is
//! inert data; during a call it is owned by that kernel.
//!
//! ### Operator bundles
//!
//! Each kernel consumes one bundle value naming its callbacks and policy
//! knobs: [`Builder`], [`Mutator`], [`Filter`], [`Fabricator`],
//! [`Mapreducer`], [`Merger`], [`Composer`], [`Splitter`], [`Postponer`],
//! [`Inducer`], [`Stretcher`], and [`Classifier`]. Callbacks are plain
//! closures returning [`Result`]; the first failure on any lane aborts the
//! kernel.
//!
//! ### Properties and folds
//!
//! Most kernels consume per-vertex *properties* computed by the fold
//! machinery: a [`Fold`] map-reduces one side of a vertex's edges, and a
//! [`Prop`] combines an incident fold, an outgoing fold, and a vertex map
//! into the property value. See [`Mapreducer`] for the whole-graph fold.
//!
//! ### Zones
//!
//! A [`Zone`] restricts a kernel to the subgraph reachable from an initial
//! vertex in a direction, after skipping `offset` traversal levels. An
//! absent zone means the entire graph.
//!
//! ### Partitions
//!
//! The classifying kernels produce a [`Partition`] — a union–find over the
//! graph's vertices supporting `class_of`, `class_size`, and transitive
//! `unite`.
//!
//! ### Lanes and cancellation
//!
//! A [`Runner`] carries the lane count, the [`KillToken`], and the crew
//! queue depth. Kill a token from any thread and every kernel sharing it
//! drains, converges, and returns [`Error::Killed`]. There are no
//! intrinsic timeouts; wire the token to your own timer if you need one.
//!
//! ## Error Handling
//!
//! Every kernel returns `Result<_, Error>` over the closed taxonomy in
//! [`Error`]: resource exhaustion, callback failure, misuse, killed,
//! cyclic (induction only), and vertex-not-found. A failed kernel leaves
//! its input either fully transformed or untouched; kernels that build a
//! fresh value destroy the partial result before returning.
//!
//! ## Testing Your Graphs
//!
//! The [`testing`] module ships structural assertions
//! (`assert_same_shape`, degree checks), hypercube fixtures, counting
//! payloads for destructor accounting, and a `TripWire` for wiring kill
//! tokens to fault-injection counters.
//!
//! ## Module Overview
//!
//! - [`graph`] - the vertex/edge store and its read accessors
//! - [`contract`] - payload bounds, orders, and callback aliases
//! - [`fold`] - the per-vertex map-reduce machinery
//! - [`ops`] - the kernel family and operator bundles
//! - [`partition`] - union–find over vertices
//! - [`runner`] - lanes, kill tokens, and scheduling
//! - [`zone`] - reachable-subgraph selectors
//! - [`error`] - the error taxonomy
//! - [`testing`] - assertions, fixtures, and fault injection

pub mod contract;
pub mod error;
pub mod fold;
pub mod graph;
pub mod ops;
pub mod partition;
pub mod runner;
pub mod testing;
pub mod zone;

mod crew;
mod pool;

// General re-exports
pub use contract::{Order, Payload};
pub use error::{Error, Result, fail};
pub use fold::{Fold, Prop};
pub use graph::Graph;
pub use partition::{Class, Partition};
pub use runner::{KillToken, Runner};
pub use zone::{Direction, Zone};

// Operator bundle re-exports
pub use ops::build::{Builder, Connections};
pub use ops::classify::Classifier;
pub use ops::compose::Composer;
pub use ops::fabricate::Fabricator;
pub use ops::filter::{EdgeTest, Filter};
pub use ops::induce::Inducer;
pub use ops::mapreduce::Mapreducer;
pub use ops::merge::Merger;
pub use ops::mutate::{EdgePlan, Mutator};
pub use ops::postpone::Postponer;
pub use ops::split::{Ctops, Labeler, SplitSide, Splitter};
pub use ops::stretch::{Stretched, Stretcher};
