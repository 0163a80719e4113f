//! The contracts the engine requires of user code.
//!
//! This module defines:
//! - [`Payload`]: the blanket trait bound for vertex and edge payloads.
//! - [`Order<T>`]: a user-supplied hash/equality pair, the basis of vertex
//!   hash-consing and edge deduplication.
//! - The shared callback aliases ([`Nop`], [`Uop`], [`Bop`], [`Top`],
//!   [`Tpred`]) used throughout the operator bundles.
//!
//! Payloads are opaque to the engine: it never inspects them except through
//! the closures the caller hands over. All callbacks are fallible; returning
//! an `Err` aborts the surrounding kernel and surfaces the first such error
//! to the caller.

use crate::error::Result;
use std::hash::{BuildHasher, Hash, RandomState};
use std::sync::Arc;

/// The standard bound for payloads carried by a graph.
///
/// The engine moves payloads across worker lanes, so they must be `'static`
/// and thread-safe. `Clone` is deliberately *not* required; kernels that
/// duplicate payloads (identity fabrication, default postponement) take it
/// as an extra bound on their convenience constructors only.
pub trait Payload: Send + Sync + 'static {}
impl<T> Payload for T where T: Send + Sync + 'static {}

/// Nullary callback producing the identity value of an empty fold.
pub type Nop<R> = Arc<dyn Fn() -> Result<R> + Send + Sync>;

/// Unary map, used by fabricators.
pub type Uop<X, Y> = Arc<dyn Fn(&X) -> Result<Y> + Send + Sync>;

/// Binary reduction over owned values. Must be associative and commutative
/// for deterministic results across lane counts.
pub type Bop<R> = Arc<dyn Fn(R, R) -> Result<R> + Send + Sync>;

/// Ternary edge map: (local vertex payload, label, remote vertex payload).
///
/// For an incident fold the local payload is the edge's target, for an
/// outgoing fold its origin; the remote payload is the far endpoint either
/// way.
pub type Top<V, E, R> = Arc<dyn Fn(&V, &E, &V) -> Result<R> + Send + Sync>;

/// Ternary edge predicate: (origin payload, label, target payload).
pub type Tpred<V, E> = Arc<dyn Fn(&V, &E, &V) -> Result<bool> + Send + Sync>;

/// A total equivalence on `T`, given as a hash function and an equality
/// predicate that must agree with it.
///
/// An order is what makes hash-consing possible: the vertex order is
/// mandatory on builders, while the edge order is optional and switches on
/// label interning and ⟨label, target⟩ deduplication.
pub struct Order<T> {
    hash: Arc<dyn Fn(&T) -> u64 + Send + Sync>,
    equal: Arc<dyn Fn(&T, &T) -> bool + Send + Sync>,
}

impl<T> Clone for Order<T> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash.clone(),
            equal: self.equal.clone(),
        }
    }
}

impl<T: Payload> Order<T> {
    /// Build an order from explicit hash and equality closures.
    pub fn new(
        hash: impl Fn(&T) -> u64 + Send + Sync + 'static,
        equal: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            hash: Arc::new(hash),
            equal: Arc::new(equal),
        }
    }

    /// Derive an order from the payload's own `Hash` and `Eq`.
    ///
    /// This is the common case for endogenous payloads such as integers or
    /// small structs.
    pub fn natural() -> Self
    where
        T: Hash + Eq,
    {
        let state = RandomState::new();
        Self {
            hash: Arc::new(move |t: &T| state.hash_one(t)),
            equal: Arc::new(|a: &T, b: &T| a == b),
        }
    }

    /// Hash one value.
    pub(crate) fn hash_of(&self, t: &T) -> u64 {
        (self.hash)(t)
    }

    /// Test two values for equivalence.
    pub(crate) fn eq(&self, a: &T, b: &T) -> bool {
        (self.equal)(a, b)
    }
}
