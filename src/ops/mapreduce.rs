//! Whole-graph fold: one scalar from every vertex's property.
//!
//! Reuses the per-vertex fold machinery, then reduces the per-vertex
//! results pairwise — first within each lane's shard, then across the
//! shards at the barrier. Determinism across lane counts follows from the
//! user reduction being associative and commutative.

use crate::contract::{Bop, Payload};
use crate::error::{Error, Result};
use crate::fold::Prop;
use crate::graph::Graph;
use crate::runner::{Runner, run_shards};
use std::sync::Arc;

/// Operator bundle for [`Graph::mapreduced`].
pub struct Mapreducer<V, E, I, O, P> {
    prop: Prop<V, E, I, O, P>,
    reduce: Bop<P>,
}

impl<V: Payload, E: Payload, I: Payload, O: Payload, P: Payload> Mapreducer<V, E, I, O, P> {
    /// A mapreducer from a property spec and the cross-vertex reduction.
    pub fn new(
        prop: Prop<V, E, I, O, P>,
        reduce: impl Fn(P, P) -> Result<P> + Send + Sync + 'static,
    ) -> Self {
        Self {
            prop,
            reduce: Arc::new(reduce),
        }
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Fold every vertex's property into a single value.
    pub fn mapreduced<I: Payload, O: Payload, P: Payload>(
        &self,
        m: &Mapreducer<V, E, I, O, P>,
        runner: &Runner,
    ) -> Result<P> {
        let shards = self.shards(runner.lane_count());
        let partials = run_shards(runner, shards, |shard| {
            let mut acc: Option<P> = None;
            for &v in shard {
                runner.check()?;
                let p = m.prop.at(self, v)?;
                acc = Some(match acc {
                    None => p,
                    Some(prev) => (m.reduce)(prev, p)?,
                });
            }
            Ok(acc)
        })?;
        let mut total: Option<P> = None;
        for p in partials.into_iter().flatten() {
            total = Some(match total {
                None => p,
                Some(prev) => (m.reduce)(prev, p)?,
            });
        }
        total.ok_or(Error::Misuse("mapreduce over an empty graph"))
    }
}
