//! Bypass edges over length-two paths.
//!
//! For every pair of edges ⟨ℓ₁ from v to w⟩ and ⟨ℓ₂ from w to x⟩, if the
//! qualifying predicate holds, a bypass edge from v to x labeled by the
//! qualifying operator is added. Both callbacks see the properties of v
//! and w (when property specs were configured) alongside the two labels.
//!
//! With `fix`, rounds repeat until the graph stops growing; that
//! termination argument rests on ⟨label, target⟩ deduplication, so the
//! fixpoint mode requires the graph to carry an edge order.

use crate::contract::Payload;
use crate::error::{Error, Result};
use crate::fold::{Prop, PropEval};
use crate::graph::{Graph, Marks};
use crate::runner::{Runner, run_shards};
use log::debug;
use std::sync::Arc;

type Qpred<P, Q, E> =
    Arc<dyn Fn(Option<&P>, &E, Option<&Q>, &E) -> Result<bool> + Send + Sync>;
type Qop<P, Q, E> = Arc<dyn Fn(Option<&P>, &E, Option<&Q>, &E) -> Result<E> + Send + Sync>;

/// Operator bundle for [`Graph::compose`].
pub struct Composer<V, E, P = (), Q = ()> {
    qpred: Qpred<P, Q, E>,
    qop: Qop<P, Q, E>,
    local: Option<PropEval<V, E, P>>,
    adjacent: Option<PropEval<V, E, Q>>,
    fix: bool,
}

impl<V: Payload, E: Payload, P: Payload, Q: Payload> Composer<V, E, P, Q> {
    /// A composer from its qualifying predicate and operator. Property
    /// arguments arrive as `None` until specs are attached.
    pub fn new(
        qpred: impl Fn(Option<&P>, &E, Option<&Q>, &E) -> Result<bool> + Send + Sync + 'static,
        qop: impl Fn(Option<&P>, &E, Option<&Q>, &E) -> Result<E> + Send + Sync + 'static,
    ) -> Self {
        Self {
            qpred: Arc::new(qpred),
            qop: Arc::new(qop),
            local: None,
            adjacent: None,
            fix: false,
        }
    }

    /// Property of the local vertex v, surfaced as the first argument.
    pub fn with_local<I: Payload, O: Payload>(mut self, prop: Prop<V, E, I, O, P>) -> Self {
        self.local = Some(prop.eval());
        self
    }

    /// Property of the adjacent vertex w, surfaced as the third argument.
    pub fn with_adjacent<I: Payload, O: Payload>(mut self, prop: Prop<V, E, I, O, Q>) -> Self {
        self.adjacent = Some(prop.eval());
        self
    }

    /// Iterate until the graph stops growing.
    pub fn fixed(mut self) -> Self {
        self.fix = true;
        self
    }
}

impl<V: Payload, E: Payload> Composer<V, E, (), ()> {
    /// A composer consulting only the two labels, no vertex properties.
    pub fn labels_only(
        qpred: impl Fn(&E, &E) -> Result<bool> + Send + Sync + 'static,
        qop: impl Fn(&E, &E) -> Result<E> + Send + Sync + 'static,
    ) -> Self {
        Composer::new(
            move |_, l1, _, l2| qpred(l1, l2),
            move |_, l1, _, l2| qop(l1, l2),
        )
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Add a bypass edge for every qualifying length-two path, optionally
    /// iterating to a fixed point.
    pub fn compose<P: Payload, Q: Payload>(
        &mut self,
        c: &Composer<V, E, P, Q>,
        runner: &Runner,
    ) -> Result<()> {
        if c.fix && self.e_order.is_none() {
            return Err(Error::Misuse(
                "fixed-point composition requires an edge order",
            ));
        }
        let mut round = 0;
        loop {
            runner.check()?;
            let locals = match &c.local {
                Some(eval) => Some(self.all_props(eval, runner)?),
                None => None,
            };
            let adjacents = match &c.adjacent {
                Some(eval) => Some(self.all_props(eval, runner)?),
                None => None,
            };

            let shards = self.shards(runner.lane_count());
            let proposals = run_shards(runner, shards, |shard| {
                let mut out = Vec::new();
                for &v in shard {
                    runner.check()?;
                    let lp = locals.as_ref().map(|ps| &ps[v]);
                    for e1 in &self.verts[v].out {
                        let w = e1.target;
                        let ap = adjacents.as_ref().map(|ps| &ps[w]);
                        for e2 in &self.verts[w].out {
                            if (c.qpred)(lp, e1.label.get(), ap, e2.label.get())? {
                                let label =
                                    (c.qop)(lp, e1.label.get(), ap, e2.label.get())?;
                                out.push((v, label, e2.target));
                            }
                        }
                    }
                }
                Ok(out)
            })?;

            let mut added = 0usize;
            for (v, label, x) in proposals.into_iter().flatten() {
                if !self.has_edge(v, &label, x) {
                    let label = self.make_label(label);
                    self.add_edge(v, label, x);
                    self.verts[v].marks.set(Marks::CHANGED);
                    added += 1;
                }
            }
            round += 1;
            debug!("compose: round {round} added {added} edge(s)");
            if !self.take_changed() || !c.fix {
                return Ok(());
            }
        }
    }

    /// Evaluate an erased property for every vertex, in parallel.
    pub(crate) fn all_props<P: Payload>(
        &self,
        eval: &PropEval<V, E, P>,
        runner: &Runner,
    ) -> Result<Vec<P>> {
        let shards = self.shards(runner.lane_count());
        let mapped = run_shards(runner, shards, |shard| {
            let mut out = Vec::with_capacity(shard.len());
            for &v in shard {
                runner.check()?;
                out.push((v, eval(self, v)?));
            }
            Ok(out)
        })?;
        let mut props: Vec<Option<P>> = (0..self.verts.len()).map(|_| None).collect();
        for (v, p) in mapped.into_iter().flatten() {
            props[v] = Some(p);
        }
        Ok(props
            .into_iter()
            .map(|p| p.expect("every vertex evaluated"))
            .collect())
    }
}
