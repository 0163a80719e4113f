//! Rewriting every vertex payload and edge label.
//!
//! Mutation is a two-phase plan. Phase one computes the image of every
//! vertex through a full property spec — the folds see the pre-image
//! neighborhood. A barrier, then phase two computes the image of every
//! label: under the *local-first* plan the edge map observes the rewritten
//! endpoint payloads, under *remote-first* the pre-image ones. The result
//! is assembled only after both phases succeed, so a failed mutation
//! leaves the source untouched.

use crate::contract::{Order, Payload};
use crate::error::{Error, Result};
use crate::fold::Prop;
use crate::graph::{EdgeRecord, Graph};
use crate::pool::Pool;
use crate::runner::{Runner, run_shards};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

type LocalEdgeOp<W, E, F> = Arc<dyn Fn(&W, &E, &W) -> Result<F> + Send + Sync>;
type RemoteEdgeOp<V, E, F> = Arc<dyn Fn(&V, &E, &V) -> Result<F> + Send + Sync>;

/// Which image of the adjacent vertices an edge map observes.
pub enum EdgePlan<V, E, W, F> {
    /// Vertices are rewritten first; the edge map sees the new payloads.
    LocalFirst(LocalEdgeOp<W, E, F>),
    /// The edge map sees the pre-image payloads; the vertex rewrite lands
    /// afterwards.
    RemoteFirst(RemoteEdgeOp<V, E, F>),
}

/// Operator bundle for [`Graph::mutated`].
pub struct Mutator<V, E, W, F, I = (), O = ()> {
    v_op: Prop<V, E, I, O, W>,
    e_op: EdgePlan<V, E, W, F>,
    v_order: Order<W>,
    e_order: Option<Order<F>>,
}

impl<V: Payload, E: Payload, W: Payload, F: Payload, I: Payload, O: Payload>
    Mutator<V, E, W, F, I, O>
{
    /// A local-first mutator: vertex images first, edge maps over them.
    pub fn local_first(
        v_op: Prop<V, E, I, O, W>,
        v_order: Order<W>,
        e_op: impl Fn(&W, &E, &W) -> Result<F> + Send + Sync + 'static,
    ) -> Self {
        Self {
            v_op,
            e_op: EdgePlan::LocalFirst(Arc::new(e_op)),
            v_order,
            e_order: None,
        }
    }

    /// A remote-first mutator: edge maps over the pre-image payloads.
    pub fn remote_first(
        v_op: Prop<V, E, I, O, W>,
        v_order: Order<W>,
        e_op: impl Fn(&V, &E, &V) -> Result<F> + Send + Sync + 'static,
    ) -> Self {
        Self {
            v_op,
            e_op: EdgePlan::RemoteFirst(Arc::new(e_op)),
            v_order,
            e_order: None,
        }
    }

    /// Configure an edge order for the mutated graph; rewritten edges that
    /// collide on ⟨label, target⟩ are then deduplicated.
    pub fn edge_order(mut self, e_order: Order<F>) -> Self {
        self.e_order = Some(e_order);
        self
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Rewrite the graph through the mutator's two-phase plan.
    pub fn mutated<W: Payload, F: Payload, I: Payload, O: Payload>(
        &self,
        m: &Mutator<V, E, W, F, I, O>,
        runner: &Runner,
    ) -> Result<Graph<W, F>> {
        debug!("mutate: {} vertices", self.verts.len());
        let lanes = runner.lane_count();

        // phase 1: vertex images over the pre-image neighborhood
        let shards = self.shards(lanes);
        let mapped = run_shards(runner, shards.clone(), |shard| {
            let mut out = Vec::with_capacity(shard.len());
            for &v in shard {
                runner.check()?;
                out.push((v, m.v_op.at(self, v)?));
            }
            Ok(out)
        })?;
        let mut images: Vec<Option<W>> = (0..self.verts.len()).map(|_| None).collect();
        for (v, w) in mapped.into_iter().flatten() {
            images[v] = Some(w);
        }
        let images: Vec<W> = images
            .into_iter()
            .map(|w| w.expect("every vertex mutated"))
            .collect();

        // phase 2: edge images under the configured plan
        let relabeled = run_shards(runner, shards, |shard| {
            let mut out = Vec::with_capacity(shard.len());
            for &v in shard {
                runner.check()?;
                let labels = self.verts[v]
                    .out
                    .iter()
                    .map(|e| match &m.e_op {
                        EdgePlan::LocalFirst(f) => {
                            f(&images[v], e.label.get(), &images[e.target])
                        }
                        EdgePlan::RemoteFirst(f) => f(
                            &self.verts[v].payload,
                            e.label.get(),
                            &self.verts[e.target].payload,
                        ),
                    })
                    .collect::<Result<Vec<F>>>()?;
                out.push((v, labels));
            }
            Ok(out)
        })?;
        let mut label_slots: Vec<Option<Vec<F>>> =
            (0..self.verts.len()).map(|_| None).collect();
        for (v, labels) in relabeled.into_iter().flatten() {
            label_slots[v] = Some(labels);
        }

        // assembly
        let pool = m.e_order.clone().map(|o| Arc::new(Pool::new(o, lanes)));
        let mut g = Graph {
            verts: Vec::with_capacity(self.verts.len()),
            index: HashMap::new(),
            root: self.root,
            v_order: m.v_order.clone(),
            e_order: m.e_order.clone(),
            pool,
        };
        for (v, (w, labels)) in images
            .into_iter()
            .zip(label_slots.into_iter().map(Option::unwrap))
            .enumerate()
        {
            if g.locate(&w).is_some() {
                return Err(Error::Misuse(
                    "mutation mapped two distinct vertices to equal images",
                ));
            }
            let vid = g.push_vertex(w);
            debug_assert_eq!(vid, v);
            let out: Vec<EdgeRecord<F>> = labels
                .into_iter()
                .zip(self.verts[v].out.iter())
                .map(|(f, e)| EdgeRecord {
                    label: g.make_label(f),
                    target: e.target,
                })
                .collect();
            g.verts[vid].out = out;
        }
        g.rebuild_backrefs();
        g.dedup_edges();
        Ok(g)
    }
}
