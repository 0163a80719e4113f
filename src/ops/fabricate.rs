//! Cloning a graph, optionally through payload maps.
//!
//! Fabrication copies the structure exactly — same vertices, same edge
//! lists in the same order — while the payloads pass through arity-one
//! maps. The result shares no ownership with the source; both are
//! independently usable. The empty default ([`Graph::cloned`]) is the
//! identity fabricator over `Clone` payloads.

use crate::contract::{Order, Payload, Uop};
use crate::error::{Error, Result};
use crate::graph::{EdgeRecord, Graph};
use crate::pool::Pool;
use crate::runner::{Runner, run_shards};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Operator bundle for [`Graph::fabricated`].
pub struct Fabricator<V, E, W, F> {
    v_fab: Uop<V, W>,
    e_fab: Uop<E, F>,
    v_order: Order<W>,
    e_order: Option<Order<F>>,
}

impl<V: Payload, E: Payload, W: Payload, F: Payload> Fabricator<V, E, W, F> {
    /// A fabricator from its two payload maps and the order of the new
    /// vertex type.
    pub fn new(
        v_order: Order<W>,
        v_fab: impl Fn(&V) -> Result<W> + Send + Sync + 'static,
        e_fab: impl Fn(&E) -> Result<F> + Send + Sync + 'static,
    ) -> Self {
        Self {
            v_fab: Arc::new(v_fab),
            e_fab: Arc::new(e_fab),
            v_order,
            e_order: None,
        }
    }

    /// Configure an edge order for the fabricated graph (labels are then
    /// pooled).
    pub fn edge_order(mut self, e_order: Order<F>) -> Self {
        self.e_order = Some(e_order);
        self
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Clone the graph through the fabricator's maps.
    pub fn fabricated<W: Payload, F: Payload>(
        &self,
        fab: &Fabricator<V, E, W, F>,
        runner: &Runner,
    ) -> Result<Graph<W, F>> {
        debug!("fabricate: {} vertices", self.verts.len());
        let shards = self.shards(runner.lane_count());
        let mapped = run_shards(runner, shards, |shard| {
            let mut out = Vec::with_capacity(shard.len());
            for &v in shard {
                runner.check()?;
                let w = (fab.v_fab)(&self.verts[v].payload)?;
                let labels = self.verts[v]
                    .out
                    .iter()
                    .map(|e| (fab.e_fab)(e.label.get()))
                    .collect::<Result<Vec<F>>>()?;
                out.push((v, w, labels));
            }
            Ok(out)
        })?;

        let lanes = runner.lane_count();
        let pool = fab
            .e_order
            .clone()
            .map(|o| Arc::new(Pool::new(o, lanes)));
        let mut slots: Vec<Option<(W, Vec<F>)>> = (0..self.verts.len()).map(|_| None).collect();
        for (v, w, labels) in mapped.into_iter().flatten() {
            slots[v] = Some((w, labels));
        }

        let mut g = Graph {
            verts: Vec::with_capacity(self.verts.len()),
            index: HashMap::new(),
            root: self.root,
            v_order: fab.v_order.clone(),
            e_order: fab.e_order.clone(),
            pool,
        };
        for (v, slot) in slots.into_iter().enumerate() {
            let (w, labels) = slot.expect("every vertex fabricated");
            if g.locate(&w).is_some() {
                return Err(Error::Misuse(
                    "fabrication mapped two distinct vertices to equal images",
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
        Ok(g)
    }

    /// The empty-default fabricator: a structural clone with identical
    /// payloads, sharing nothing with the source.
    pub fn cloned(&self, runner: &Runner) -> Result<Graph<V, E>>
    where
        V: Clone,
        E: Clone,
    {
        let mut fab = Fabricator::new(
            self.v_order.clone(),
            |v: &V| Ok(v.clone()),
            |e: &E| Ok(e.clone()),
        );
        if let Some(o) = self.e_order.clone() {
            fab = fab.edge_order(o);
        }
        self.fabricated(&fab, runner)
    }
}
