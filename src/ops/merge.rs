//! Collapsing property-equivalence classes into single vertices.
//!
//! Merge is classify followed by collapse. Each class of the classifier's
//! partition becomes one vertex whose payload is the reduction of the
//! member maps; every original edge becomes an edge between the images of
//! its endpoint classes. With an edge order configured, parallel merged
//! edges agreeing on ⟨label, target class⟩ are fused by the edge
//! reduction; without one, they stay as a multigraph. An optional pruner
//! culls post-merge edges, after which classes left unreachable from the
//! root class are swept.

use crate::contract::{Bop, Order, Payload, Top, Uop};
use crate::error::{Error, Result};
use crate::graph::{Graph, Vid};
use crate::ops::classify::Classifier;
use crate::pool::Pool;
use crate::runner::{Runner, run_shards};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

type Pruner<W, F> = Arc<dyn Fn(&W, &F, &W) -> Result<bool> + Send + Sync>;

/// Operator bundle for [`Graph::merged`].
pub struct Merger<V, E, W, F, CI, CO, CP> {
    classifier: Classifier<V, E, CI, CO, CP>,
    v_map: Uop<V, W>,
    v_reduce: Bop<W>,
    e_map: Top<V, E, F>,
    e_reduce: Option<Bop<F>>,
    v_order: Order<W>,
    e_order: Option<Order<F>>,
    pruner: Option<Pruner<W, F>>,
}

impl<V, E, W, F, CI, CO, CP> Merger<V, E, W, F, CI, CO, CP>
where
    V: Payload,
    E: Payload,
    W: Payload,
    F: Payload,
    CI: Payload,
    CO: Payload,
    CP: Payload,
{
    /// A merger from its classifier, the member map/reduction, the edge
    /// map, and the order of the merged vertex type.
    pub fn new(
        classifier: Classifier<V, E, CI, CO, CP>,
        v_order: Order<W>,
        v_map: impl Fn(&V) -> Result<W> + Send + Sync + 'static,
        v_reduce: impl Fn(W, W) -> Result<W> + Send + Sync + 'static,
        e_map: impl Fn(&V, &E, &V) -> Result<F> + Send + Sync + 'static,
    ) -> Self {
        Self {
            classifier,
            v_map: Arc::new(v_map),
            v_reduce: Arc::new(v_reduce),
            e_map: Arc::new(e_map),
            e_reduce: None,
            v_order,
            e_order: None,
            pruner: None,
        }
    }

    /// Fuse parallel merged edges under this order with this reduction.
    pub fn fusing(
        mut self,
        e_order: Order<F>,
        e_reduce: impl Fn(F, F) -> Result<F> + Send + Sync + 'static,
    ) -> Self {
        self.e_order = Some(e_order);
        self.e_reduce = Some(Arc::new(e_reduce));
        self
    }

    /// Cull merged edges for which the pruner returns true.
    pub fn pruning(
        mut self,
        pruner: impl Fn(&W, &F, &W) -> Result<bool> + Send + Sync + 'static,
    ) -> Self {
        self.pruner = Some(Arc::new(pruner));
        self
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Collapse each class of the merger's classifier into one vertex.
    pub fn merged<W, F, CI, CO, CP>(
        &self,
        m: &Merger<V, E, W, F, CI, CO, CP>,
        runner: &Runner,
    ) -> Result<Graph<W, F>>
    where
        W: Payload,
        F: Payload,
        CI: Payload,
        CO: Payload,
        CP: Payload,
    {
        let assignment = self.class_assignment(&m.classifier, runner)?;
        let lanes = runner.lane_count();

        // representative slot -> dense class id, members in slot order
        let mut class_of_rep: HashMap<usize, usize> = HashMap::new();
        let mut members: Vec<Vec<Vid>> = Vec::new();
        for (v, &rep) in assignment.iter().enumerate() {
            let next = members.len();
            let c = *class_of_rep.entry(rep).or_insert(next);
            if c == members.len() {
                members.push(Vec::new());
            }
            members[c].push(v);
        }
        let class_of = |v: Vid| class_of_rep[&assignment[v]];
        debug!("merge: {} classes", members.len());

        // member payload maps and per-edge label maps, in parallel
        let shards = self.shards(lanes);
        let mapped = run_shards(runner, shards, |shard| {
            let mut out = Vec::with_capacity(shard.len());
            for &v in shard {
                runner.check()?;
                let w = (m.v_map)(&self.verts[v].payload)?;
                let labels = self.verts[v]
                    .out
                    .iter()
                    .map(|e| {
                        (m.e_map)(
                            &self.verts[v].payload,
                            e.label.get(),
                            &self.verts[e.target].payload,
                        )
                    })
                    .collect::<Result<Vec<F>>>()?;
                out.push((v, w, labels));
            }
            Ok(out)
        })?;
        let mut images: Vec<Option<(W, Vec<F>)>> =
            (0..self.verts.len()).map(|_| None).collect();
        for (v, w, labels) in mapped.into_iter().flatten() {
            images[v] = Some((w, labels));
        }

        // fold member images into class payloads, collect mapped edges
        let mut class_payloads: Vec<Option<W>> = (0..members.len()).map(|_| None).collect();
        let mut edges: Vec<(usize, F, usize)> = Vec::new();
        for (v, slot) in images.into_iter().enumerate() {
            let (w, labels) = slot.expect("every vertex mapped");
            let c = class_of(v);
            class_payloads[c] = Some(match class_payloads[c].take() {
                None => w,
                Some(prev) => (m.v_reduce)(prev, w)?,
            });
            for (f, e) in labels.into_iter().zip(self.verts[v].out.iter()) {
                edges.push((c, f, class_of(e.target)));
            }
        }

        // assemble the class graph
        let pool = m.e_order.clone().map(|o| Arc::new(Pool::new(o, lanes)));
        let mut g = Graph {
            verts: Vec::with_capacity(members.len()),
            index: HashMap::new(),
            root: class_of(self.root),
            v_order: m.v_order.clone(),
            e_order: m.e_order.clone(),
            pool,
        };
        for w in class_payloads {
            let w = w.expect("every class folded");
            if g.locate(&w).is_some() {
                return Err(Error::Misuse(
                    "merge folded two distinct classes to equal payloads",
                ));
            }
            g.push_vertex(w);
        }

        match (&m.e_order, &m.e_reduce) {
            (Some(order), Some(reduce)) => {
                // group label-equal parallel edges per (origin, target)
                // pair, then fold each group into one fused edge
                let mut groups: HashMap<(usize, usize, u64), Vec<Vec<F>>> = HashMap::new();
                for (cu, f, cv) in edges {
                    let key = (cu, cv, order.hash_of(&f));
                    let buckets = groups.entry(key).or_default();
                    match buckets.iter_mut().find(|b| order.eq(&b[0], &f)) {
                        Some(b) => b.push(f),
                        None => buckets.push(vec![f]),
                    }
                }
                let mut flat: Vec<(usize, F, usize)> = Vec::new();
                for ((cu, cv, _), buckets) in groups {
                    for bucket in buckets {
                        let mut fs = bucket.into_iter();
                        let mut acc = fs.next().expect("nonempty fusion class");
                        for f in fs {
                            acc = reduce(acc, f)?;
                        }
                        flat.push((cu, acc, cv));
                    }
                }
                flat.sort_by_key(|(cu, _, cv)| (*cu, *cv));
                for (cu, f, cv) in flat {
                    let label = g.make_label(f);
                    g.add_edge(cu, label, cv);
                }
            }
            _ => {
                for (cu, f, cv) in edges {
                    let label = g.make_label(f);
                    g.add_edge(cu, label, cv);
                }
            }
        }

        // pruning, then sweep anything the pruner disconnected
        if let Some(pruner) = &m.pruner {
            for v in 0..g.verts.len() {
                let mut keep = Vec::with_capacity(g.verts[v].out.len());
                for e in &g.verts[v].out {
                    keep.push(!pruner(
                        &g.verts[v].payload,
                        e.label.get(),
                        &g.verts[e.target].payload,
                    )?);
                }
                let mut slot = 0;
                g.verts[v].out.retain(|_| {
                    let k = keep[slot];
                    slot += 1;
                    k
                });
            }
            g.rebuild_backrefs();
            let keep = g.reachable(g.root, false);
            let root = g.root;
            g.retain_vertices(&keep, root);
        } else {
            g.rebuild_backrefs();
        }
        Ok(g)
    }
}
