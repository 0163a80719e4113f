//! Removing edges (and the vertices they strand).
//!
//! A filter tests each working vertex's edges — outgoing ones in a forward
//! zone, incident ones backward — through a map that condemns an edge by
//! returning `None`. With a reduction, edges of one origin whose labels are
//! equal under the filter order form a class: the class fold starts from
//! the mandatory vacuous seed, reduces each mapped image in, and a `None`
//! anywhere condemns the whole class. An optional vertex test removes
//! vertices wholesale.
//!
//! After removal, vertices that can no longer be reached from the zone's
//! initial vertex (in the zone's direction) are destroyed, and the graph is
//! re-rooted at that initial vertex.

use crate::contract::{Nop, Payload};
use crate::error::{Error, Result};
use crate::fold::{Prop, PropEval};
use crate::graph::{Graph, Marks, Vid};
use crate::runner::{Runner, run_shards, shards_by_hash};
use crate::zone::{Zone, working_set};
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

type EdgeMap<V, E, M> = Arc<dyn Fn(&V, &E, &V) -> Result<Option<M>> + Send + Sync>;
type ClassReduce<M> = Arc<dyn Fn(M, M) -> Result<Option<M>> + Send + Sync>;

/// The edge-side test of a filter.
pub struct EdgeTest<V, E, M> {
    map: EdgeMap<V, E, M>,
    reduce: Option<ClassReduce<M>>,
    vacuous: Option<Nop<M>>,
}

impl<V: Payload, E: Payload> EdgeTest<V, E, ()> {
    /// A plain predicate: the edge survives iff it returns true.
    pub fn predicate(
        pred: impl Fn(&V, &E, &V) -> Result<bool> + Send + Sync + 'static,
    ) -> Self {
        EdgeTest {
            map: Arc::new(move |l, e, r| Ok(pred(l, e, r)?.then_some(()))),
            reduce: None,
            vacuous: None,
        }
    }
}

impl<V: Payload, E: Payload, M: Payload> EdgeTest<V, E, M> {
    /// A test from its map; `None` condemns the edge.
    pub fn new(
        map: impl Fn(&V, &E, &V) -> Result<Option<M>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            map: Arc::new(map),
            reduce: None,
            vacuous: None,
        }
    }

    /// Fold label-equal edges as one class; `None` from the reduction
    /// condemns the class. Requires a filter order and a vacuous seed.
    pub fn reducing(
        mut self,
        reduce: impl Fn(M, M) -> Result<Option<M>> + Send + Sync + 'static,
    ) -> Self {
        self.reduce = Some(Arc::new(reduce));
        self
    }

    /// The seed of the class fold.
    pub fn vacuously(mut self, vacuous: impl Fn() -> Result<M> + Send + Sync + 'static) -> Self {
        self.vacuous = Some(Arc::new(vacuous));
        self
    }
}

/// Operator bundle for [`Graph::filter`].
pub struct Filter<V, E, M = ()> {
    zone: Option<Zone<V>>,
    order: Option<crate::contract::Order<E>>,
    e_test: EdgeTest<V, E, M>,
    v_test: Option<PropEval<V, E, bool>>,
}

impl<V: Payload, E: Payload, M: Payload> Filter<V, E, M> {
    /// A whole-graph filter from an edge test.
    pub fn new(e_test: EdgeTest<V, E, M>) -> Self {
        Self {
            zone: None,
            order: None,
            e_test,
            v_test: None,
        }
    }

    /// Restrict the filter to a zone.
    pub fn zoned(mut self, zone: Zone<V>) -> Self {
        self.zone = Some(zone);
        self
    }

    /// The label equivalence grouping edges into classes for the reducing
    /// form of the test.
    pub fn order(mut self, order: crate::contract::Order<E>) -> Self {
        self.order = Some(order);
        self
    }

    /// Also remove every vertex whose property comes back false.
    pub fn vertex_test<I: Payload, O: Payload>(
        mut self,
        prop: Prop<V, E, I, O, bool>,
    ) -> Self {
        self.v_test = Some(prop.eval());
        self
    }
}

struct Condemned {
    edges: Vec<(Vid, usize)>,
    vertices: Vec<Vid>,
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Remove every edge failing the filter's test, then every vertex left
    /// unreachable from the zone's initial vertex, which becomes the root.
    pub fn filter<M: Payload>(&mut self, f: &Filter<V, E, M>, runner: &Runner) -> Result<()> {
        if f.e_test.reduce.is_some() && f.order.is_none() {
            return Err(Error::Misuse("a reducing edge test requires a filter order"));
        }
        if f.e_test.reduce.is_some() && f.e_test.vacuous.is_none() {
            return Err(Error::Misuse("a reducing edge test requires a vacuous seed"));
        }
        let ws = working_set(self, f.zone.as_ref())?;
        debug!("filter: {} working vertices", ws.members.len());

        let shards = shards_by_hash(ws.members.len(), runner.lane_count(), |i| {
            self.v_order.hash_of(&self.verts[ws.members[i]].payload)
        });
        let verdicts = run_shards(runner, shards, |shard| {
            let mut out = Condemned {
                edges: Vec::new(),
                vertices: Vec::new(),
            };
            for &i in shard {
                runner.check()?;
                let v = ws.members[i];
                if let Some(test) = &f.v_test {
                    if !test(self, v)? {
                        out.vertices.push(v);
                        continue;
                    }
                }
                self.test_edges(f, v, ws.backwards, &mut out)?;
            }
            Ok(out)
        })?;

        // serial apply: mark condemned vertices, drop condemned edges
        self.clear_marks();
        let mut gone_edges: HashMap<Vid, Vec<bool>> = HashMap::new();
        for c in &verdicts {
            for &v in &c.vertices {
                self.verts[v].marks.set(Marks::DELETED);
            }
            for &(origin, slot) in &c.edges {
                gone_edges
                    .entry(origin)
                    .or_insert_with(|| vec![false; self.verts[origin].out.len()])[slot] = true;
            }
        }
        for (origin, gone) in &gone_edges {
            let mut slot = 0;
            self.verts[*origin].out.retain(|_| {
                let keep = !gone[slot];
                slot += 1;
                keep
            });
        }
        self.rebuild_backrefs();

        // reachability in the zone's direction, skipping condemned vertices
        if self.verts[ws.initial].marks.test(Marks::DELETED) {
            self.clear_marks();
            return Err(Error::VertexNotFound);
        }
        let mut keep = vec![false; self.verts.len()];
        let mut queue = VecDeque::from([ws.initial]);
        keep[ws.initial] = true;
        while let Some(v) = queue.pop_front() {
            let mut push = |w: Vid| {
                if !keep[w] && !self.verts[w].marks.test(Marks::DELETED) {
                    keep[w] = true;
                    queue.push_back(w);
                }
            };
            if ws.backwards {
                self.verts[v].inc.iter().for_each(|b| push(b.origin));
            } else {
                self.verts[v].out.iter().for_each(|e| push(e.target));
            }
        }
        self.retain_vertices(&keep, ws.initial);
        debug!("filter: {} vertices kept", self.verts.len());
        Ok(())
    }

    fn test_edges<M: Payload>(
        &self,
        f: &Filter<V, E, M>,
        v: Vid,
        backwards: bool,
        out: &mut Condemned,
    ) -> Result<()> {
        // (edge id, local payload, label, remote payload)
        let edges: Vec<((Vid, usize), &V, &E, &V)> = if backwards {
            self.verts[v]
                .inc
                .iter()
                .map(|b| {
                    let e = &self.verts[b.origin].out[b.slot];
                    (
                        (b.origin, b.slot),
                        &self.verts[v].payload,
                        e.label.get(),
                        &self.verts[b.origin].payload,
                    )
                })
                .collect()
        } else {
            self.verts[v]
                .out
                .iter()
                .enumerate()
                .map(|(slot, e)| {
                    (
                        (v, slot),
                        &self.verts[v].payload,
                        e.label.get(),
                        &self.verts[e.target].payload,
                    )
                })
                .collect()
        };

        match (&f.e_test.reduce, &f.order) {
            (Some(reduce), Some(order)) => {
                // group label-equal edges into classes
                let mut classes: HashMap<u64, Vec<Vec<usize>>> = HashMap::new();
                for (i, &(_, _, label, _)) in edges.iter().enumerate() {
                    let h = order.hash_of(label);
                    let bucket = classes.entry(h).or_default();
                    match bucket
                        .iter_mut()
                        .find(|c| order.eq(edges[c[0]].2, label))
                    {
                        Some(class) => class.push(i),
                        None => bucket.push(vec![i]),
                    }
                }
                let vacuous = f.e_test.vacuous.as_ref().unwrap();
                for class in classes.into_values().flatten().collect::<Vec<_>>() {
                    let mut acc = Some(vacuous()?);
                    for &i in &class {
                        let (_, local, label, remote) = edges[i];
                        let (Some(prev), Some(m)) =
                            (acc.take(), (f.e_test.map)(local, label, remote)?)
                        else {
                            acc = None;
                            break;
                        };
                        acc = reduce(m, prev)?;
                    }
                    if acc.is_none() {
                        for &i in &class {
                            out.edges.push(edges[i].0);
                        }
                    }
                }
            }
            _ => {
                for (id, local, label, remote) in edges {
                    if (f.e_test.map)(local, label, remote)?.is_none() {
                        out.edges.push(id);
                    }
                }
            }
        }
        Ok(())
    }
}
