//! Graph construction by fixed-point traversal from a root.
//!
//! The connector is invoked once per newly discovered vertex; each
//! `connect` call it makes is resolved through the hash-cons shard of the
//! target's owning lane, and unseen targets are enqueued for their own
//! connector invocation. The build terminates when every enqueued vertex
//! has been processed.
//!
//! Ownership of a candidate vertex is decided by hash: the lane owning
//! `hash(v) % lanes` holds the only cons shard that can admit it, so no two
//! lanes ever race on one vertex. Edge records belong to their origin; the
//! label of a discovered edge travels *with* the adoption request (the
//! subconnector wants to see it) and comes back in the resolution reply
//! that tells the origin which arena slot the target landed in.

use crate::contract::{Order, Payload};
use crate::crew::{self, Outbox};
use crate::error::Result;
use crate::graph::{EdgeRecord, Graph, Label, VertexRecord};
use crate::pool::Pool;
use crate::runner::Runner;
use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Sink handed to a connector; each `connect` declares one outgoing edge of
/// the vertex under construction.
pub struct Connections<V, E> {
    pub(crate) edges: Vec<(E, V)>,
}

impl<V, E> Connections<V, E> {
    pub(crate) fn new() -> Self {
        Self { edges: Vec::new() }
    }

    /// Declare an outgoing edge labeled `label` to the vertex equal to
    /// `target` (which is created if it has not been seen).
    pub fn connect(&mut self, label: E, target: V) {
        self.edges.push((label, target));
    }
}

type PlainConnector<V, E> =
    Arc<dyn Fn(&V, &mut Connections<V, E>) -> Result<()> + Send + Sync>;
type SubConnector<V, E> =
    Arc<dyn Fn(Option<&E>, &V, &mut Connections<V, E>) -> Result<()> + Send + Sync>;

pub(crate) enum Connector<V, E> {
    Plain(PlainConnector<V, E>),
    /// As `Plain`, but the callback also sees the label of the edge the
    /// vertex was discovered through — `None` for the root (and for the
    /// re-visits a spread performs).
    Sub(SubConnector<V, E>),
}

/// Operator bundle for [`Graph::build`] and [`Graph::spread`].
pub struct Builder<V, E> {
    pub(crate) connector: Connector<V, E>,
    pub(crate) v_order: Order<V>,
    pub(crate) e_order: Option<Order<E>>,
}

impl<V: Payload, E: Payload> Builder<V, E> {
    /// A builder over naturally ordered payloads.
    pub fn new(
        connector: impl Fn(&V, &mut Connections<V, E>) -> Result<()> + Send + Sync + 'static,
    ) -> Self
    where
        V: Hash + Eq,
    {
        Self::ordered(Order::natural(), connector)
    }

    /// A builder with an explicit vertex order.
    pub fn ordered(
        v_order: Order<V>,
        connector: impl Fn(&V, &mut Connections<V, E>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            connector: Connector::Plain(Arc::new(connector)),
            v_order,
            e_order: None,
        }
    }

    /// A builder whose connector also receives the incident edge label
    /// (`None` at the root).
    pub fn subconnected(
        v_order: Order<V>,
        connector: impl Fn(Option<&E>, &V, &mut Connections<V, E>) -> Result<()>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            connector: Connector::Sub(Arc::new(connector)),
            v_order,
            e_order: None,
        }
    }

    /// Configure an edge order, enabling label interning and
    /// ⟨label, target⟩ deduplication of outgoing edges.
    pub fn edge_order(mut self, e_order: Order<E>) -> Self {
        self.e_order = Some(e_order);
        self
    }

    /// Natural edge order shorthand.
    pub fn natural_edge_order(self) -> Self
    where
        E: Hash + Eq,
    {
        self.edge_order(Order::natural())
    }
}

// |---------------------|
// | Per-lane build state |
// |---------------------|

const UNRESOLVED: u64 = u64::MAX;

pub(crate) struct PendingEdge<E> {
    pub(crate) label: Option<Label<E>>,
    pub(crate) target: u64,
}

pub(crate) struct BuildVertex<V, E> {
    pub(crate) payload: V,
    pub(crate) out: Vec<PendingEdge<E>>,
    pub(crate) inc: Vec<(u64, usize)>,
}

pub(crate) struct Store<V, E> {
    pub(crate) verts: Vec<BuildVertex<V, E>>,
    pub(crate) index: HashMap<u64, Vec<usize>>,
    pub(crate) root: Option<usize>,
}

impl<V: Payload, E: Payload> Store<V, E> {
    pub(crate) fn empty() -> Self {
        Self {
            verts: Vec::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    fn admit(&mut self, order: &Order<V>, payload: V) -> (usize, bool) {
        let h = order.hash_of(&payload);
        let bucket = self.index.entry(h).or_default();
        for &slot in bucket.iter() {
            if order.eq(&self.verts[slot].payload, &payload) {
                return (slot, false);
            }
        }
        let slot = self.verts.len();
        bucket.push(slot);
        self.verts.push(BuildVertex {
            payload,
            out: Vec::new(),
            inc: Vec::new(),
        });
        (slot, true)
    }
}

pub(crate) enum Task<V, E> {
    /// Take custody of a candidate vertex, wiring the edge that found it.
    Adopt {
        payload: V,
        label: Option<Label<E>>,
        origin: Option<(u64, usize)>,
        initial: bool,
    },
    /// Reply to the origin lane: its edge `edge` of vertex `origin_slot`
    /// points at `target` and carries `label`.
    Resolve {
        origin_slot: usize,
        edge: usize,
        target: u64,
        label: Option<Label<E>>,
    },
    /// Re-run the connector on an existing vertex (spread).
    Visit { slot: usize },
}

pub(crate) fn pack(lane: usize, slot: usize) -> u64 {
    ((lane as u64) << 32) | slot as u64
}

fn unpack(vid: u64) -> (usize, usize) {
    ((vid >> 32) as usize, (vid & u32::MAX as u64) as usize)
}

/// One task's worth of building, shared by build and spread.
///
/// `order` is the vertex order actually governing the stores — the
/// builder's on a fresh build, the graph's own on a spread.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_task<V: Payload, E: Payload>(
    me: usize,
    store: &mut Store<V, E>,
    task: Task<V, E>,
    outbox: &mut Outbox<'_, Task<V, E>>,
    connector: &Connector<V, E>,
    order: &Order<V>,
    pool: &Option<Arc<Pool<E>>>,
) -> Result<()> {
    match task {
        Task::Adopt {
            payload,
            label,
            origin,
            initial,
        } => {
            let (slot, fresh) = store.admit(order, payload);
            if initial {
                store.root = Some(slot);
            }
            if fresh {
                connect_out(me, store, slot, label.as_ref(), initial, outbox, connector, order, pool)?;
            }
            if let Some((ovid, oslot)) = origin {
                store.verts[slot].inc.push((ovid, oslot));
                let (olane, olocal) = unpack(ovid);
                outbox.post(
                    olane,
                    Task::Resolve {
                        origin_slot: olocal,
                        edge: oslot,
                        target: pack(me, slot),
                        label,
                    },
                );
            }
            Ok(())
        }
        Task::Resolve {
            origin_slot,
            edge,
            target,
            label,
        } => {
            let e = &mut store.verts[origin_slot].out[edge];
            e.target = target;
            e.label = label;
            Ok(())
        }
        Task::Visit { slot } => {
            connect_out(me, store, slot, None, false, outbox, connector, order, pool)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn connect_out<V: Payload, E: Payload>(
    me: usize,
    store: &mut Store<V, E>,
    slot: usize,
    incident: Option<&Label<E>>,
    initial: bool,
    outbox: &mut Outbox<'_, Task<V, E>>,
    connector: &Connector<V, E>,
    order: &Order<V>,
    pool: &Option<Arc<Pool<E>>>,
) -> Result<()> {
    let mut conns = Connections::new();
    match connector {
        Connector::Plain(f) => f(&store.verts[slot].payload, &mut conns)?,
        Connector::Sub(f) => {
            let seen_through = if initial { None } else { incident.map(|l| l.get()) };
            f(seen_through, &store.verts[slot].payload, &mut conns)?
        }
    }
    let myvid = pack(me, slot);
    for (raw_label, target) in conns.edges {
        let label = match pool {
            Some(p) => Label::Shared(p.intern(raw_label)),
            None => Label::Unique(raw_label),
        };
        let eslot = store.verts[slot].out.len();
        store.verts[slot].out.push(PendingEdge {
            label: None,
            target: UNRESOLVED,
        });
        let lane = outbox.lane_of(order.hash_of(&target));
        outbox.post(
            lane,
            Task::Adopt {
                payload: target,
                label: Some(label),
                origin: Some((myvid, eslot)),
                initial: false,
            },
        );
    }
    Ok(())
}

/// Flatten per-lane stores into one graph carrying the given orders.
pub(crate) fn flatten<V: Payload, E: Payload>(
    stores: Vec<Store<V, E>>,
    v_order: Order<V>,
    e_order: Option<Order<E>>,
    pool: Option<Arc<Pool<E>>>,
) -> Graph<V, E> {
    let mut offsets = Vec::with_capacity(stores.len());
    let mut total = 0;
    for s in &stores {
        offsets.push(total);
        total += s.verts.len();
    }
    let flat = |vid: u64| {
        let (lane, slot) = unpack(vid);
        offsets[lane] + slot
    };

    let mut root = 0;
    for (lane, s) in stores.iter().enumerate() {
        if let Some(slot) = s.root {
            root = offsets[lane] + slot;
        }
    }

    let mut g = Graph {
        verts: Vec::with_capacity(total),
        index: HashMap::new(),
        root,
        v_order,
        e_order,
        pool,
    };
    for s in stores {
        for bv in s.verts {
            let mut rec = VertexRecord::new(bv.payload);
            rec.out = bv
                .out
                .into_iter()
                .map(|e| {
                    debug_assert!(e.target != UNRESOLVED);
                    EdgeRecord {
                        label: e.label.expect("edge resolved"),
                        target: flat(e.target),
                    }
                })
                .collect();
            rec.inc = bv
                .inc
                .into_iter()
                .map(|(ovid, oslot)| crate::graph::BackRef {
                    origin: flat(ovid),
                    slot: oslot,
                })
                .collect();
            g.verts.push(rec);
        }
    }
    g.rebuild_index();
    g.dedup_edges();
    g
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Build a graph from `root` by fixed-point traversal with the
    /// builder's connector.
    pub fn build(builder: &Builder<V, E>, root: V, runner: &Runner) -> Result<Self> {
        let lanes = runner.lane_count();
        debug!("build: {lanes} lane(s)");
        let pool = builder
            .e_order
            .clone()
            .map(|o| Arc::new(Pool::new(o, lanes)));

        let root_lane = (builder.v_order.hash_of(&root) as usize) % lanes;
        let seeds = vec![(
            root_lane,
            Task::Adopt {
                payload: root,
                label: None,
                origin: None,
                initial: true,
            },
        )];
        let states: Vec<Store<V, E>> = (0..lanes).map(|_| Store::empty()).collect();
        let pool_ref = pool.clone();
        let stores = crew::run(runner, lanes, seeds, states, |me, store, task, outbox| {
            run_task(
                me,
                store,
                task,
                outbox,
                &builder.connector,
                &builder.v_order,
                &pool_ref,
            )
        })?;
        let g = flatten(stores, builder.v_order.clone(), builder.e_order.clone(), pool);
        debug!("build: {} vertices", g.verts.len());
        Ok(g)
    }
}
