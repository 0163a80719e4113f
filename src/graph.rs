//! The shared vertex/edge store.
//!
//! A [`Graph`] owns a compact arena of vertex records. Each record owns its
//! ordered outgoing edge list; the incoming side is a list of non-owning
//! back-references naming the exact edge record (origin slot index) that
//! points here. Vertices are hash-consed under the graph's vertex
//! [`Order`], so no two live vertices are equal under it — except in graphs
//! produced by the splitting and stretching kernels, which append their
//! fabricated images without re-consing.
//!
//! The arena is kept compacted: after any kernel completes, exactly the
//! vertices reachable from the root are stored. That makes `vertex_count`
//! O(1); `edge_count` is still a sharded parallel sum, as every count was in
//! the original engine.
//!
//! Kernels in this crate reach into the internals directly; everything the
//! outside world gets goes through the read accessors or an operator bundle.

use crate::contract::{Order, Payload};
use crate::error::Result;
use crate::pool::Pool;
use crate::runner::{Runner, run_shards, shards_by_hash};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Index of a vertex record in the arena.
pub(crate) type Vid = usize;

/// An edge label, either owned in place or interned through the label pool
/// when the graph carries an edge order.
pub(crate) enum Label<E> {
    Unique(E),
    Shared(Arc<E>),
}

impl<E> Label<E> {
    pub(crate) fn get(&self) -> &E {
        match self {
            Label::Unique(e) => e,
            Label::Shared(e) => e,
        }
    }
}

/// An outgoing edge: a label and the target's arena index.
pub(crate) struct EdgeRecord<E> {
    pub(crate) label: Label<E>,
    pub(crate) target: Vid,
}

/// A non-owning back-reference to the edge record `origin.out[slot]`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct BackRef {
    pub(crate) origin: Vid,
    pub(crate) slot: usize,
}

/// Per-vertex mark bits used by traversal kernels.
pub(crate) struct Marks(AtomicU8);

impl Marks {
    pub(crate) const VISITED: u8 = 1;
    pub(crate) const PENDING: u8 = 2;
    pub(crate) const DELETED: u8 = 4;
    pub(crate) const CHANGED: u8 = 8;

    pub(crate) fn new() -> Self {
        Marks(AtomicU8::new(0))
    }

    pub(crate) fn set(&self, bit: u8) {
        self.0.fetch_or(bit, Ordering::AcqRel);
    }

    pub(crate) fn test(&self, bit: u8) -> bool {
        self.0.load(Ordering::Acquire) & bit != 0
    }

    pub(crate) fn clear(&self) {
        self.0.store(0, Ordering::Release);
    }
}

/// One vertex: payload, ordered outgoing edges, unordered incoming
/// back-references, and the mark bits.
pub(crate) struct VertexRecord<V, E> {
    pub(crate) payload: V,
    pub(crate) out: Vec<EdgeRecord<E>>,
    pub(crate) inc: Vec<BackRef>,
    pub(crate) marks: Marks,
}

impl<V, E> VertexRecord<V, E> {
    pub(crate) fn new(payload: V) -> Self {
        Self {
            payload,
            out: Vec::new(),
            inc: Vec::new(),
            marks: Marks::new(),
        }
    }
}

/// A labeled directed multigraph over vertex payloads `V` and edge labels
/// `E`.
///
/// Graphs are created by [`Graph::build`](crate::ops::build) or by one of
/// the rewriting kernels, and destroyed by [`free_now`](Graph::free_now),
/// [`free_later`](Graph::free_later), or plain `Drop`. A graph undergoing a
/// transformation is owned by that transformation for its duration; the
/// borrow checker enforces what the original engine only documented.
pub struct Graph<V, E> {
    pub(crate) verts: Vec<VertexRecord<V, E>>,
    pub(crate) index: HashMap<u64, Vec<Vid>>,
    pub(crate) root: Vid,
    pub(crate) v_order: Order<V>,
    pub(crate) e_order: Option<Order<E>>,
    pub(crate) pool: Option<Arc<Pool<E>>>,
}

impl<V, E> std::fmt::Debug for Graph<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("vertex_count", &self.verts.len())
            .field("root", &self.root)
            .finish()
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    // |----------------|
    // | Read accessors |
    // |----------------|

    /// The root vertex's payload.
    pub fn root(&self) -> &V {
        &self.verts[self.root].payload
    }

    /// Number of live vertices.
    ///
    /// The arena holds exactly the vertices reachable from the root, so the
    /// count is immediate; the runner is still consulted for the kill
    /// switch so a killed caller sees a uniform answer.
    pub fn vertex_count(&self, runner: &Runner) -> Result<usize> {
        runner.check()?;
        Ok(self.verts.len())
    }

    /// Number of edges, summed across lanes with vertices sharded by hash.
    pub fn edge_count(&self, runner: &Runner) -> Result<usize> {
        runner.check()?;
        let shards = self.shards(runner.lane_count());
        let partials = run_shards(runner, shards, |shard| {
            Ok(shard.iter().map(|&v| self.verts[v].out.len()).sum::<usize>())
        })?;
        Ok(partials.into_iter().sum())
    }

    /// Find the stored payload equal to `key` under the vertex order.
    pub fn lookup(&self, key: &V) -> Option<&V> {
        self.locate(key).map(|v| &self.verts[v].payload)
    }

    /// Whether `key` names a vertex of this graph.
    pub fn contains(&self, key: &V) -> bool {
        self.locate(key).is_some()
    }

    /// Iterate over all vertex payloads in arena order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.verts.iter().map(|r| &r.payload)
    }

    /// The labels and targets of `key`'s outgoing edges, in insertion
    /// order, or `None` if `key` is not a vertex.
    pub fn edges_from(&self, key: &V) -> Option<Vec<(&E, &V)>> {
        let v = self.locate(key)?;
        Some(
            self.verts[v]
                .out
                .iter()
                .map(|e| (e.label.get(), &self.verts[e.target].payload))
                .collect(),
        )
    }

    /// Outgoing degree of `key`, if present.
    pub fn out_degree(&self, key: &V) -> Option<usize> {
        self.locate(key).map(|v| self.verts[v].out.len())
    }

    /// Incoming degree of `key`, if present.
    pub fn in_degree(&self, key: &V) -> Option<usize> {
        self.locate(key).map(|v| self.verts[v].inc.len())
    }

    /// The vertex order this graph conses under.
    pub fn vertex_order(&self) -> Order<V> {
        self.v_order.clone()
    }

    /// The edge order, if one was configured.
    pub fn edge_order(&self) -> Option<Order<E>> {
        self.e_order.clone()
    }

    // |-------------|
    // | Destruction |
    // |-------------|

    /// Destroy the graph now, dropping payloads in parallel chunks across
    /// the runner's lanes.
    pub fn free_now(mut self, runner: &Runner) -> Result<()> {
        let verts = std::mem::take(&mut self.verts);
        let lanes = runner.lane_count();
        if lanes <= 1 || verts.len() < lanes {
            drop(verts);
            return Ok(());
        }
        let chunk = verts.len().div_ceil(lanes);
        let mut chunks: Vec<Vec<VertexRecord<V, E>>> = Vec::with_capacity(lanes);
        let mut verts = verts.into_iter();
        loop {
            let c: Vec<_> = verts.by_ref().take(chunk).collect();
            if c.is_empty() {
                break;
            }
            chunks.push(c);
        }
        std::thread::scope(|scope| {
            for c in chunks {
                scope.spawn(move || drop(c));
            }
        });
        Ok(())
    }

    /// Schedule destruction on a background lane and return immediately.
    pub fn free_later(self) {
        std::thread::spawn(move || drop(self));
    }

    // |--------------------|
    // | Kernel-facing core |
    // |--------------------|

    /// Arena index of the vertex equal to `key`, if any.
    pub(crate) fn locate(&self, key: &V) -> Option<Vid> {
        let h = self.v_order.hash_of(key);
        let bucket = self.index.get(&h)?;
        bucket
            .iter()
            .copied()
            .find(|&v| self.v_order.eq(&self.verts[v].payload, key))
    }

    /// Append a vertex and index it. The caller is responsible for cons
    /// discipline (checking [`locate`](Self::locate) first where required).
    pub(crate) fn push_vertex(&mut self, payload: V) -> Vid {
        let h = self.v_order.hash_of(&payload);
        let vid = self.verts.len();
        self.verts.push(VertexRecord::new(payload));
        self.index.entry(h).or_default().push(vid);
        vid
    }

    /// Wrap a raw label, interning it when the graph pools labels.
    pub(crate) fn make_label(&self, label: E) -> Label<E> {
        match &self.pool {
            Some(pool) => Label::Shared(pool.intern(label)),
            None => Label::Unique(label),
        }
    }

    /// Add the edge (origin, label, target) and its back-reference.
    pub(crate) fn add_edge(&mut self, origin: Vid, label: Label<E>, target: Vid) {
        let slot = self.verts[origin].out.len();
        self.verts[origin].out.push(EdgeRecord { label, target });
        self.verts[target].inc.push(BackRef { origin, slot });
    }

    /// True if `origin` already has an outgoing edge equal to
    /// ⟨label, target⟩ under the edge order. Always false without one.
    pub(crate) fn has_edge(&self, origin: Vid, label: &E, target: Vid) -> bool {
        let Some(order) = &self.e_order else {
            return false;
        };
        self.verts[origin]
            .out
            .iter()
            .any(|e| e.target == target && order.eq(e.label.get(), label))
    }

    /// Shard the arena by the vertex order's hash, for lane scheduling.
    pub(crate) fn shards(&self, lanes: usize) -> Vec<Vec<Vid>> {
        shards_by_hash(self.verts.len(), lanes, |v| {
            self.v_order.hash_of(&self.verts[v].payload)
        })
    }

    /// Recompute every incoming list from the outgoing lists.
    pub(crate) fn rebuild_backrefs(&mut self) {
        for r in &mut self.verts {
            r.inc.clear();
        }
        let mut refs: Vec<(Vid, BackRef)> = Vec::new();
        for (origin, r) in self.verts.iter().enumerate() {
            for (slot, e) in r.out.iter().enumerate() {
                refs.push((e.target, BackRef { origin, slot }));
            }
        }
        for (target, b) in refs {
            self.verts[target].inc.push(b);
        }
    }

    /// Rebuild the cons index from scratch (after payloads moved slots).
    ///
    /// Duplicate payloads are indexed in slot order; `locate` then answers
    /// with the first, which is the defined behavior for graphs holding
    /// split or stretched images.
    pub(crate) fn rebuild_index(&mut self) {
        self.index.clear();
        for vid in 0..self.verts.len() {
            let h = self.v_order.hash_of(&self.verts[vid].payload);
            self.index.entry(h).or_default().push(vid);
        }
    }

    /// Drop duplicate ⟨label, target⟩ outgoing edges (first occurrence
    /// wins). No-op without an edge order. Returns true if anything was
    /// removed; back-references are rebuilt in that case.
    pub(crate) fn dedup_edges(&mut self) -> bool {
        let Some(order) = self.e_order.clone() else {
            return false;
        };
        let mut removed = false;
        for r in &mut self.verts {
            if r.out.len() < 2 {
                continue;
            }
            let mut seen: HashMap<(u64, Vid), Vec<usize>> = HashMap::new();
            let mut keep = vec![true; r.out.len()];
            for (slot, e) in r.out.iter().enumerate() {
                let key = (order.hash_of(e.label.get()), e.target);
                let bucket = seen.entry(key).or_default();
                if bucket
                    .iter()
                    .any(|&s| order.eq(r.out[s].label.get(), e.label.get()))
                {
                    keep[slot] = false;
                    removed = true;
                } else {
                    bucket.push(slot);
                }
            }
            if keep.iter().any(|k| !k) {
                let mut slot = 0;
                r.out.retain(|_| {
                    let k = keep[slot];
                    slot += 1;
                    k
                });
            }
        }
        if removed {
            self.rebuild_backrefs();
        }
        removed
    }

    /// Mark-free BFS: which vertices are reachable from `from`, following
    /// outgoing edges (or incoming ones when `backwards`).
    pub(crate) fn reachable(&self, from: Vid, backwards: bool) -> Vec<bool> {
        let mut seen = vec![false; self.verts.len()];
        let mut queue = std::collections::VecDeque::from([from]);
        seen[from] = true;
        while let Some(v) = queue.pop_front() {
            let mut push = |w: Vid| {
                if !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            };
            if backwards {
                self.verts[v].inc.iter().for_each(|b| push(b.origin));
            } else {
                self.verts[v].out.iter().for_each(|e| push(e.target));
            }
        }
        seen
    }

    /// Compact the arena to the kept vertices, dropping everything else
    /// (payloads, labels, edges into the removed region) and re-rooting at
    /// `new_root` (an old index, which must be kept). Index and
    /// back-references are rebuilt.
    pub(crate) fn retain_vertices(&mut self, keep: &[bool], new_root: Vid) {
        debug_assert!(keep[new_root]);
        let mut remap: Vec<Option<Vid>> = vec![None; self.verts.len()];
        let mut next = 0;
        for (vid, &k) in keep.iter().enumerate() {
            if k {
                remap[vid] = Some(next);
                next += 1;
            }
        }
        let old = std::mem::take(&mut self.verts);
        self.verts = old
            .into_iter()
            .enumerate()
            .filter(|(vid, _)| keep[*vid])
            .map(|(_, mut r)| {
                r.out.retain(|e| remap[e.target].is_some());
                for e in &mut r.out {
                    e.target = remap[e.target].unwrap();
                }
                r.inc.clear();
                r.marks.clear();
                r
            })
            .collect();
        self.root = remap[new_root].unwrap();
        self.rebuild_index();
        self.rebuild_backrefs();
    }

    /// Clear every vertex's marks.
    pub(crate) fn clear_marks(&self) {
        for r in &self.verts {
            r.marks.clear();
        }
    }

    /// Did any fixed-point round change a vertex? Clears the changed
    /// marks as it answers.
    pub(crate) fn take_changed(&self) -> bool {
        let mut changed = false;
        for r in &self.verts {
            changed |= r.marks.test(Marks::CHANGED);
            r.marks.clear();
        }
        changed
    }
}
