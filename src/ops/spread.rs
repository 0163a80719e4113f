//! Completing a graph by re-running its connector everywhere.
//!
//! A connector may decline to follow some edges the first time (building
//! half a structure, say). `spread` continues the build from every current
//! vertex as if it were a root: the connector runs again on each one, new
//! targets are adopted through the same cons discipline, and — when an edge
//! order is configured — re-declared edges deduplicate against the ones
//! already present, which makes spreading a completed graph a no-op.

use crate::contract::Payload;
use crate::crew;
use crate::error::Result;
use crate::graph::Graph;
use crate::ops::build::{self, BuildVertex, Builder, PendingEdge, Store, Task};
use crate::runner::Runner;
use log::debug;

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Continue building from every vertex of this graph with the given
    /// builder (normally the one that built it; its orders must agree with
    /// the graph's).
    ///
    /// Consumes the graph; on failure the partially spread value is
    /// destroyed rather than returned, like the other kernels that cannot
    /// roll back.
    pub fn spread(mut self, builder: &Builder<V, E>, runner: &Runner) -> Result<Self> {
        let lanes = runner.lane_count();
        debug!(
            "spread: {} vertices across {lanes} lane(s)",
            self.verts.len()
        );
        let pool = self.pool.clone();
        let old_root = self.root;
        let verts = std::mem::take(&mut self.verts);
        let n = verts.len();

        // assign every vertex its lane and local slot under build's scheme
        let mut lane_of = Vec::with_capacity(n);
        let mut local_of = Vec::with_capacity(n);
        let mut counts = vec![0usize; lanes];
        for r in &verts {
            let lane = (self.v_order.hash_of(&r.payload) as usize) % lanes;
            lane_of.push(lane);
            local_of.push(counts[lane]);
            counts[lane] += 1;
        }

        // scatter records into per-lane stores, edges re-expressed as
        // already-resolved pending edges
        let mut stores: Vec<Store<V, E>> = (0..lanes).map(|_| Store::empty()).collect();
        for (vid, rec) in verts.into_iter().enumerate() {
            let out = rec
                .out
                .into_iter()
                .map(|e| PendingEdge {
                    label: Some(e.label),
                    target: build::pack(lane_of[e.target], local_of[e.target]),
                })
                .collect();
            let inc = rec
                .inc
                .into_iter()
                .map(|b| (build::pack(lane_of[b.origin], local_of[b.origin]), b.slot))
                .collect();
            stores[lane_of[vid]].verts.push(BuildVertex {
                payload: rec.payload,
                out,
                inc,
            });
        }
        for s in &mut stores {
            for slot in 0..s.verts.len() {
                let h = self.v_order.hash_of(&s.verts[slot].payload);
                s.index.entry(h).or_default().push(slot);
            }
        }
        stores[lane_of[old_root]].root = Some(local_of[old_root]);

        // one visit per existing vertex, then the usual fixed point
        let seeds: Vec<(usize, Task<V, E>)> = (0..n)
            .map(|vid| (lane_of[vid], Task::Visit { slot: local_of[vid] }))
            .collect();
        let pool_ref = pool.clone();
        let v_order = self.v_order.clone();
        let stores = crew::run(runner, lanes, seeds, stores, |me, store, task, outbox| {
            build::run_task(
                me,
                store,
                task,
                outbox,
                &builder.connector,
                &v_order,
                &pool_ref,
            )
        })?;
        let g = build::flatten(stores, v_order, self.e_order.clone(), pool);
        debug!("spread: {} vertices", g.verts.len());
        Ok(g)
    }
}
