//! Deferring edges past their siblings.
//!
//! An edge (v, ℓ, w) satisfying the postponable predicate is transferred:
//! removed from v, and re-created from the terminus of every sibling
//! (v, ℓ′, w′) whose label is *not* postponable, as (w′, bop(ℓ, ℓ′), w). A
//! postponable edge with no non-postponable sibling stays where it is.
//! With `fix`, rounds repeat until no transfer fires.

use crate::contract::{Payload, Tpred};
use crate::error::Result;
use crate::graph::{Graph, Marks};
use crate::runner::{Runner, run_shards};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

type LabelBop<E> = Arc<dyn Fn(&E, &E) -> Result<E> + Send + Sync>;

/// Operator bundle for [`Graph::postpone`].
pub struct Postponer<V, E> {
    postponable: Tpred<V, E>,
    bop: LabelBop<E>,
    fix: bool,
}

impl<V: Payload, E: Payload> Postponer<V, E> {
    /// A postponer whose transferred edges keep a clone of their label.
    pub fn new(
        postponable: impl Fn(&V, &E, &V) -> Result<bool> + Send + Sync + 'static,
    ) -> Self
    where
        E: Clone,
    {
        Self::relabeling(postponable, |l: &E, _: &E| Ok(l.clone()))
    }

    /// A postponer labeling each transferred copy by
    /// `bop(postponed label, sibling label)`.
    pub fn relabeling(
        postponable: impl Fn(&V, &E, &V) -> Result<bool> + Send + Sync + 'static,
        bop: impl Fn(&E, &E) -> Result<E> + Send + Sync + 'static,
    ) -> Self {
        Self {
            postponable: Arc::new(postponable),
            bop: Arc::new(bop),
            fix: false,
        }
    }

    /// Iterate until no edge can be postponed further.
    pub fn fixed(mut self) -> Self {
        self.fix = true;
        self
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Transfer every postponable edge to the termini of its
    /// non-postponable siblings.
    pub fn postpone(&mut self, p: &Postponer<V, E>, runner: &Runner) -> Result<()> {
        let mut round = 0;
        loop {
            runner.check()?;
            let shards = self.shards(runner.lane_count());
            let plans = run_shards(runner, shards, |shard| {
                // (condemned slots per origin, edges to add)
                let mut removals: Vec<(usize, Vec<usize>)> = Vec::new();
                let mut additions: Vec<(usize, E, usize)> = Vec::new();
                for &v in shard {
                    runner.check()?;
                    let record = &self.verts[v];
                    let mut postponable = Vec::new();
                    let mut siblings = Vec::new();
                    for (slot, e) in record.out.iter().enumerate() {
                        let verdict = (p.postponable)(
                            &record.payload,
                            e.label.get(),
                            &self.verts[e.target].payload,
                        )?;
                        if verdict {
                            postponable.push(slot);
                        } else {
                            siblings.push(slot);
                        }
                    }
                    if postponable.is_empty() || siblings.is_empty() {
                        continue;
                    }
                    for &ps in &postponable {
                        let moved = &record.out[ps];
                        for &ss in &siblings {
                            let sib = &record.out[ss];
                            let label = (p.bop)(moved.label.get(), sib.label.get())?;
                            additions.push((sib.target, label, moved.target));
                        }
                    }
                    removals.push((v, postponable));
                }
                Ok((removals, additions))
            })?;

            let mut transfers = 0usize;
            let mut gone: HashMap<usize, Vec<usize>> = HashMap::new();
            let mut additions = Vec::new();
            for (removals, adds) in plans {
                for (v, slots) in removals {
                    transfers += slots.len();
                    gone.insert(v, slots);
                }
                additions.extend(adds);
            }
            round += 1;
            debug!("postpone: round {round} transferred {transfers} edge(s)");
            if transfers == 0 {
                return Ok(());
            }

            for (v, slots) in &gone {
                let mut slot = 0;
                self.verts[*v].out.retain(|_| {
                    let keep = !slots.contains(&slot);
                    slot += 1;
                    keep
                });
                self.verts[*v].marks.set(Marks::CHANGED);
            }
            for (origin, label, target) in additions {
                let label = self.make_label(label);
                self.add_edge(origin, label, target);
                self.verts[origin].marks.set(Marks::CHANGED);
            }
            self.rebuild_backrefs();
            self.dedup_edges();
            if !self.take_changed() || !p.fix {
                return Ok(());
            }
        }
    }
}
