//! Inserting interstitial vertices mid-edge.
//!
//! For each edge (u, ℓ, v) the expander sees the endpoint properties and
//! the label; answering with a [`Stretched`] replaces the edge by
//! ⟨(u, head, w), (w, tail, v)⟩ with `w` the freshly inserted interstitial
//! vertex. Interstitials are appended without re-consing, like split
//! images. With `fix`, rounds repeat — newly created edges are candidates
//! too — until no expansion fires.

use crate::contract::Payload;
use crate::error::Result;
use crate::fold::{Prop, PropEval};
use crate::graph::{Graph, Marks};
use crate::runner::{Runner, run_shards};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// The pieces replacing a stretched edge.
pub struct Stretched<V, E> {
    /// Label of the edge from the old origin into the interstitial vertex.
    pub head: E,
    /// The interstitial vertex payload.
    pub vertex: V,
    /// Label of the edge from the interstitial vertex to the old target.
    pub tail: E,
}

type Expander<V, E, P> =
    Arc<dyn Fn(&P, &E, &P) -> Result<Option<Stretched<V, E>>> + Send + Sync>;

/// Operator bundle for [`Graph::stretch`].
pub struct Stretcher<V, E, P = ()> {
    prop: PropEval<V, E, P>,
    expander: Expander<V, E, P>,
    fix: bool,
}

impl<V: Payload, E: Payload, P: Payload> Stretcher<V, E, P> {
    /// A stretcher from its property spec and expander.
    pub fn new<I: Payload, O: Payload>(
        prop: Prop<V, E, I, O, P>,
        expander: impl Fn(&P, &E, &P) -> Result<Option<Stretched<V, E>>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            prop: prop.eval(),
            expander: Arc::new(expander),
            fix: false,
        }
    }

    /// Iterate until no edge expands.
    pub fn fixed(mut self) -> Self {
        self.fix = true;
        self
    }
}

impl<V: Payload, E: Payload> Stretcher<V, E, ()> {
    /// A stretcher needing no vertex properties.
    pub fn plain(
        expander: impl Fn(&E) -> Result<Option<Stretched<V, E>>> + Send + Sync + 'static,
    ) -> Self {
        Self::new(Prop::vertex_only(|_: &V| Ok(())), move |_, e, _| expander(e))
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Insert an interstitial vertex into every edge the expander fires
    /// on.
    pub fn stretch<P: Payload>(&mut self, s: &Stretcher<V, E, P>, runner: &Runner) -> Result<()> {
        let mut round = 0;
        loop {
            runner.check()?;
            let props = self.all_props(&s.prop, runner)?;
            let shards = self.shards(runner.lane_count());
            let plans = run_shards(runner, shards, |shard| {
                let mut out: Vec<(usize, usize, Stretched<V, E>)> = Vec::new();
                for &u in shard {
                    runner.check()?;
                    for (slot, e) in self.verts[u].out.iter().enumerate() {
                        if let Some(st) =
                            (s.expander)(&props[u], e.label.get(), &props[e.target])?
                        {
                            out.push((u, slot, st));
                        }
                    }
                }
                Ok(out)
            })?;

            let mut expanded = 0usize;
            let mut gone: HashMap<usize, Vec<usize>> = HashMap::new();
            for (u, slot, st) in plans.into_iter().flatten() {
                let v = self.verts[u].out[slot].target;
                let w = self.push_vertex(st.vertex);
                let head = self.make_label(st.head);
                let tail = self.make_label(st.tail);
                self.add_edge(u, head, w);
                self.add_edge(w, tail, v);
                self.verts[u].marks.set(Marks::CHANGED);
                gone.entry(u).or_default().push(slot);
                expanded += 1;
            }
            round += 1;
            debug!("stretch: round {round} expanded {expanded} edge(s)");
            for (u, slots) in &gone {
                let mut slot = 0;
                self.verts[*u].out.retain(|_| {
                    let keep = !slots.contains(&slot);
                    slot += 1;
                    keep
                });
            }
            self.rebuild_backrefs();
            if !self.take_changed() || !s.fix {
                return Ok(());
            }
        }
    }
}
