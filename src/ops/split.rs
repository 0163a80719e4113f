//! Splitting vertices into anastatic and catastatic images.
//!
//! Each vertex matching the fissile predicate is replaced by two images:
//! the anastatic one built by `ana` and the catastatic one built by
//! `cata`, both from the payload and its property. The former edges of a
//! fissile vertex are rerouted according to the ctop table: the inward
//! labelers decide which of the two images incoming edges now reach, the
//! outward labelers which of them outgoing edges now leave. A labeler may
//! veto an edge (`tpred`) and relabels the ones it admits (`top`); an edge
//! fissile at both ends passes through the outward top and then the inward
//! one.
//!
//! Everything fallible — images, vetoes, labels — is computed against the
//! unsplit graph before any structural change lands; a barrier separates
//! image creation from rerouting, so no callback ever observes a
//! half-split neighborhood. Images are appended without re-consing: the
//! default splitter really does double a graph whose payloads it merely
//! clones.

use crate::contract::Payload;
use crate::error::Result;
use crate::fold::{Prop, PropEval};
use crate::graph::Graph;
use crate::runner::{Runner, run_shards};
use log::debug;
use std::sync::Arc;

type Imager<V, P> = Arc<dyn Fn(&V, &P) -> Result<V> + Send + Sync>;
type Fissile<V, P> = Arc<dyn Fn(&V, &P) -> Result<bool> + Send + Sync>;
type LabelTop<E, P> = Arc<dyn Fn(&E, &P) -> Result<E> + Send + Sync>;
type LabelPred<E, P> = Arc<dyn Fn(&E, &P) -> Result<bool> + Send + Sync>;

/// Which instance of a (possibly split) vertex an edge endpoint names.
#[derive(Clone, Copy)]
enum End {
    Intact,
    Ana,
    Cata,
}

/// Reroutes one kind of edge to one image of a split vertex.
pub struct Labeler<E, P> {
    tpred: Option<LabelPred<E, P>>,
    top: LabelTop<E, P>,
}

impl<E: Payload, P: Payload> Labeler<E, P> {
    /// A labeler admitting every edge, relabeled by `top`.
    pub fn new(top: impl Fn(&E, &P) -> Result<E> + Send + Sync + 'static) -> Self {
        Self {
            tpred: None,
            top: Arc::new(top),
        }
    }

    /// Skip edges for which the predicate is false.
    pub fn guarded(
        mut self,
        tpred: impl Fn(&E, &P) -> Result<bool> + Send + Sync + 'static,
    ) -> Self {
        self.tpred = Some(Arc::new(tpred));
        self
    }

    fn admit(&self, label: &E, prop: &P) -> Result<Option<E>> {
        if let Some(tpred) = &self.tpred {
            if !tpred(label, prop)? {
                return Ok(None);
            }
        }
        (self.top)(label, prop).map(Some)
    }
}

/// One side (inward or outward) of the ctop table.
pub struct SplitSide<E, P> {
    /// Labeler routing edges to/from the anastatic image, if any.
    pub ana: Option<Labeler<E, P>>,
    /// Labeler routing edges to/from the catastatic image, if any.
    pub cata: Option<Labeler<E, P>>,
}

/// The ctop table: how a split vertex's former edges are rerouted.
pub struct Ctops<E, P> {
    pub inward: SplitSide<E, P>,
    pub outward: SplitSide<E, P>,
}

impl<E: Payload, P: Payload> Ctops<E, P> {
    /// Route every edge to both images with cloned labels.
    pub fn cloning() -> Self
    where
        E: Clone,
    {
        let copy = || Labeler::new(|e: &E, _: &P| Ok(e.clone()));
        Self {
            inward: SplitSide {
                ana: Some(copy()),
                cata: Some(copy()),
            },
            outward: SplitSide {
                ana: Some(copy()),
                cata: Some(copy()),
            },
        }
    }
}

/// Operator bundle for [`Graph::split`].
pub struct Splitter<V, E, P = ()> {
    fissile: Fissile<V, P>,
    ana: Imager<V, P>,
    cata: Imager<V, P>,
    prop: PropEval<V, E, P>,
    ctops: Ctops<E, P>,
}

impl<V: Payload, E: Payload, P: Payload> Splitter<V, E, P> {
    /// A splitter from its property spec, fissile predicate, the two image
    /// constructors, and the ctop table.
    pub fn new<I: Payload, O: Payload>(
        prop: Prop<V, E, I, O, P>,
        fissile: impl Fn(&V, &P) -> Result<bool> + Send + Sync + 'static,
        ana: impl Fn(&V, &P) -> Result<V> + Send + Sync + 'static,
        cata: impl Fn(&V, &P) -> Result<V> + Send + Sync + 'static,
        ctops: Ctops<E, P>,
    ) -> Self {
        Self {
            fissile: Arc::new(fissile),
            ana: Arc::new(ana),
            cata: Arc::new(cata),
            prop: prop.eval(),
            ctops,
        }
    }
}

impl<V: Payload, E: Payload> Splitter<V, E, ()> {
    /// The default splitter: every vertex fissile, images and labels
    /// cloned, every edge routed to both images — doubling the graph.
    pub fn cloning() -> Self
    where
        V: Clone,
        E: Clone,
    {
        Self::new(
            Prop::vertex_only(|_: &V| Ok(())),
            |_, _| Ok(true),
            |v, _| Ok(v.clone()),
            |v, _| Ok(v.clone()),
            Ctops::cloning(),
        )
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Split every fissile vertex into its two images and reroute its
    /// edges per the ctop table.
    pub fn split<P: Payload>(&mut self, s: &Splitter<V, E, P>, runner: &Runner) -> Result<()> {
        let props = self.all_props(&s.prop, runner)?;
        let shards = self.shards(runner.lane_count());

        // phase 1: verdicts and images, against the unsplit graph
        let imaged = run_shards(runner, shards.clone(), |shard| {
            let mut out = Vec::new();
            for &v in shard {
                runner.check()?;
                let payload = &self.verts[v].payload;
                if (s.fissile)(payload, &props[v])? {
                    out.push((
                        v,
                        (s.ana)(payload, &props[v])?,
                        (s.cata)(payload, &props[v])?,
                    ));
                }
            }
            Ok(out)
        })?;
        let mut images: Vec<Option<(V, V)>> = (0..self.verts.len()).map(|_| None).collect();
        for (v, ana, cata) in imaged.into_iter().flatten() {
            images[v] = Some((ana, cata));
        }
        let fissile: Vec<bool> = images.iter().map(Option::is_some).collect();
        if !fissile.iter().any(|&f| f) {
            return Ok(());
        }
        debug!(
            "split: {} fissile of {} vertices",
            fissile.iter().filter(|&&f| f).count(),
            self.verts.len()
        );

        // phase 2 (barrier passed): plan every rerouted edge, still
        // reading only the unsplit graph
        let plans = run_shards(runner, shards, |shard| {
            let mut out: Vec<(usize, End, E, usize, End)> = Vec::new();
            for &u in shard {
                runner.check()?;
                for e in &self.verts[u].out {
                    let v = e.target;
                    if !fissile[u] && !fissile[v] {
                        continue;
                    }
                    let sources: Vec<(End, Option<E>)> = if fissile[u] {
                        let mut srcs = Vec::new();
                        if let Some(l) = &s.ctops.outward.ana {
                            srcs.push((End::Ana, l.admit(e.label.get(), &props[u])?));
                        }
                        if let Some(l) = &s.ctops.outward.cata {
                            srcs.push((End::Cata, l.admit(e.label.get(), &props[u])?));
                        }
                        srcs
                    } else {
                        vec![(End::Intact, None)]
                    };
                    for (src, relabeled) in sources {
                        if fissile[u] && relabeled.is_none() {
                            continue; // vetoed by the outward tpred
                        }
                        if fissile[v] {
                            let base = relabeled.as_ref().unwrap_or_else(|| e.label.get());
                            if let Some(l) = &s.ctops.inward.ana {
                                if let Some(label) = l.admit(base, &props[v])? {
                                    out.push((u, src, label, v, End::Ana));
                                }
                            }
                            if let Some(l) = &s.ctops.inward.cata {
                                if let Some(label) = l.admit(base, &props[v])? {
                                    out.push((u, src, label, v, End::Cata));
                                }
                            }
                        } else if let Some(label) = relabeled {
                            out.push((u, src, label, v, End::Intact));
                        }
                    }
                }
            }
            Ok(out)
        })?;

        // serial, infallible apply: append the images, drop every
        // fissile-touching edge, wire the planned ones, then sweep
        let old_count = self.verts.len();
        let mut ana_vid = vec![usize::MAX; old_count];
        let mut cata_vid = vec![usize::MAX; old_count];
        for (v, image) in images.into_iter().enumerate() {
            if let Some((ana, cata)) = image {
                ana_vid[v] = self.push_vertex(ana);
                cata_vid[v] = self.push_vertex(cata);
            }
        }
        for u in 0..old_count {
            if fissile[u] {
                self.verts[u].out.clear();
            } else {
                let targets: Vec<usize> =
                    self.verts[u].out.iter().map(|e| e.target).collect();
                let mut slot = 0;
                self.verts[u].out.retain(|_| {
                    let keep = !fissile[targets[slot]];
                    slot += 1;
                    keep
                });
            }
        }
        let resolve = |v: usize, end: End| match end {
            End::Intact => v,
            End::Ana => ana_vid[v],
            End::Cata => cata_vid[v],
        };
        for (u, src, label, v, tgt) in plans.into_iter().flatten() {
            let label = self.make_label(label);
            self.add_edge(resolve(u, src), label, resolve(v, tgt));
        }
        let new_root = if fissile[self.root] {
            ana_vid[self.root]
        } else {
            self.root
        };
        let keep = self.reachable(new_root, false);
        self.retain_vertices(&keep, new_root);
        Ok(())
    }
}
