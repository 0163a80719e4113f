//! Map-reduce over a vertex's neighborhood.
//!
//! A [`Fold`] walks one side of a vertex — its incident or outgoing edges —
//! applying the user map to each edge and reducing the images pairwise. A
//! [`Prop`] combines an optional fold per side with a vertex map that turns
//! the two fold results and the payload into the vertex's *property*, the
//! scalar every higher-level kernel consumes.
//!
//! Reduction order is unspecified; maps and reductions must be associative
//! and commutative for reproducible results. A fold over an empty edge list
//! yields the vacuous case; if none was supplied that is misuse, because a
//! graph built from a root always has source vertices somewhere.

use crate::contract::{Bop, Nop, Payload, Top};
use crate::error::{Error, Result};
use crate::graph::{Graph, Vid};
use std::sync::Arc;

/// An edge-side fold: map each edge, reduce pairwise, fall back to the
/// vacuous case when there is nothing to map.
pub struct Fold<V, E, R> {
    map: Top<V, E, R>,
    reduce: Option<Bop<R>>,
    vacuous: Option<Nop<R>>,
}

impl<V: Payload, E: Payload, R: Payload> Fold<V, E, R> {
    /// A fold from its map alone; reduction and vacuous case can be added
    /// with the builder methods.
    ///
    /// The map sees (local payload, label, remote payload): for an incident
    /// fold the local vertex is the edge's target, for an outgoing fold its
    /// origin.
    pub fn new(map: impl Fn(&V, &E, &V) -> Result<R> + Send + Sync + 'static) -> Self {
        Self {
            map: Arc::new(map),
            reduce: None,
            vacuous: None,
        }
    }

    /// Set the pairwise reduction. Required whenever a vertex has more than
    /// one edge on the folded side.
    pub fn reducing(mut self, reduce: impl Fn(R, R) -> Result<R> + Send + Sync + 'static) -> Self {
        self.reduce = Some(Arc::new(reduce));
        self
    }

    /// Set the vacuous case, the fold's value on an empty edge list.
    pub fn vacuously(mut self, vacuous: impl Fn() -> Result<R> + Send + Sync + 'static) -> Self {
        self.vacuous = Some(Arc::new(vacuous));
        self
    }

    /// The vacuous value, or misuse if none was configured.
    pub(crate) fn vacuous_value(&self) -> Result<R> {
        match &self.vacuous {
            Some(v) => v(),
            None => Err(Error::Misuse(
                "fold over an empty edge list requires a vacuous case",
            )),
        }
    }

    /// Fold the images of `edges`, where each item is (local, label,
    /// remote) payload references.
    pub(crate) fn over<'a>(
        &self,
        edges: impl Iterator<Item = (&'a V, &'a E, &'a V)>,
    ) -> Result<R>
    where
        V: 'a,
        E: 'a,
    {
        let mut acc: Option<R> = None;
        for (local, label, remote) in edges {
            let image = (self.map)(local, label, remote)?;
            acc = Some(match acc {
                None => image,
                Some(prev) => match &self.reduce {
                    Some(reduce) => reduce(prev, image)?,
                    None => {
                        return Err(Error::Misuse(
                            "fold over two or more edges requires a reduction",
                        ));
                    }
                },
            });
        }
        match acc {
            Some(r) => Ok(r),
            None => self.vacuous_value(),
        }
    }

    /// Fold a vertex's incident edges.
    pub(crate) fn over_incident(&self, g: &Graph<V, E>, v: Vid) -> Result<R> {
        self.over(g.verts[v].inc.iter().map(|b| {
            let e = &g.verts[b.origin].out[b.slot];
            (
                &g.verts[v].payload,
                e.label.get(),
                &g.verts[b.origin].payload,
            )
        }))
    }

    /// Fold a vertex's outgoing edges.
    pub(crate) fn over_outgoing(&self, g: &Graph<V, E>, v: Vid) -> Result<R> {
        self.over(g.verts[v].out.iter().map(|e| {
            (
                &g.verts[v].payload,
                e.label.get(),
                &g.verts[e.target].payload,
            )
        }))
    }
}

impl<V, E, R> Clone for Fold<V, E, R> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            reduce: self.reduce.clone(),
            vacuous: self.vacuous.clone(),
        }
    }
}

/// Vertex map of a property spec: (incident result, payload, outgoing
/// result) to property. A side's result is `None` exactly when no fold was
/// configured for it.
pub type VertexMap<V, I, O, P> =
    Arc<dyn Fn(Option<I>, &V, Option<O>) -> Result<P> + Send + Sync>;

/// A per-vertex property spec: an optional incident fold, an optional
/// outgoing fold, and the vertex map combining their results.
pub struct Prop<V, E, I, O, P> {
    incident: Option<Fold<V, E, I>>,
    outgoing: Option<Fold<V, E, O>>,
    vertex_map: VertexMap<V, I, O, P>,
}

impl<V: Payload, E: Payload, I: Payload, O: Payload, P: Payload> Prop<V, E, I, O, P> {
    /// A property from its vertex map alone.
    pub fn new(
        vertex_map: impl Fn(Option<I>, &V, Option<O>) -> Result<P> + Send + Sync + 'static,
    ) -> Self {
        Self {
            incident: None,
            outgoing: None,
            vertex_map: Arc::new(vertex_map),
        }
    }

    /// Attach the incident-edge fold.
    pub fn with_incident(mut self, fold: Fold<V, E, I>) -> Self {
        self.incident = Some(fold);
        self
    }

    /// Attach the outgoing-edge fold.
    pub fn with_outgoing(mut self, fold: Fold<V, E, O>) -> Self {
        self.outgoing = Some(fold);
        self
    }

    /// Evaluate the property of one vertex.
    pub(crate) fn at(&self, g: &Graph<V, E>, v: Vid) -> Result<P> {
        let inc = match &self.incident {
            Some(f) => Some(f.over_incident(g, v)?),
            None => None,
        };
        let out = match &self.outgoing {
            Some(f) => Some(f.over_outgoing(g, v)?),
            None => None,
        };
        (self.vertex_map)(inc, &g.verts[v].payload, out)
    }
}

/// A property spec with its fold types erased; what the bundles store.
pub(crate) type PropEval<V, E, P> =
    Arc<dyn Fn(&Graph<V, E>, Vid) -> Result<P> + Send + Sync>;

impl<V: Payload, E: Payload, I: Payload, O: Payload, P: Payload> Prop<V, E, I, O, P> {
    /// Erase the fold result types, leaving only an evaluator.
    pub(crate) fn eval(self) -> PropEval<V, E, P> {
        Arc::new(move |g, v| self.at(g, v))
    }
}

impl<V: Payload, E: Payload, P: Payload> Prop<V, E, (), (), P> {
    /// A property computed from the payload alone, with no edge folds.
    pub fn vertex_only(map: impl Fn(&V) -> Result<P> + Send + Sync + 'static) -> Self {
        Prop::new(move |_, v, _| map(v))
    }
}

impl<V, E, I, O, P> Clone for Prop<V, E, I, O, P> {
    fn clone(&self) -> Self {
        Self {
            incident: self.incident.clone(),
            outgoing: self.outgoing.clone(),
            vertex_map: self.vertex_map.clone(),
        }
    }
}
