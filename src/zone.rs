//! Zone descriptors: restricting a kernel to a reachable subgraph.
//!
//! A zone names an initial vertex, a direction, and an offset. Its working
//! set is found by a level-order traversal from the initial vertex —
//! following outgoing edges forward or back-references backward — keeping
//! exactly the vertices at BFS level ≥ `offset`. Offset 0 therefore
//! includes the initial vertex, offset 1 starts at its immediate frontier.
//! An absent zone means the whole graph, rooted at the graph root.

use crate::contract::Payload;
use crate::error::{Error, Result};
use crate::graph::{Graph, Marks, Vid};

/// Traversal direction of a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Follow outgoing edges away from the initial vertex.
    Forward,
    /// Follow incoming edges away from the initial vertex.
    Backward,
}

/// A reachable-subgraph selector.
#[derive(Clone)]
pub struct Zone<V> {
    /// Key of the vertex the traversal starts at.
    pub initial: V,
    /// Which way edges are followed.
    pub direction: Direction,
    /// Number of leading BFS levels excluded from the working set.
    pub offset: usize,
}

impl<V> Zone<V> {
    /// A forward zone with offset 0.
    pub fn forward(initial: V) -> Self {
        Self {
            initial,
            direction: Direction::Forward,
            offset: 0,
        }
    }

    /// A backward zone with offset 0.
    pub fn backward(initial: V) -> Self {
        Self {
            initial,
            direction: Direction::Backward,
            offset: 0,
        }
    }

    /// Replace the offset.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// The vertices a zoned kernel operates on.
pub(crate) struct WorkingSet {
    /// Members in traversal (level) order.
    pub(crate) members: Vec<Vid>,
    /// Membership test by arena index.
    pub(crate) in_set: Vec<bool>,
    /// Arena index of the zone's initial vertex (always resolved, even when
    /// the offset excludes it from the set).
    pub(crate) initial: Vid,
    /// Direction the zone was explored in.
    pub(crate) backwards: bool,
}

/// Resolve a zone against a graph.
///
/// `None` selects the entire graph as a forward zone from the root. A zone
/// whose initial vertex is not in the graph is an error.
pub(crate) fn working_set<V: Payload, E: Payload>(
    g: &Graph<V, E>,
    zone: Option<&Zone<V>>,
) -> Result<WorkingSet> {
    let Some(zone) = zone else {
        return Ok(WorkingSet {
            members: (0..g.verts.len()).collect(),
            in_set: vec![true; g.verts.len()],
            initial: g.root,
            backwards: false,
        });
    };
    let initial = g.locate(&zone.initial).ok_or(Error::VertexNotFound)?;
    let backwards = zone.direction == Direction::Backward;

    g.clear_marks();
    let mut members = Vec::new();
    let mut in_set = vec![false; g.verts.len()];
    let mut level: Vec<Vid> = vec![initial];
    g.verts[initial].marks.set(Marks::VISITED);
    let mut depth = 0;
    while !level.is_empty() {
        if depth >= zone.offset {
            for &v in &level {
                in_set[v] = true;
                members.push(v);
            }
        }
        let mut next = Vec::new();
        for &v in &level {
            let mut visit = |w: Vid| {
                if !g.verts[w].marks.test(Marks::VISITED) {
                    g.verts[w].marks.set(Marks::VISITED);
                    next.push(w);
                }
            };
            if backwards {
                g.verts[v].inc.iter().for_each(|b| visit(b.origin));
            } else {
                g.verts[v].out.iter().for_each(|e| visit(e.target));
            }
        }
        level = next;
        depth += 1;
    }
    g.clear_marks();
    Ok(WorkingSet {
        members,
        in_set,
        initial,
        backwards,
    })
}
