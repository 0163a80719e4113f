//! Disjoint-set partitions over a graph's vertices.
//!
//! A [`Partition`] is produced by the classifying kernels and can be
//! queried or refined afterwards: `class_of` resolves a vertex to its
//! class, `unite` merges two classes by transitive closure, and
//! `class_size` reads the cached cardinality at the class representative.
//!
//! `find` is lock-free — parents are atomics and path-halving compresses as
//! it reads. `unite` takes the two roots' locks in canonical (lower index
//! first) order, re-checks that they are still roots, and links by rank.
//! The partition holds no reference to the graph; queries by payload take
//! the graph explicitly and are only meaningful for the graph the partition
//! was computed from.

use crate::contract::Payload;
use crate::error::{Error, Result};
use crate::graph::Graph;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An equivalence class of a [`Partition`].
///
/// Class values compare equal iff they name the same class *at the time
/// both were obtained*; after a `unite`, re-query `class_of` rather than
/// comparing stale handles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Class(pub(crate) usize);

/// A union–find forest over vertex slots.
pub struct Partition {
    parents: Vec<AtomicUsize>,
    ranks: Vec<AtomicUsize>,
    sizes: Vec<AtomicUsize>,
    locks: Vec<Mutex<()>>,
}

impl Partition {
    /// A partition of `n` elements grouped by the given assignment: every
    /// element with the same group id joins one class.
    pub(crate) fn grouped(assignment: &[usize]) -> Self {
        let n = assignment.len();
        let mut leader: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
        let mut parents = Vec::with_capacity(n);
        for (i, &group) in assignment.iter().enumerate() {
            parents.push(*leader.entry(group).or_insert(i));
        }
        let mut sizes = vec![0usize; n];
        for &p in &parents {
            sizes[p] += 1;
        }
        Self {
            parents: parents.into_iter().map(AtomicUsize::new).collect(),
            ranks: sizes
                .iter()
                .map(|&s| AtomicUsize::new(usize::from(s > 1)))
                .collect(),
            sizes: sizes.into_iter().map(AtomicUsize::new).collect(),
            locks: (0..n).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Number of elements partitioned.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// True for the degenerate empty partition.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// The class of the vertex `key` in `g`.
    pub fn class_of<V: Payload, E: Payload>(&self, g: &Graph<V, E>, key: &V) -> Result<Class> {
        let vid = g.locate(key).ok_or(Error::VertexNotFound)?;
        if vid >= self.parents.len() {
            return Err(Error::VertexNotFound);
        }
        Ok(Class(self.find(vid)))
    }

    /// Cached size of a class.
    pub fn class_size(&self, c: Class) -> usize {
        self.sizes[self.find(c.0)].load(Ordering::Acquire)
    }

    /// Number of distinct classes.
    pub fn class_count(&self) -> usize {
        (0..self.parents.len())
            .filter(|&i| self.find(i) == i)
            .count()
    }

    /// Every class, one handle per root.
    pub fn classes(&self) -> Vec<Class> {
        (0..self.parents.len())
            .filter(|&i| self.find(i) == i)
            .map(Class)
            .collect()
    }

    /// Merge two classes into one; uniting a class with itself is a no-op.
    /// Returns the surviving class.
    pub fn unite(&self, a: Class, b: Class) -> Class {
        loop {
            let ra = self.find(a.0);
            let rb = self.find(b.0);
            if ra == rb {
                return Class(ra);
            }
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            let _lo_guard = self.locks[lo].lock().unwrap();
            let _hi_guard = self.locks[hi].lock().unwrap();
            // roots may have moved before the locks were ours
            if self.parents[lo].load(Ordering::Acquire) != lo
                || self.parents[hi].load(Ordering::Acquire) != hi
            {
                continue;
            }
            let (winner, loser) = if self.ranks[lo].load(Ordering::Acquire)
                >= self.ranks[hi].load(Ordering::Acquire)
            {
                (lo, hi)
            } else {
                (hi, lo)
            };
            self.parents[loser].store(winner, Ordering::Release);
            if self.ranks[winner].load(Ordering::Acquire)
                == self.ranks[loser].load(Ordering::Acquire)
            {
                self.ranks[winner].fetch_add(1, Ordering::AcqRel);
            }
            let moved = self.sizes[loser].load(Ordering::Acquire);
            self.sizes[winner].fetch_add(moved, Ordering::AcqRel);
            return Class(winner);
        }
    }

    /// Root of `x`, compressing by path halving along the way.
    pub(crate) fn find(&self, x: usize) -> usize {
        let mut x = x;
        loop {
            let p = self.parents[x].load(Ordering::Acquire);
            if p == x {
                return x;
            }
            let gp = self.parents[p].load(Ordering::Acquire);
            if gp == p {
                return p;
            }
            let _ = self.parents[x].compare_exchange(p, gp, Ordering::AcqRel, Ordering::Acquire);
            x = gp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_sizes_and_counts() {
        let p = Partition::grouped(&[0, 1, 0, 2, 1, 0]);
        assert_eq!(p.class_count(), 3);
        let sizes: usize = p.classes().iter().map(|&c| p.class_size(c)).sum();
        assert_eq!(sizes, 6);
    }

    #[test]
    fn unite_is_transitive_and_idempotent() {
        let p = Partition::grouped(&[0, 1, 2, 3]);
        let a = Class(p.find(0));
        let b = Class(p.find(1));
        let c = Class(p.find(2));
        let ab = p.unite(a, b);
        assert_eq!(p.unite(ab, ab), ab);
        p.unite(ab, c);
        assert_eq!(p.find(0), p.find(2));
        assert_eq!(p.class_size(Class(p.find(1))), 3);
        assert_eq!(p.class_count(), 2);
    }
}
