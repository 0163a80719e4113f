//! Hash-consed label pool.
//!
//! When a graph is configured with an edge order, every label is interned
//! through a pool before it reaches an edge record. Equal labels (under the
//! user order) share one allocation; the `Arc` reference count stands in for
//! the retain/release protocol, and the payload's `Drop` impl is the user
//! destructor, guaranteed to run exactly once when the last holder lets go.
//!
//! The pool is sharded by hash so concurrent lanes contend only on their own
//! shard's lock. Shard tables hold `Weak` entries: the pool itself never
//! keeps a label alive, it only deduplicates the ones its graph still owns.

use crate::contract::{Order, Payload};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

pub(crate) struct Pool<E> {
    shards: Vec<Mutex<HashMap<u64, Vec<Weak<E>>>>>,
    order: Order<E>,
}

impl<E: Payload> Pool<E> {
    /// A pool with one shard per expected lane.
    pub(crate) fn new(order: Order<E>, shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards).map(|_| Mutex::new(HashMap::new())).collect(),
            order,
        }
    }

    /// Intern a label, returning the shared handle for its equivalence
    /// class. Dead table entries encountered along the way are pruned.
    pub(crate) fn intern(&self, label: E) -> Arc<E> {
        let h = self.order.hash_of(&label);
        let shard = &self.shards[(h as usize) % self.shards.len()];
        let mut table = shard.lock().unwrap();
        let bucket = table.entry(h).or_default();
        bucket.retain(|w| w.strong_count() > 0);
        for weak in bucket.iter() {
            if let Some(existing) = weak.upgrade() {
                if self.order.eq(&existing, &label) {
                    return existing;
                }
            }
        }
        let fresh = Arc::new(label);
        bucket.push(Arc::downgrade(&fresh));
        fresh
    }

    /// Number of live interned labels, counted across all shards.
    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        self.shards
            .iter()
            .map(|s| {
                s.lock()
                    .unwrap()
                    .values()
                    .flatten()
                    .filter(|w| w.strong_count() > 0)
                    .count()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_labels_share_one_allocation() {
        let pool = Pool::new(Order::<u64>::natural(), 4);
        let a = pool.intern(7);
        let b = pool.intern(7);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.live(), 1);
    }

    #[test]
    fn dropped_labels_leave_the_table() {
        let pool = Pool::new(Order::<u64>::natural(), 2);
        let a = pool.intern(1);
        drop(pool.intern(2));
        drop(a);
        assert_eq!(pool.live(), 0);
        // re-interning after death yields a fresh allocation
        let c = pool.intern(1);
        assert_eq!(*c, 1);
    }
}
