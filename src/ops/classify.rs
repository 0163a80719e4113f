//! Grouping vertices into classes by property.
//!
//! A classifier computes each vertex's property and groups vertices whose
//! properties are equal under the class order. The result is a
//! [`Partition`] the caller can query and refine; the merging kernel
//! consumes one internally.

use crate::contract::{Order, Payload};
use crate::error::Result;
use crate::fold::Prop;
use crate::graph::Graph;
use crate::partition::Partition;
use crate::runner::{Runner, run_shards};
use log::debug;
use std::collections::HashMap;

/// Operator bundle for [`Graph::partitioned`].
pub struct Classifier<V, E, I, O, P> {
    pub(crate) prop: Prop<V, E, I, O, P>,
    pub(crate) order: Order<P>,
}

impl<V: Payload, E: Payload, I: Payload, O: Payload, P: Payload> Classifier<V, E, I, O, P> {
    /// A classifier from a property spec and the property's order.
    pub fn new(prop: Prop<V, E, I, O, P>, order: Order<P>) -> Self {
        Self { prop, order }
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Partition the vertices into property-equivalence classes.
    pub fn partitioned<I: Payload, O: Payload, P: Payload>(
        &self,
        c: &Classifier<V, E, I, O, P>,
        runner: &Runner,
    ) -> Result<Partition> {
        Ok(Partition::grouped(&self.class_assignment(c, runner)?))
    }

    /// Group id (representative vertex slot) per vertex.
    pub(crate) fn class_assignment<I: Payload, O: Payload, P: Payload>(
        &self,
        c: &Classifier<V, E, I, O, P>,
        runner: &Runner,
    ) -> Result<Vec<usize>> {
        let shards = self.shards(runner.lane_count());
        let mapped = run_shards(runner, shards, |shard| {
            let mut out = Vec::with_capacity(shard.len());
            for &v in shard {
                runner.check()?;
                out.push((v, c.prop.at(self, v)?));
            }
            Ok(out)
        })?;
        let mut props: Vec<Option<P>> = (0..self.verts.len()).map(|_| None).collect();
        for (v, p) in mapped.into_iter().flatten() {
            props[v] = Some(p);
        }
        let props: Vec<P> = props
            .into_iter()
            .map(|p| p.expect("every vertex classified"))
            .collect();

        // group equal properties; the first member of a group represents it
        let mut groups: HashMap<u64, Vec<usize>> = HashMap::new();
        let mut assignment = vec![0usize; props.len()];
        for (v, p) in props.iter().enumerate() {
            let bucket = groups.entry(c.order.hash_of(p)).or_default();
            match bucket.iter().find(|&&rep| c.order.eq(&props[rep], p)) {
                Some(&rep) => assignment[v] = rep,
                None => {
                    bucket.push(v);
                    assignment[v] = v;
                }
            }
        }
        debug!(
            "classify: {} vertices, {} classes",
            props.len(),
            groups.values().map(Vec::len).sum::<usize>()
        );
        Ok(assignment)
    }
}
