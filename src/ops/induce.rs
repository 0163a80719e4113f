//! Dependency-ordered folds over a zone.
//!
//! Induction explores the zone away from its initial vertex and propagates
//! values back toward it: in a forward zone a vertex's value folds over
//! its outgoing edges' target values, in a backward zone over its incident
//! edges' origin values. Every vertex's fold is seeded with the mandatory
//! vacuous case, so a vertex on the zone's far frontier is worth exactly
//! the seed.
//!
//! Scheduling is by ready waves: a vertex becomes ready when all values it
//! depends on exist, and each wave is evaluated in parallel. If no vertex
//! is ready while some remain, the zone is cyclic and the kernel fails.
//! The value computed at the zone's initial vertex — evaluated last, even
//! when the offset excludes it from the zone proper — is the result.

use crate::contract::{Bop, Nop, Payload};
use crate::error::{Error, Result};
use crate::graph::{Graph, Marks, Vid};
use crate::runner::Runner;
use crate::zone::{Zone, working_set};
use log::debug;
use rayon::prelude::*;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type InduceMap<V, E, R> = Arc<dyn Fn(&V, &E, &R) -> Result<R> + Send + Sync>;

/// Operator bundle for [`Graph::induced`].
pub struct Inducer<V, E, R> {
    zone: Option<Zone<V>>,
    map: InduceMap<V, E, R>,
    reduce: Bop<R>,
    vacuous: Nop<R>,
}

impl<V: Payload, E: Payload, R: Payload> Inducer<V, E, R> {
    /// An inducer from its map, reduction, and seed.
    ///
    /// The map sees (local payload, connecting label, remote value) for
    /// each edge toward the zone's far side.
    pub fn new(
        map: impl Fn(&V, &E, &R) -> Result<R> + Send + Sync + 'static,
        reduce: impl Fn(R, R) -> Result<R> + Send + Sync + 'static,
        vacuous: impl Fn() -> Result<R> + Send + Sync + 'static,
    ) -> Self {
        Self {
            zone: None,
            map: Arc::new(map),
            reduce: Arc::new(reduce),
            vacuous: Arc::new(vacuous),
        }
    }

    /// Restrict the induction to a zone.
    pub fn zoned(mut self, zone: Zone<V>) -> Self {
        self.zone = Some(zone);
        self
    }
}

impl<V: Payload, E: Payload> Graph<V, E> {
    /// Fold a value over the zone, returning the one computed at its
    /// initial vertex.
    pub fn induced<R: Payload>(&self, i: &Inducer<V, E, R>, runner: &Runner) -> Result<R> {
        let ws = working_set(self, i.zone.as_ref())?;
        debug!("induce: {} working vertices", ws.members.len());

        // the computed set: the zone plus its initial vertex
        let mut in_comp = ws.in_set.clone();
        in_comp[ws.initial] = true;
        let mut comp: Vec<Vid> = ws.members.clone();
        if !ws.in_set[ws.initial] {
            comp.push(ws.initial);
        }

        // dependencies point toward the far side of the zone
        let deps = |v: Vid| -> Vec<(usize, &crate::graph::EdgeRecord<E>, Vid)> {
            if ws.backwards {
                self.verts[v]
                    .inc
                    .iter()
                    .filter(|b| in_comp[b.origin])
                    .map(|b| (b.origin, &self.verts[b.origin].out[b.slot], b.origin))
                    .collect()
            } else {
                self.verts[v]
                    .out
                    .iter()
                    .filter(|e| in_comp[e.target])
                    .map(|e| (e.target, e, e.target))
                    .collect()
            }
        };
        // who depends on v (for readiness bookkeeping)
        let dependents = |v: Vid| -> Vec<Vid> {
            if ws.backwards {
                self.verts[v]
                    .out
                    .iter()
                    .filter(|e| in_comp[e.target])
                    .map(|e| e.target)
                    .collect()
            } else {
                self.verts[v]
                    .inc
                    .iter()
                    .filter(|b| in_comp[b.origin])
                    .map(|b| b.origin)
                    .collect()
            }
        };

        let waiting: Vec<AtomicUsize> = (0..self.verts.len())
            .map(|_| AtomicUsize::new(0))
            .collect();
        for &v in &comp {
            waiting[v].store(deps(v).len(), Ordering::Relaxed);
        }
        let values: Vec<OnceLock<R>> = (0..self.verts.len()).map(|_| OnceLock::new()).collect();

        self.clear_marks();
        let mut wave: Vec<Vid> = comp
            .iter()
            .copied()
            .filter(|&v| waiting[v].load(Ordering::Relaxed) == 0)
            .collect();
        for &v in &wave {
            self.verts[v].marks.set(Marks::PENDING);
        }
        let mut done = 0usize;
        let pool = runner.pool()?;
        while !wave.is_empty() {
            runner.check()?;
            done += wave.len();
            let next: Vec<Vec<Vid>> = pool.install(|| {
                wave.par_iter()
                    .map(|&v| -> Result<Vec<Vid>> {
                        runner.check()?;
                        let mut acc = (i.vacuous)()?;
                        for (_, e, remote) in deps(v) {
                            let value = values[remote].get().expect("dependency computed");
                            let image = (i.map)(&self.verts[v].payload, e.label.get(), value)?;
                            acc = (i.reduce)(acc, image)?;
                        }
                        let _ = values[v].set(acc); // each vertex joins one wave
                        let mut ready = Vec::new();
                        for d in dependents(v) {
                            if waiting[d].fetch_sub(1, Ordering::AcqRel) == 1 {
                                self.verts[d].marks.set(Marks::PENDING);
                                ready.push(d);
                            }
                        }
                        Ok(ready)
                    })
                    .collect::<Result<_>>()
            })?;
            wave = next.into_iter().flatten().collect();
        }
        self.clear_marks();
        if done < comp.len() {
            return Err(Error::Cyclic);
        }

        let initial = ws.initial;
        values
            .into_iter()
            .nth(initial)
            .and_then(OnceLock::into_inner)
            .ok_or(Error::Cyclic)
    }
}
