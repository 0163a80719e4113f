//! Worker crew for kernels that discover their workload as they go.
//!
//! Build and spread cannot shard their work up front: connecting an edge may
//! reach into another lane's territory and create work there. The crew runs
//! one OS thread per lane, each owning a bounded queue. Posting to a full
//! remote queue never blocks the poster outright; the task is parked in a
//! local overflow buffer and retried while the poster keeps draining its own
//! queue, so back-pressure cannot deadlock even on cyclic graphs.
//!
//! Termination uses a single atomic pending count: it is raised before a
//! task is enqueued anywhere and lowered after the task has run (including
//! whatever it posted). The lane that lowers it to zero broadcasts quit.
//!
//! When the kill switch trips, lanes keep draining their queues but discard
//! the tasks unprocessed, so the pending count still reaches zero and the
//! crew converges at the barrier with [`Error::Killed`].

use crate::error::Result;
use crate::runner::{ErrorSlot, Runner};
use log::trace;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, TrySendError, sync_channel};

enum Msg<T> {
    Task(T),
    Quit,
}

/// Hands a running task the means to create more work.
pub(crate) struct Outbox<'a, T> {
    me: usize,
    lanes: usize,
    senders: &'a [SyncSender<Msg<T>>],
    pending: &'a AtomicUsize,
    local: &'a mut VecDeque<T>,
    overflow: &'a mut VecDeque<(usize, T)>,
}

impl<T> Outbox<'_, T> {
    /// The lane owning a hash value.
    pub(crate) fn lane_of(&self, hash: u64) -> usize {
        (hash as usize) % self.lanes
    }

    /// Enqueue a task on the given lane.
    pub(crate) fn post(&mut self, lane: usize, task: T) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        if lane == self.me {
            self.local.push_back(task);
            return;
        }
        match self.senders[lane].try_send(Msg::Task(task)) {
            Ok(()) => {}
            Err(TrySendError::Full(Msg::Task(task))) => self.overflow.push_back((lane, task)),
            Err(_) => {
                // receiver gone; the task is lost but accounted for
                self.pending.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }
}

/// Run a crew of `lanes` workers over the seeded tasks, threading one state
/// value per lane through its handler, and return the per-lane states.
///
/// The handler runs strictly sequentially within a lane (FIFO); across
/// lanes, ordering is undefined. The first handler error kills the crew and
/// becomes the result.
pub(crate) fn run<T, S, H>(
    runner: &Runner,
    lanes: usize,
    seeds: Vec<(usize, T)>,
    states: Vec<S>,
    handler: H,
) -> Result<Vec<S>>
where
    T: Send,
    S: Send,
    H: Fn(usize, &mut S, T, &mut Outbox<'_, T>) -> Result<()> + Sync,
{
    assert_eq!(states.len(), lanes);
    runner.check()?;
    if seeds.is_empty() {
        return Ok(states);
    }

    let depth = runner.queue_depth.max(1);
    let pending = AtomicUsize::new(seeds.len());
    let slot = ErrorSlot::new(runner);

    let mut senders = Vec::with_capacity(lanes);
    let mut receivers = Vec::with_capacity(lanes);
    for _ in 0..lanes {
        let (tx, rx) = sync_channel::<Msg<T>>(depth);
        senders.push(tx);
        receivers.push(rx);
    }

    let collected = std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(lanes);
        for (lane, (state, rx)) in states.into_iter().zip(receivers).enumerate() {
            let senders = &senders;
            let pending = &pending;
            let slot = &slot;
            let handler = &handler;
            handles.push(scope.spawn(move || {
                work_lane(lane, state, rx, senders, pending, slot, handler)
            }));
        }

        // seed after the workers are live so a full queue drains
        for (lane, task) in seeds {
            let _ = senders[lane].send(Msg::Task(task));
        }

        handles
            .into_iter()
            .map(|h| h.join().expect("crew worker panicked"))
            .collect::<Vec<S>>()
    });

    slot.verdict()?;
    Ok(collected)
}

fn work_lane<T, S, H>(
    me: usize,
    mut state: S,
    rx: Receiver<Msg<T>>,
    senders: &[SyncSender<Msg<T>>],
    pending: &AtomicUsize,
    slot: &ErrorSlot<'_>,
    handler: &H,
) -> S
where
    T: Send,
    H: Fn(usize, &mut S, T, &mut Outbox<'_, T>) -> Result<()> + Sync,
{
    let lanes = senders.len();
    let mut local: VecDeque<T> = VecDeque::new();
    let mut overflow: VecDeque<(usize, T)> = VecDeque::new();
    trace!("lane {me} up");

    loop {
        // retry parked cross-lane posts
        for _ in 0..overflow.len() {
            let (lane, task) = overflow.pop_front().unwrap();
            match senders[lane].try_send(Msg::Task(task)) {
                Ok(()) => {}
                Err(TrySendError::Full(Msg::Task(task))) => overflow.push_back((lane, task)),
                Err(_) => {
                    pending.fetch_sub(1, Ordering::AcqRel);
                }
            }
        }

        let task = if let Some(task) = local.pop_front() {
            task
        } else if overflow.is_empty() {
            match rx.recv() {
                Ok(Msg::Task(task)) => task,
                Ok(Msg::Quit) | Err(_) => break,
            }
        } else {
            match rx.try_recv() {
                Ok(Msg::Task(task)) => task,
                Ok(Msg::Quit) => break,
                Err(TryRecvError::Empty) => {
                    std::thread::yield_now();
                    continue;
                }
                Err(TryRecvError::Disconnected) => break,
            }
        };

        if slot.stopped() {
            drop(task); // drain, discarding
        } else {
            let mut outbox = Outbox {
                me,
                lanes,
                senders,
                pending,
                local: &mut local,
                overflow: &mut overflow,
            };
            if let Err(e) = handler(me, &mut state, task, &mut outbox) {
                slot.post(e);
            }
        }

        if pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            trace!("lane {me} broadcasting quit");
            for tx in senders {
                let _ = tx.try_send(Msg::Quit);
            }
            break;
        }
    }
    trace!("lane {me} down");
    state
}
