// src/schedule/mod.rs
//! Deferred production steps.
//!
//! Every step is stamped with the generation epoch it was scheduled in.
//! `cancel_pending` drops everything queued and moves to a new epoch, so a
//! step that still carries an older epoch is discarded instead of writing into
//! a building that no longer exists.

use crate::error::{GenError, Result};
use crate::grammar::PendingStep;
use log::trace;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Instant;

/// A grammar step for one building of the current pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledStep {
    /// Index of the building in the generator's building list.
    pub building: usize,
    pub step: PendingStep,
}

#[derive(Debug)]
struct Task {
    epoch: u64,
    due: Instant,
    seq: u64,
    item: ScheduledStep,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    // Reversed: the heap pops the earliest due, then the earliest scheduled.
    fn cmp(&self, other: &Self) -> Ordering {
        other.due.cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
struct QueueState {
    epoch: u64,
    /// A pass is running and has not been cancelled.
    live: bool,
    next_seq: u64,
    tasks: BinaryHeap<Task>,
    rebuild_requested: bool,
}

impl QueueState {
    fn check_epoch(&self, captured: u64) -> Result<()> {
        if captured != self.epoch {
            return Err(GenError::StaleProduction { captured, current: self.epoch });
        }
        Ok(())
    }

    fn cancel(&mut self) -> usize {
        if !self.live && self.tasks.is_empty() {
            return 0;
        }
        let dropped = self.tasks.len();
        self.tasks.clear();
        self.epoch += 1;
        self.live = false;
        dropped
    }

    fn pop_where(&mut self, ready: impl Fn(&Task) -> bool) -> Option<(u64, ScheduledStep)> {
        while self.tasks.peek().is_some_and(&ready) {
            let task = self.tasks.pop()?;
            match self.check_epoch(task.epoch) {
                Ok(()) => return Some((task.epoch, task.item)),
                Err(e) => trace!("dropping step for building {}: {}", task.item.building, e),
            }
        }
        None
    }
}

/// Single-consumer queue of deferred steps, shared with `QueueHandle`s.
#[derive(Debug, Clone, Default)]
pub struct ProductionQueue {
    state: Arc<Mutex<QueueState>>,
}

impl ProductionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Starts a pass in a fresh epoch and returns it.
    pub fn begin_pass(&self) -> u64 {
        let mut state = self.state.lock();
        state.epoch += 1;
        state.live = true;
        state.epoch
    }

    /// Queues a step captured in `epoch`. Returns false if the epoch is stale
    /// and the step was dropped.
    pub fn push(&self, epoch: u64, due: Instant, item: ScheduledStep) -> bool {
        let mut state = self.state.lock();
        if let Err(e) = state.check_epoch(epoch) {
            trace!("not scheduling step for building {}: {}", item.building, e);
            return false;
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.push(Task { epoch, due, seq, item });
        true
    }

    /// Next step due at or before `now`, with the epoch it was captured in.
    pub fn pop_due(&self, now: Instant) -> Option<(u64, ScheduledStep)> {
        self.state.lock().pop_where(|t| t.due <= now)
    }

    /// Next step regardless of its due time.
    pub fn pop_next(&self) -> Option<(u64, ScheduledStep)> {
        self.state.lock().pop_where(|_| true)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.state.lock().tasks.peek().map(|t| t.due)
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }

    /// Fails with `StaleProduction` if `captured` is no longer current.
    pub fn check_epoch(&self, captured: u64) -> Result<()> {
        self.state.lock().check_epoch(captured)
    }

    /// Drops every pending step and invalidates the current epoch. Calling it
    /// again with nothing live changes nothing.
    pub fn cancel_pending(&self) -> usize {
        let dropped = self.state.lock().cancel();
        if dropped > 0 {
            trace!("cancelled {} pending steps", dropped);
        }
        dropped
    }

    pub fn handle(&self) -> QueueHandle {
        QueueHandle { state: Arc::clone(&self.state) }
    }

    /// Clears and returns a pending rebuild request.
    pub fn take_rebuild_request(&self) -> bool {
        std::mem::take(&mut self.state.lock().rebuild_requested)
    }
}

/// Thread-safe remote control for a queue, e.g. for a host's "rebuild" key.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    state: Arc<Mutex<QueueState>>,
}

impl QueueHandle {
    pub fn cancel_pending(&self) -> usize {
        self.state.lock().cancel()
    }

    /// Cancels pending work now and asks the driver to rebuild on its next tick.
    pub fn request_rebuild(&self) {
        let mut state = self.state.lock();
        state.cancel();
        state.rebuild_requested = true;
    }

    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    pub fn pending(&self) -> usize {
        self.state.lock().tasks.len()
    }
}
