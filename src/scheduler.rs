//! Deferred continuations for a single-threaded, event-driven engine.
//!
//! Nothing in the engine ever blocks or sleeps.  Work that has to wait for
//! the host (re-reading geometry after an asynchronous resize, polling the
//! pointer during a drag, retiling a workspace after a migration) is queued
//! here with a deadline and run by the next tick at or after that deadline.
//!
//! Multi-step corrections are modelled with [`CheckState`]: each pending
//! check is `AwaitingGeometry` with a [`RetryBudget`], and ends either
//! `Verified` or `TimedOut`, in which case the owner runs its fallback.

use std::time::Instant;

#[derive(Debug)]
struct Pending<T> {
    seq: u64,
    due: Instant,
    task: T,
}

/// Queue of tasks ordered by deadline, then by scheduling order.
#[derive(Debug)]
pub struct Scheduler<T> {
    pending: Vec<Pending<T>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending { seq, due, task });
    }

    /// Remove and return every task due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        self.take_where(|p| p.due <= now)
    }

    /// Remove and return every task matching `pred`, regardless of deadline.
    pub fn take_matching(&mut self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.take_where(|p| pred(&p.task))
    }

    /// Drop every task matching `pred`; returns how many were dropped.
    pub fn cancel_matching(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| !pred(&p.task));
        before - self.pending.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    /// Drop everything; returns how many tasks were pending.
    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn take_where(&mut self, pred: impl Fn(&Pending<T>) -> bool) -> Vec<T> {
        let (mut taken, kept): (Vec<Pending<T>>, Vec<Pending<T>>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| pred(p));
        self.pending = kept;
        taken.sort_by_key(|p| (p.due, p.seq));
        taken.into_iter().map(|p| p.task).collect()
    }
}

/// Number of attempts a check has made against its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    attempt: u32,
    limit: u32,
}

impl RetryBudget {
    pub fn new(limit: u32) -> Self {
        Self { attempt: 0, limit }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn exhausted(&self) -> bool {
        self.attempt >= self.limit
    }

    /// The budget after one more attempt, or `None` if none are left.
    pub fn spend(self) -> Option<Self> {
        if self.exhausted() {
            None
        } else {
            Some(Self {
                attempt: self.attempt + 1,
                limit: self.limit,
            })
        }
    }
}

/// Life cycle of a deferred geometry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    AwaitingGeometry { budget: RetryBudget },
    Verified,
    TimedOut,
}

impl CheckState {
    pub fn start(retries: u32) -> Self {
        CheckState::AwaitingGeometry {
            budget: RetryBudget::new(retries),
        }
    }

    /// Next state after geometry has been re-read.
    ///
    /// A consistent reading verifies the check.  An inconsistent one spends
    /// one retry (the caller issues a correction and reschedules) or, with
    /// the budget gone, times out.  Terminal states stay put.
    pub fn advance(self, consistent: bool) -> Self {
        match self {
            CheckState::AwaitingGeometry { .. } if consistent => CheckState::Verified,
            CheckState::AwaitingGeometry { budget } => match budget.spend() {
                Some(budget) => CheckState::AwaitingGeometry { budget },
                None => CheckState::TimedOut,
            },
            terminal => terminal,
        }
    }
}
