use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Reason a search stopped before running out of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    Cancelled,
    TimedOut,
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interruption::Cancelled => write!(f, "cancelled"),
            Interruption::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Cooperative cancellation source.
///
/// The engine polls it before every successor generation and evaluation
/// call and periodically while attaching successors. Evaluators receive it
/// as well so long evaluations can bail out on the same signal.
pub trait StopCheck {
    /// Return `Some` once the search must stop.
    fn poll(&self) -> Option<Interruption>;
}

impl<F> StopCheck for F
where
    F: Fn() -> Option<Interruption>,
{
    fn poll(&self) -> Option<Interruption> {
        self()
    }
}

/// Combination of two stop sources; the first one to fire wins.
#[derive(Debug, Clone)]
pub struct FirstOf<S1, S2>(pub S1, pub S2);

impl<S1, S2> StopCheck for FirstOf<S1, S2>
where
    S1: StopCheck,
    S2: StopCheck,
{
    fn poll(&self) -> Option<Interruption> {
        self.0.poll().or_else(|| self.1.poll())
    }
}

/// Stop source that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopCheck for NeverStop {
    fn poll(&self) -> Option<Interruption> {
        None
    }
}

/// Shared flag another thread (or a callback) can raise to cancel a search.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Observed at the next cooperative check.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl StopCheck for CancelFlag {
    fn poll(&self) -> Option<Interruption> {
        self.is_cancelled().then_some(Interruption::Cancelled)
    }
}

/// Wall-clock budget.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Time left before the deadline, zero once it passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

impl StopCheck for Deadline {
    fn poll(&self) -> Option<Interruption> {
        (Instant::now() >= self.at).then_some(Interruption::TimedOut)
    }
}
