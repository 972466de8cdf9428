//! Queue observer trait for progress reporting and trace collection.

use des_core::{EventId, Instant};

use crate::{EventHandle, RunSummary};

/// Callbacks invoked by [`Queue::run`][crate::Queue::run] and
/// [`Queue::step_with`][crate::Queue::step_with] at key points of the
/// dispatch loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: dispatch counter
///
/// ```rust,ignore
/// struct Counter(u64);
///
/// impl QueueObserver for Counter {
///     fn on_dispatched(&mut self, _event: EventId, _now: Instant) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait QueueObserver {
    /// Called once when a run begins.
    fn on_run_start(&mut self, _now: Instant) {}

    /// Called whenever the clock moves forward.
    fn on_clock_advance(&mut self, _from: Instant, _to: Instant) {}

    /// Called just before `event`'s callback runs.
    ///
    /// The event is mid-transition at this point: suspending or resuming it
    /// from here fails with `ChangeInProgress`.
    fn on_dispatch(&mut self, _event: &EventHandle, _now: Instant) {}

    /// Called after the callback returns and the event is dispatched.
    fn on_dispatched(&mut self, _event: EventId, _now: Instant) {}

    /// Called once when a run returns.
    fn on_run_end(&mut self, _summary: &RunSummary) {}
}

/// A [`QueueObserver`] that does nothing.
pub struct NoopObserver;

impl QueueObserver for NoopObserver {}
