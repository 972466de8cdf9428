//! The event state machine.
//!
//! An event's phase is a closed set of variants, [`Phase`].  Each variant's
//! behavior lives in its own zero-sized type implementing [`EventState`];
//! [`Phase::state`] maps the tag to that flyweight.  The flyweights hold no
//! per-event data; everything mutable lives on the [`EventCell`].
//!
//! ```text
//! Active      --suspend()-->        Suspended
//! Suspended   --resume()-->         Active        (when the count reaches 0)
//! Active      --queue dispatch-->   Dispatching --(callback returns)--> Dispatched
//! Descheduled                       (no transitions; proxy placeholder)
//! ```
//!
//! Every operation a variant does not support falls through to the trait's
//! default, which reports the appropriate [`SchedulingError`].  The one
//! exception is `dispatch`, which only the queue calls: on a non-active event
//! it is a bug in the queue and panics.
//!
//! # Meaning of the stored time
//!
//! | Phase         | `EventCell::time` holds                     |
//! |---------------|---------------------------------------------|
//! | `Active`      | due instant, as an offset from the epoch    |
//! | `Dispatching` | due instant, as an offset from the epoch    |
//! | `Dispatched`  | due instant, as an offset from the epoch    |
//! | `Suspended`   | remaining duration at the moment of suspend |
//! | `Descheduled` | unused                                      |

use std::fmt;
use std::rc::Rc;

use des_core::{Duration, Instant};

use crate::event::{EventCell, EventHandle, TransitionGuard};
use crate::queue::{Dispatch, Queue};
use crate::{QueueObserver, SchedResult, SchedulingError};

// ── Phase ─────────────────────────────────────────────────────────────────────

/// The current state-machine variant of an event.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Phase {
    /// Pending in its queue; eligible for dispatch once due.
    Active,
    /// Held back from dispatch by one or more outstanding suspends.
    Suspended,
    /// Placeholder with no due time and no pending entry.
    Descheduled,
    /// Its callback is running right now.
    Dispatching,
    /// Terminal: the callback has run and will not run again.
    Dispatched,
}

impl Phase {
    /// The flyweight implementing this phase's behavior.
    pub(crate) fn state(self) -> &'static dyn EventState {
        match self {
            Phase::Active      => &Active,
            Phase::Suspended   => &Suspended,
            Phase::Descheduled => &Descheduled,
            Phase::Dispatching => &Dispatching,
            Phase::Dispatched  => &Dispatched,
        }
    }

    /// `true` for [`Phase::Dispatched`], which no transition ever leaves.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Phase::Dispatched
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Active      => "active",
            Phase::Suspended   => "suspended",
            Phase::Descheduled => "descheduled",
            Phase::Dispatching => "dispatching",
            Phase::Dispatched  => "dispatched",
        };
        f.write_str(s)
    }
}

// ── EventState ────────────────────────────────────────────────────────────────

/// Phase-dependent event behavior.
///
/// Callers must hold the event's [`TransitionGuard`] before invoking
/// `suspend` or `resume`; `dispatch` acquires it itself.
pub(crate) trait EventState {
    fn phase(&self) -> Phase;

    fn is_active(&self) -> bool {
        false
    }

    fn is_suspended(&self) -> bool {
        false
    }

    /// Absolute due time.
    fn time_due(&self, event: &EventCell) -> SchedResult<Instant> {
        Err(SchedulingError::NoDueTime { event: event.id, phase: self.phase() })
    }

    /// Time left until the event is due, given the queue clock `now`.
    fn time_remaining(&self, event: &EventCell, _now: Instant) -> SchedResult<Duration> {
        Err(SchedulingError::NoRemainingTime { event: event.id, phase: self.phase() })
    }

    fn suspend(&self, event: &Rc<EventCell>, _queue: &Queue) -> SchedResult<()> {
        Err(illegal(event, "suspend", self.phase()))
    }

    fn resume(&self, event: &Rc<EventCell>, _queue: &Queue) -> SchedResult<()> {
        Err(illegal(event, "resume", self.phase()))
    }

    /// Run the event's callback.  Queue-internal.
    fn dispatch(&self, event: &Rc<EventCell>, _queue: &Queue, _observer: &mut dyn QueueObserver) {
        panic!("{} cannot be dispatched while it is {}", event.id, self.phase());
    }

    /// Hook run after the event's phase is set to this state.
    fn enter(&self, _event: &Rc<EventCell>, _queue: &Queue) {}

    /// Hook run before the event's phase leaves this state.
    fn exit(&self, _event: &Rc<EventCell>, _queue: &Queue) {}
}

fn illegal(event: &EventCell, op: &'static str, phase: Phase) -> SchedulingError {
    SchedulingError::IllegalTransition { event: event.id, op, phase }
}

/// Due time shared by the phases whose stored time is an absolute instant.
fn stored_due(event: &EventCell) -> Instant {
    Instant::at_offset(event.time.get())
}

// ── Active ────────────────────────────────────────────────────────────────────

pub(crate) struct Active;

impl EventState for Active {
    fn phase(&self) -> Phase {
        Phase::Active
    }

    fn is_active(&self) -> bool {
        true
    }

    fn time_due(&self, event: &EventCell) -> SchedResult<Instant> {
        Ok(stored_due(event))
    }

    fn time_remaining(&self, event: &EventCell, now: Instant) -> SchedResult<Duration> {
        Ok(stored_due(event).duration_since(now)?)
    }

    fn suspend(&self, event: &Rc<EventCell>, queue: &Queue) -> SchedResult<()> {
        debug_assert_eq!(event.suspend_count.get(), 0, "active event with outstanding suspends");
        let remaining = self.time_remaining(event, queue.now())?;
        event.suspend_count.set(1);
        event.change_phase(queue, Phase::Suspended);
        event.time.set(remaining);
        Ok(())
    }

    fn resume(&self, event: &Rc<EventCell>, _queue: &Queue) -> SchedResult<()> {
        Err(SchedulingError::NotSuspended(event.id))
    }

    fn dispatch(&self, event: &Rc<EventCell>, queue: &Queue, observer: &mut dyn QueueObserver) {
        let Ok(_guard) = TransitionGuard::enter(event) else {
            panic!("{} dispatched while a phase change is in progress", event.id);
        };

        event.change_phase(queue, Phase::Dispatching);
        queue.begin_dispatch(event.id);
        let finish = FinishDispatch { event, queue };

        let handle = EventHandle::from_cell(Rc::clone(event));
        let now = queue.now();
        observer.on_dispatch(&handle, now);

        let callback = event.callback.borrow_mut().take();
        if let Some(callback) = callback {
            callback(&Dispatch::new(queue, &handle));
        }

        drop(finish);
        observer.on_dispatched(event.id, now);
    }

    fn enter(&self, event: &Rc<EventCell>, queue: &Queue) {
        queue.schedule(event);
    }

    fn exit(&self, event: &Rc<EventCell>, queue: &Queue) {
        queue.deschedule(event);
    }
}

/// Completes a dispatch when dropped, so a panicking callback or observer
/// still leaves the event `Dispatched` and the queue free to dispatch again.
struct FinishDispatch<'a> {
    event: &'a Rc<EventCell>,
    queue: &'a Queue,
}

impl Drop for FinishDispatch<'_> {
    fn drop(&mut self) {
        self.event.change_phase(self.queue, Phase::Dispatched);
        self.queue.end_dispatch(self.event.id);
    }
}

// ── Suspended ─────────────────────────────────────────────────────────────────

pub(crate) struct Suspended;

impl EventState for Suspended {
    fn phase(&self) -> Phase {
        Phase::Suspended
    }

    fn is_suspended(&self) -> bool {
        true
    }

    fn time_remaining(&self, event: &EventCell, _now: Instant) -> SchedResult<Duration> {
        Ok(event.time.get())
    }

    /// Already suspended: only the reference count moves.
    fn suspend(&self, event: &Rc<EventCell>, _queue: &Queue) -> SchedResult<()> {
        let count = event
            .suspend_count
            .get()
            .checked_add(1)
            .ok_or(SchedulingError::SuspendOverflow(event.id))?;
        event.suspend_count.set(count);
        Ok(())
    }

    fn resume(&self, event: &Rc<EventCell>, queue: &Queue) -> SchedResult<()> {
        let count = event.suspend_count.get();
        if count > 1 {
            event.suspend_count.set(count - 1);
            return Ok(());
        }
        // Compute before touching anything so an overflow leaves the event as it was.
        let due = queue.now().checked_add(event.time.get())?;
        event.suspend_count.set(0);
        event.time.set(due.since_epoch());
        event.change_phase(queue, Phase::Active);
        Ok(())
    }
}

// ── Descheduled ───────────────────────────────────────────────────────────────

pub(crate) struct Descheduled;

impl EventState for Descheduled {
    fn phase(&self) -> Phase {
        Phase::Descheduled
    }
}

// ── Dispatching ───────────────────────────────────────────────────────────────

pub(crate) struct Dispatching;

impl EventState for Dispatching {
    fn phase(&self) -> Phase {
        Phase::Dispatching
    }

    fn time_due(&self, event: &EventCell) -> SchedResult<Instant> {
        Ok(stored_due(event))
    }

    fn time_remaining(&self, event: &EventCell, now: Instant) -> SchedResult<Duration> {
        Ok(stored_due(event).duration_since(now)?)
    }
}

// ── Dispatched ────────────────────────────────────────────────────────────────

pub(crate) struct Dispatched;

impl EventState for Dispatched {
    fn phase(&self) -> Phase {
        Phase::Dispatched
    }

    fn time_due(&self, event: &EventCell) -> SchedResult<Instant> {
        Ok(stored_due(event))
    }
}
