//! Events: the per-event cell and the caller-facing [`EventHandle`].
//!
//! # Ownership
//!
//! An event's data lives in one reference-counted [`EventCell`].  While the
//! event is active the owning queue holds a strong reference in its pending
//! ordering; every [`EventHandle`] holds another.  The cell's reference back
//! to its queue is a `Weak`, so no ownership cycle exists between the two.
//!
//! A suspended event is held only by its handles.  Dropping every handle to
//! a suspended event discards it, which is how a pending event is cancelled.
//! A callback that keeps a strong [`EventHandle`] to its own event forms a
//! cycle that is never freed once the event is suspended; callbacks that need
//! their own event capture a [`WeakEventHandle`] instead, or use
//! [`Dispatch::event`][crate::Dispatch::event].
//!
//! # Reentrancy
//!
//! Every operation that may change an event's phase first acquires the
//! event's [`TransitionGuard`].  The queue holds that guard for the whole of
//! a dispatch, so a callback that tries to suspend or resume its own event
//! gets [`SchedulingError::ChangeInProgress`] instead of corrupting state.

use std::cell::{Cell, RefCell};
use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::rc::{Rc, Weak};

use des_core::{Duration, EventId, Instant};
use tracing::{debug, trace};

use crate::queue::{Callback, PendingKey, Queue, QueueShared};
use crate::state::{EventState, Phase};
use crate::{SchedResult, SchedulingError};

// ── EventCell ─────────────────────────────────────────────────────────────────

/// Shared per-event state.  Mutated only through [`EventCell::change_phase`]
/// and the [`EventState`] implementations.
pub(crate) struct EventCell {
    pub(crate) id:            EventId,
    pub(crate) priority:      i32,
    pub(crate) owner:         Weak<QueueShared>,
    pub(crate) phase:         Cell<Phase>,
    /// Phase-dependent; see the table in [`crate::state`].
    pub(crate) time:          Cell<Duration>,
    pub(crate) suspend_count: Cell<u32>,
    /// Position in the owner's pending ordering while active.
    pub(crate) key:           Cell<Option<PendingKey>>,
    pub(crate) in_transition: Cell<bool>,
    pub(crate) callback:      RefCell<Option<Callback>>,
}

impl EventCell {
    pub(crate) fn new(
        id:       EventId,
        priority: i32,
        owner:    Weak<QueueShared>,
        phase:    Phase,
        time:     Duration,
        callback: Option<Callback>,
    ) -> Self {
        Self {
            id,
            priority,
            owner,
            phase:         Cell::new(phase),
            time:          Cell::new(time),
            suspend_count: Cell::new(0),
            key:           Cell::new(None),
            in_transition: Cell::new(false),
            callback:      RefCell::new(callback),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> &'static dyn EventState {
        self.phase.get().state()
    }

    /// Run the initial state's entry hook.  Called once, right after
    /// construction.
    pub(crate) fn start(self: &Rc<Self>, queue: &Queue) {
        self.state().enter(self, queue);
    }

    /// Move to `to`, running the old state's exit hook and the new state's
    /// entry hook around the switch.
    pub(crate) fn change_phase(self: &Rc<Self>, queue: &Queue, to: Phase) {
        let from = self.phase.get();
        from.state().exit(self, queue);
        self.phase.set(to);
        to.state().enter(self, queue);
        trace!(event = %self.id, %from, %to, now = %queue.now(), "phase change");
    }

    /// The queue this event belongs to, if it still exists.
    pub(crate) fn owner(&self) -> SchedResult<Queue> {
        self.owner
            .upgrade()
            .map(Queue::from_shared)
            .ok_or(SchedulingError::QueueDropped(self.id))
    }
}

// ── TransitionGuard ───────────────────────────────────────────────────────────

/// Marks an event as mid-transition for as long as the guard lives.
pub(crate) struct TransitionGuard<'a>(&'a EventCell);

impl<'a> TransitionGuard<'a> {
    /// Fails with `ChangeInProgress` if another transition of `event` is
    /// already underway.
    pub(crate) fn enter(event: &'a EventCell) -> SchedResult<Self> {
        if event.in_transition.replace(true) {
            return Err(SchedulingError::ChangeInProgress(event.id));
        }
        Ok(Self(event))
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.0.in_transition.set(false);
    }
}

// ── EventHandle ───────────────────────────────────────────────────────────────

/// A cheap, cloneable reference to one scheduled event.
///
/// Obtained from [`Queue::schedule_in`], [`EventBuilder::build`], or inside a
/// callback from [`Dispatch::event`][crate::Dispatch::event].
///
/// [`EventBuilder::build`]: crate::EventBuilder::build
#[derive(Clone)]
pub struct EventHandle(pub(crate) Rc<EventCell>);

impl EventHandle {
    pub(crate) fn from_cell(cell: Rc<EventCell>) -> Self {
        Self(cell)
    }

    #[inline]
    pub fn id(&self) -> EventId {
        self.0.id
    }

    /// Higher values dispatch first among events due at the same instant.
    #[inline]
    pub fn priority(&self) -> i32 {
        self.0.priority
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.0.phase.get()
    }

    /// Number of suspends not yet matched by a resume.
    #[inline]
    pub fn suspend_count(&self) -> u32 {
        self.0.suspend_count.get()
    }

    pub fn is_active(&self) -> bool {
        self.0.state().is_active()
    }

    pub fn is_suspended(&self) -> bool {
        self.0.state().is_suspended()
    }

    pub fn is_dispatched(&self) -> bool {
        self.phase().is_terminal()
    }

    /// `true` iff the event is active and its queue is live.
    pub fn is_scheduled(&self) -> bool {
        self.is_active() && self.0.owner.upgrade().is_some_and(|q| q.is_live())
    }

    /// Suspend the event.
    ///
    /// The first suspend removes an active event from its queue and records
    /// how long it still had to wait.  Further suspends only increase the
    /// suspend count; each needs a matching [`resume`][Self::resume].
    ///
    /// # Errors
    /// - `ChangeInProgress` if called re-entrantly (e.g. from this event's
    ///   own callback).
    /// - `IllegalTransition` if the event is dispatching, dispatched, or
    ///   descheduled.
    /// - `QueueDropped` if the owning queue no longer exists.
    pub fn suspend(&self) -> SchedResult<()> {
        self.transition("suspend", |state, cell, queue| state.suspend(cell, queue))
    }

    /// Undo one [`suspend`][Self::suspend].
    ///
    /// When the suspend count reaches zero the event becomes active again,
    /// due at `now + remaining`.
    ///
    /// # Errors
    /// - `NotSuspended` if the suspend count is already zero.
    /// - `ChangeInProgress`, `IllegalTransition`, `QueueDropped` as for
    ///   `suspend`.
    pub fn resume(&self) -> SchedResult<()> {
        self.transition("resume", |state, cell, queue| state.resume(cell, queue))
    }

    /// Absolute due time.  Fails while suspended or descheduled.
    pub fn due_time(&self) -> SchedResult<Instant> {
        self.0.state().time_due(&self.0)
    }

    /// Time left until due.  Fails once dispatched or while descheduled.
    pub fn time_remaining(&self) -> SchedResult<Duration> {
        let queue = self.0.owner()?;
        self.0.state().time_remaining(&self.0, queue.now())
    }

    /// Scheduling order: earlier due time first, then higher priority first.
    ///
    /// An absent `other` always sorts before `self` (`self` is greater).
    /// Only meaningful for two active events of the same queue; for any other
    /// pair the raw stored times are compared.
    pub fn cmp_schedule(&self, other: Option<&EventHandle>) -> Ordering {
        let Some(other) = other else {
            return Ordering::Greater;
        };
        let key = |c: &EventCell| (c.time.get(), Reverse(c.priority));
        key(&self.0).cmp(&key(&other.0))
    }

    /// `true` if both handles refer to the same event.
    pub fn ptr_eq(&self, other: &EventHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A handle that does not keep the event alive.
    pub fn downgrade(&self) -> WeakEventHandle {
        WeakEventHandle(Rc::downgrade(&self.0))
    }

    pub(crate) fn belongs_to(&self, shared: &Rc<QueueShared>) -> bool {
        std::ptr::eq(self.0.owner.as_ptr(), Rc::as_ptr(shared))
    }

    /// Shared guarded-transition protocol for `suspend` and `resume`.
    fn transition<F>(&self, op: &'static str, f: F) -> SchedResult<()>
    where
        F: FnOnce(&'static dyn EventState, &Rc<EventCell>, &Queue) -> SchedResult<()>,
    {
        let result = TransitionGuard::enter(&self.0).and_then(|_guard| {
            let queue = self.0.owner()?;
            f(self.0.state(), &self.0, &queue)
        });
        if let Err(e) = &result {
            debug!(event = %self.0.id, op, error = %e, "transition rejected");
        }
        result
    }
}

impl fmt::Debug for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandle")
            .field("id", &self.0.id)
            .field("priority", &self.0.priority)
            .field("phase", &self.0.phase.get())
            .field("suspend_count", &self.0.suspend_count.get())
            .finish()
    }
}

// ── WeakEventHandle ───────────────────────────────────────────────────────────

/// A non-owning reference to an event, from [`EventHandle::downgrade`].
///
/// Lets a callback refer to its own event without keeping it alive.
#[derive(Clone)]
pub struct WeakEventHandle(Weak<EventCell>);

impl WeakEventHandle {
    /// The event, if anything still owns it.
    pub fn upgrade(&self) -> Option<EventHandle> {
        self.0.upgrade().map(EventHandle)
    }
}

impl fmt::Debug for WeakEventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(handle) => f.debug_tuple("WeakEventHandle").field(&handle.id()).finish(),
            None => f.write_str("WeakEventHandle(dropped)"),
        }
    }
}
