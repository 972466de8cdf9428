//! The event queue: pending ordering, logical clock, and dispatch loop.
//!
//! # Ordering
//!
//! Active events sit in a `BTreeMap` keyed by [`PendingKey`]:
//!
//! ```text
//! (due time ascending, priority descending, insertion sequence ascending)
//! ```
//!
//! The sequence number is drawn from a per-queue counter each time an event
//! enters the ordering (at construction and again on every resume), so equal
//! (time, priority) pairs dispatch first-come, first-served and identical
//! inputs always produce identical dispatch order.
//!
//! # Clock
//!
//! There is no fixed time step.  Each dispatch advances the clock to the due
//! time of the event being dispatched; the clock never moves backwards.
//!
//! # Borrowing
//!
//! The queue's mutable state sits in a `RefCell`.  No borrow is ever held
//! across a call into user code (callbacks, observers), so callbacks are free
//! to schedule, suspend, and resume other events on the same queue.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::rc::Rc;

use des_core::{Duration, EventId, Instant, SimConfig, SimRng};
use tracing::debug;

use crate::event::{EventCell, EventHandle};
use crate::observer::{NoopObserver, QueueObserver};
use crate::state::Phase;
use crate::{EventBuilder, SchedResult};

/// Boxed dispatch callback.
pub(crate) type Callback = Box<dyn FnOnce(&Dispatch<'_>)>;

// ── PendingKey ────────────────────────────────────────────────────────────────

/// Sort key of one active event.  Field order defines dispatch order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub(crate) struct PendingKey {
    pub(crate) due:      Instant,
    pub(crate) priority: Reverse<i32>,
    pub(crate) seq:      u64,
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// Result of a single [`Queue::step`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    /// The earliest pending event was dispatched.
    Dispatched(EventId),
    /// Nothing is pending.
    Idle,
    /// The queue is not live; nothing was dispatched.
    Held,
    /// Called from inside a dispatch; the queue dispatches one event at a time.
    Busy,
}

/// Why a [`Queue::run`] call returned.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StopReason {
    /// The pending ordering is empty.  Normal termination for a terminating
    /// model; usually a modelling error for a non-terminating one.
    OutOfEvents,
    /// [`Queue::request_stop`] was called.
    StopRequested,
    /// The next event is due after this limit; the clock now reads the limit.
    TimeLimit(Instant),
    /// This many events were dispatched by the run.
    DispatchLimit(u64),
    /// The queue is not live.
    Held,
    /// Called from inside a dispatch.
    Busy,
}

/// Summary returned by every run variant.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RunSummary {
    pub reason:     StopReason,
    /// Events dispatched by this run call.
    pub dispatched: u64,
    /// Clock value when the run returned.
    pub now:        Instant,
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Context handed to an event's callback while it is being dispatched.
pub struct Dispatch<'a> {
    queue: &'a Queue,
    event: &'a EventHandle,
}

impl<'a> Dispatch<'a> {
    pub(crate) fn new(queue: &'a Queue, event: &'a EventHandle) -> Self {
        Self { queue, event }
    }

    /// The queue dispatching this event.  Use it to schedule follow-up events.
    #[inline]
    pub fn queue(&self) -> &'a Queue {
        self.queue
    }

    /// The event being dispatched.  Its phase cannot be changed from here.
    #[inline]
    pub fn event(&self) -> &'a EventHandle {
        self.event
    }

    #[inline]
    pub fn now(&self) -> Instant {
        self.queue.now()
    }
}

// ── Queue internals ───────────────────────────────────────────────────────────

pub(crate) struct QueueCore {
    config:         SimConfig,
    clock:          Instant,
    pending:        BTreeMap<PendingKey, Rc<EventCell>>,
    next_id:        EventId,
    next_seq:       u64,
    /// The event currently dispatching, if any.
    current:        Option<EventId>,
    dispatched:     u64,
    live:           bool,
    stop_requested: bool,
}

pub(crate) struct QueueShared {
    core: RefCell<QueueCore>,
    rng:  RefCell<SimRng>,
}

impl QueueShared {
    pub(crate) fn is_live(&self) -> bool {
        self.core.borrow().live
    }
}

impl Drop for QueueShared {
    /// Pending callbacks may hold handles to one another; dropping them here
    /// breaks any reference cycles among events left in the queue.
    fn drop(&mut self) {
        let core = self.core.get_mut();
        for event in core.pending.values() {
            event.callback.borrow_mut().take();
        }
        core.pending.clear();
    }
}

// ── Queue ─────────────────────────────────────────────────────────────────────

/// One simulated clock and its pending work.
///
/// Not `Clone`: the queue is owned by the simulation driver.  Callbacks reach
/// it through [`Dispatch::queue`], and event handles keep only a weak
/// reference to it.
///
/// # Panics in callbacks
///
/// A panic in a callback (or in an observer hook) propagates out of
/// [`step`][Self::step] or [`run`][Self::run].  The event being dispatched
/// still ends up `Dispatched` and counted, so the queue can be driven again
/// after the panic is caught.
pub struct Queue {
    shared: Rc<QueueShared>,
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl Queue {
    /// A queue with [`SimConfig::default`]: clock at the epoch, no limits.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        let core = QueueCore {
            clock:          config.start,
            pending:        BTreeMap::new(),
            next_id:        EventId(0),
            next_seq:       0,
            current:        None,
            dispatched:     0,
            live:           true,
            stop_requested: false,
            config,
        };
        let rng = SimRng::new(core.config.seed);
        Self {
            shared: Rc::new(QueueShared {
                core: RefCell::new(core),
                rng:  RefCell::new(rng),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Rc<QueueShared>) -> Self {
        Self { shared }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Current logical clock value.
    #[inline]
    pub fn now(&self) -> Instant {
        self.shared.core.borrow().clock
    }

    pub fn config(&self) -> SimConfig {
        self.shared.core.borrow().config.clone()
    }

    /// Number of active events awaiting dispatch.
    pub fn pending_len(&self) -> usize {
        self.shared.core.borrow().pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.shared.core.borrow().pending.is_empty()
    }

    /// Due time and id of the event the next step would dispatch.
    pub fn peek_next(&self) -> Option<(Instant, EventId)> {
        self.shared
            .core
            .borrow()
            .pending
            .first_key_value()
            .map(|(key, event)| (key.due, event.id))
    }

    /// Total events dispatched over the queue's lifetime.
    pub fn dispatched_count(&self) -> u64 {
        self.shared.core.borrow().dispatched
    }

    /// The event currently dispatching, if any.
    pub fn current(&self) -> Option<EventId> {
        self.shared.core.borrow().current
    }

    pub fn is_live(&self) -> bool {
        self.shared.is_live()
    }

    /// Mark the queue as part of a live run (or not).  A queue that is not
    /// live dispatches nothing and none of its events count as scheduled.
    pub fn set_live(&self, live: bool) {
        self.shared.core.borrow_mut().live = live;
    }

    /// `true` iff `event` belongs to this queue, is active, and the queue is
    /// live.
    pub fn is_scheduled(&self, event: &EventHandle) -> bool {
        event.belongs_to(&self.shared) && event.is_scheduled()
    }

    /// Borrow the queue's seeded RNG.
    ///
    /// # Panics
    /// If called re-entrantly from within `f`.
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut SimRng) -> R) -> R {
        f(&mut self.shared.rng.borrow_mut())
    }

    // ── Construction ──────────────────────────────────────────────────────

    /// Create an event due `delay` from now and register it.
    ///
    /// Shorthand for [`EventBuilder`]; fails only if `now + delay` overflows.
    pub fn schedule_in<F>(&self, delay: Duration, priority: i32, callback: F) -> SchedResult<EventHandle>
    where
        F: FnOnce(&Dispatch<'_>) + 'static,
    {
        EventBuilder::new()
            .queue(self)
            .delay(delay)
            .priority(priority)
            .on_dispatch(callback)
            .build()
    }

    /// Like [`schedule_in`][Self::schedule_in] with the delay given in raw
    /// seconds.  Negative or non-finite delays fail with an invalid-argument
    /// error and leave the queue untouched.
    pub fn schedule_in_secs<F>(&self, secs: f64, priority: i32, callback: F) -> SchedResult<EventHandle>
    where
        F: FnOnce(&Dispatch<'_>) + 'static,
    {
        EventBuilder::new()
            .queue(self)
            .delay_secs(secs)
            .priority(priority)
            .on_dispatch(callback)
            .build()
    }

    /// A descheduled placeholder: no due time, no callback, never dispatched.
    /// Every transition on it fails.
    pub fn placeholder(&self, priority: i32) -> EventHandle {
        let id = self.allocate_id();
        let cell = EventCell::new(
            id,
            priority,
            Rc::downgrade(&self.shared),
            Phase::Descheduled,
            Duration::ZERO,
            None,
        );
        EventHandle::from_cell(Rc::new(cell))
    }

    /// Build, register, and return a new active event.  Called by
    /// [`EventBuilder::build`] once its inputs are validated.
    pub(crate) fn create_event(
        &self,
        priority: i32,
        delay:    Duration,
        callback: Option<Callback>,
    ) -> SchedResult<EventHandle> {
        let due = self.now().checked_add(delay)?;
        let id = self.allocate_id();
        let cell = Rc::new(EventCell::new(
            id,
            priority,
            Rc::downgrade(&self.shared),
            Phase::Active,
            due.since_epoch(),
            callback,
        ));
        cell.start(self);
        debug!(event = %id, priority, %due, "event created");
        Ok(EventHandle::from_cell(cell))
    }

    fn allocate_id(&self) -> EventId {
        let mut core = self.shared.core.borrow_mut();
        let id = core.next_id;
        core.next_id = id.next();
        id
    }

    // ── Pending ordering (state-machine hooks) ────────────────────────────

    /// Insert an active event into the pending ordering.
    ///
    /// # Panics
    /// If the event is already pending or due before the clock.
    pub(crate) fn schedule(&self, event: &Rc<EventCell>) {
        let mut core = self.shared.core.borrow_mut();
        assert!(event.key.get().is_none(), "{} is already pending", event.id);

        let due = Instant::at_offset(event.time.get());
        assert!(due >= core.clock, "{} due at {} before clock {}", event.id, due, core.clock);

        let key = PendingKey { due, priority: Reverse(event.priority), seq: core.next_seq };
        core.next_seq += 1;
        let previous = core.pending.insert(key, Rc::clone(event));
        assert!(previous.is_none(), "duplicate pending key for {}", event.id);
        event.key.set(Some(key));
    }

    /// Remove an event from the pending ordering.
    ///
    /// # Panics
    /// If the event is not pending.
    pub(crate) fn deschedule(&self, event: &Rc<EventCell>) {
        let Some(key) = event.key.take() else {
            panic!("{} is not pending", event.id);
        };
        let removed = self.shared.core.borrow_mut().pending.remove(&key);
        assert!(removed.is_some(), "{} missing from the pending ordering", event.id);
    }

    pub(crate) fn begin_dispatch(&self, id: EventId) {
        let mut core = self.shared.core.borrow_mut();
        assert!(core.current.is_none(), "{id} dispatched while another event is dispatching");
        core.current = Some(id);
    }

    pub(crate) fn end_dispatch(&self, id: EventId) {
        let mut core = self.shared.core.borrow_mut();
        assert_eq!(core.current, Some(id), "dispatch of {id} ended out of turn");
        core.current = None;
        core.dispatched += 1;
    }

    // ── Driving ───────────────────────────────────────────────────────────

    /// Ask the current or next run to stop before its next dispatch.
    pub fn request_stop(&self) {
        self.shared.core.borrow_mut().stop_requested = true;
    }

    /// Dispatch the single earliest pending event.
    pub fn step(&self) -> StepOutcome {
        self.step_with(&mut NoopObserver)
    }

    /// [`step`][Self::step] with observer callbacks.
    pub fn step_with<O: QueueObserver>(&self, observer: &mut O) -> StepOutcome {
        let next = {
            let core = self.shared.core.borrow();
            if core.current.is_some() {
                return StepOutcome::Busy;
            }
            if !core.live {
                return StepOutcome::Held;
            }
            match core.pending.first_key_value() {
                None => return StepOutcome::Idle,
                Some((key, event)) => (key.due, Rc::clone(event)),
            }
        };
        let (due, event) = next;
        self.dispatch(due, &event, observer);
        StepOutcome::Dispatched(event.id)
    }

    /// Dispatch events until nothing is pending.
    ///
    /// Configured limits ([`SimConfig::stop_at`], [`SimConfig::max_dispatches`])
    /// and [`request_stop`][Self::request_stop] still apply.
    pub fn run_until_idle(&self) -> RunSummary {
        self.run(&mut NoopObserver)
    }

    /// Dispatch events in order until a stop condition is met.
    pub fn run<O: QueueObserver>(&self, observer: &mut O) -> RunSummary {
        let stop_at = self.shared.core.borrow().config.stop_at;
        self.run_inner(stop_at, observer)
    }

    /// Run with `limit` as the time limit, overriding [`SimConfig::stop_at`].
    pub fn run_until<O: QueueObserver>(&self, limit: Instant, observer: &mut O) -> RunSummary {
        self.run_inner(Some(limit), observer)
    }

    fn run_inner<O: QueueObserver>(&self, stop_at: Option<Instant>, observer: &mut O) -> RunSummary {
        let max = self.shared.core.borrow().config.max_dispatches;
        let start = self.now();
        observer.on_run_start(start);
        debug!(now = %start, pending = self.pending_len(), "run started");

        let mut dispatched = 0u64;
        let reason = loop {
            let next = {
                let mut core = self.shared.core.borrow_mut();
                if core.current.is_some() {
                    break StopReason::Busy;
                }
                if std::mem::take(&mut core.stop_requested) {
                    break StopReason::StopRequested;
                }
                if !core.live {
                    break StopReason::Held;
                }
                let Some((key, event)) = core.pending.first_key_value() else {
                    break StopReason::OutOfEvents;
                };
                if let Some(max) = max {
                    if dispatched >= max {
                        break StopReason::DispatchLimit(max);
                    }
                }
                (key.due, Rc::clone(event))
            };
            let (due, event) = next;

            if let Some(limit) = stop_at {
                if due > limit {
                    self.advance_clock(limit, observer);
                    break StopReason::TimeLimit(limit);
                }
            }

            self.dispatch(due, &event, observer);
            dispatched += 1;
        };

        let summary = RunSummary { reason, dispatched, now: self.now() };
        debug!(?reason, dispatched, now = %summary.now, "run stopped");
        observer.on_run_end(&summary);
        summary
    }

    fn dispatch(&self, due: Instant, event: &Rc<EventCell>, observer: &mut dyn QueueObserver) {
        self.advance_clock(due, observer);
        debug!(event = %event.id, priority = event.priority, now = %due, "dispatching");
        event.state().dispatch(event, self, observer);
    }

    /// Move the clock forward to `to`.  A `to` at or before the clock is a
    /// no-op for time limits; for dispatches it must equal or exceed it.
    fn advance_clock(&self, to: Instant, observer: &mut dyn QueueObserver) {
        let from = {
            let mut core = self.shared.core.borrow_mut();
            let from = core.clock;
            if to <= from {
                return;
            }
            core.clock = to;
            from
        };
        observer.on_clock_advance(from, to);
    }
}
