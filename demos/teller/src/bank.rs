//! Single-teller bank: Poisson arrivals, exponential service, and periodic
//! breaks that freeze the customer currently at the window.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use des_core::{CoreResult, Duration, Histogram, Instant, SummaryStatistics};
use des_engine::{Dispatch, EventHandle, Queue, SchedResult};
use tracing::{debug, error, info};

// ── Priorities ────────────────────────────────────────────────────────────────

// Higher fires first among events due at the same instant: a break ending
// at t is processed before a service completing at t, which is processed
// before an arrival at t.
const BREAK_PRIORITY:      i32 = 20;
const COMPLETION_PRIORITY: i32 = 10;
const ARRIVAL_PRIORITY:    i32 = 0;

/// Model parameters.
#[derive(Debug, Clone, Copy)]
pub struct BankParams {
    pub mean_interarrival: Duration,
    pub mean_service:      Duration,
    pub break_every:       Duration,
    pub break_length:      Duration,
}

/// Regular bins of the wait-time histogram.
const WAIT_BINS:     usize = 10;
const WAIT_BIN_SECS: f64   = 60.0;

/// Counters and distributions collected over a run.
#[derive(Debug, Clone)]
pub struct BankStats {
    pub arrived:     u64,
    pub served:      u64,
    pub breaks:      u64,
    /// Services that were paused by a break.
    pub interrupted: u64,
    /// Arrival-to-window waits in seconds, in one-minute bins.
    pub waits:       Histogram,
    /// Line length seen by each arriving customer, including themselves.
    pub line:        SummaryStatistics,
    /// Customers still in line or at the window when the bank closed.
    pub left_over:   usize,
}

impl BankStats {
    fn new() -> CoreResult<Self> {
        Ok(Self {
            arrived:     0,
            served:      0,
            breaks:      0,
            interrupted: 0,
            waits:       Histogram::new(0.0, WAIT_BINS, WAIT_BIN_SECS)?,
            line:        SummaryStatistics::new(),
            left_over:   0,
        })
    }
}

struct Customer {
    id:      u64,
    arrived: Instant,
}

struct Service {
    customer:   Customer,
    completion: EventHandle,
}

pub struct Bank {
    params:   BankParams,
    line:     VecDeque<Customer>,
    serving:  Option<Service>,
    on_break: bool,
    stats:    BankStats,
}

pub type SharedBank = Rc<RefCell<Bank>>;

impl Bank {
    pub fn shared(params: BankParams) -> CoreResult<SharedBank> {
        Ok(Rc::new(RefCell::new(Bank {
            params,
            line:     VecDeque::new(),
            serving:  None,
            on_break: false,
            stats:    BankStats::new()?,
        })))
    }

    /// Drop every customer and return the collected counters.
    ///
    /// Releases the in-service completion, whose callback holds a reference
    /// back to the bank.
    pub fn close(&mut self) -> BankStats {
        let mut stats = self.stats.clone();
        stats.left_over = self.line.len() + usize::from(self.serving.is_some());
        self.line.clear();
        self.serving = None;
        stats
    }

    fn is_idle(&self) -> bool {
        self.serving.is_none() && !self.on_break
    }
}

// ── Event wiring ──────────────────────────────────────────────────────────────

/// Schedule the first arrival and the first break.
pub fn open(queue: &Queue, bank: &SharedBank) -> SchedResult<()> {
    schedule_arrival(queue, bank)?;
    schedule_break(queue, bank)
}

/// Log a failed scheduling call from inside a callback and stop the run.
fn or_stop(d: &Dispatch<'_>, what: &str, result: SchedResult<()>) {
    if let Err(e) = result {
        error!(error = %e, kind = ?e.kind(), "{what} failed; stopping");
        d.queue().request_stop();
    }
}

fn schedule_arrival(queue: &Queue, bank: &SharedBank) -> SchedResult<()> {
    let mean = bank.borrow().params.mean_interarrival;
    let delay = queue.with_rng(|rng| rng.exponential(mean))?;
    let bank = Rc::clone(bank);
    queue.schedule_in(delay, ARRIVAL_PRIORITY, move |d| {
        let result = on_arrival(d.queue(), &bank);
        or_stop(d, "arrival", result);
    })?;
    Ok(())
}

fn on_arrival(queue: &Queue, bank: &SharedBank) -> SchedResult<()> {
    {
        let mut guard = bank.borrow_mut();
        let state = &mut *guard;
        state.stats.arrived += 1;
        let customer = Customer { id: state.stats.arrived, arrived: queue.now() };
        debug!(customer = customer.id, now = %queue.now(), "arrival");
        state.line.push_back(customer);
        state.stats.line.record(state.line.len() as f64)?;
        if state.is_idle() {
            start_service(queue, bank, state)?;
        }
    }
    schedule_arrival(queue, bank)
}

fn start_service(queue: &Queue, bank: &SharedBank, state: &mut Bank) -> SchedResult<()> {
    let Some(customer) = state.line.pop_front() else {
        return Ok(());
    };
    let wait = queue.now().duration_since(customer.arrived)?;
    state.stats.waits.record(wait.as_secs())?;

    let mean = state.params.mean_service;
    let delay = queue.with_rng(|rng| rng.exponential(mean))?;
    let shared = Rc::clone(bank);
    let completion = queue.schedule_in(delay, COMPLETION_PRIORITY, move |d| {
        let result = on_completion(d.queue(), &shared);
        or_stop(d, "service completion", result);
    })?;
    debug!(customer = customer.id, %wait, service = %delay, "service started");
    state.serving = Some(Service { customer, completion });
    Ok(())
}

fn on_completion(queue: &Queue, bank: &SharedBank) -> SchedResult<()> {
    let mut guard = bank.borrow_mut();
    let state = &mut *guard;
    if let Some(done) = state.serving.take() {
        debug!(customer = done.customer.id, now = %queue.now(), "service complete");
        state.stats.served += 1;
    }
    if state.is_idle() {
        start_service(queue, bank, state)?;
    }
    Ok(())
}

fn schedule_break(queue: &Queue, bank: &SharedBank) -> SchedResult<()> {
    let every = bank.borrow().params.break_every;
    let bank = Rc::clone(bank);
    queue.schedule_in(every, BREAK_PRIORITY, move |d| {
        let result = on_break_start(d.queue(), &bank);
        or_stop(d, "break start", result);
    })?;
    Ok(())
}

fn on_break_start(queue: &Queue, bank: &SharedBank) -> SchedResult<()> {
    let length = {
        let mut guard = bank.borrow_mut();
        let state = &mut *guard;
        state.on_break = true;
        state.stats.breaks += 1;
        if let Some(service) = &state.serving {
            service.completion.suspend()?;
            let remaining = service.completion.time_remaining()?;
            info!(customer = service.customer.id, %remaining, "teller on break, service paused");
            state.stats.interrupted += 1;
        } else {
            info!(now = %queue.now(), "teller on break");
        }
        state.params.break_length
    };

    let shared = Rc::clone(bank);
    queue.schedule_in(length, BREAK_PRIORITY, move |d| {
        let result = on_break_end(d.queue(), &shared);
        or_stop(d, "break end", result);
    })?;
    Ok(())
}

fn on_break_end(queue: &Queue, bank: &SharedBank) -> SchedResult<()> {
    {
        let mut guard = bank.borrow_mut();
        let state = &mut *guard;
        state.on_break = false;
        if let Some(service) = &state.serving {
            service.completion.resume()?;
            let due = service.completion.due_time()?;
            info!(customer = service.customer.id, %due, "teller back, service resumed");
        } else {
            info!(now = %queue.now(), line = state.line.len(), "teller back");
            start_service(queue, bank, state)?;
        }
    }
    schedule_break(queue, bank)
}
