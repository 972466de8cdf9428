//! `des-engine` — the scheduling kernel of the `des` discrete-event
//! simulation library.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`state`]     | `Phase` and the per-phase state machine                      |
//! | [`event`]     | `EventHandle` (suspend / resume / time queries), `WeakEventHandle` |
//! | [`queue`]     | `Queue`, `Dispatch`, `StepOutcome`, `RunSummary`, `StopReason` |
//! | [`builder`]   | `EventBuilder`                                               |
//! | [`observer`]  | `QueueObserver` trait, `NoopObserver`                        |
//! | [`error`]     | `SchedulingError`, `ErrorKind`, `SchedResult<T>`             |
//!
//! # Dispatch model (summary)
//!
//! ```text
//! loop:
//!   ① pick the minimum pending event by (due ↑, priority ↓, sequence ↑)
//!   ② advance the clock to its due time
//!   ③ Active → Dispatching, run the callback, Dispatching → Dispatched
//! until nothing is pending or a stop condition fires
//! ```
//!
//! Everything is single-threaded: events are `!Send`, and exactly one event
//! is dispatching at any moment.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use des_core::Duration;
//! use des_engine::Queue;
//!
//! let queue = Queue::new();
//! let pending = queue.schedule_in(Duration::from_secs(10.0)?, 0, |d| {
//!     println!("fired at {}", d.now());
//! })?;
//! pending.suspend()?;
//! pending.resume()?;
//! queue.run_until_idle();
//! ```

pub mod builder;
pub mod error;
pub mod event;
pub mod observer;
pub mod queue;
pub mod state;


pub use builder::EventBuilder;
pub use error::{ErrorKind, SchedResult, SchedulingError};
pub use event::{EventHandle, WeakEventHandle};
pub use observer::{NoopObserver, QueueObserver};
pub use queue::{Dispatch, Queue, RunSummary, StepOutcome, StopReason};
pub use state::Phase;
