//! Fluent builder for active events.

use des_core::{CoreResult, Duration};

use crate::queue::Callback;
use crate::{Dispatch, EventHandle, Queue, SchedResult, SchedulingError};

/// Fluent builder for an [`EventHandle`].
///
/// # Required inputs
///
/// | Method                          | Missing →                    |
/// |---------------------------------|------------------------------|
/// | `.queue(q)`                     | `SchedulingError::MissingQueue` |
/// | `.delay(d)` or `.delay_secs(s)` | `SchedulingError::MissingDelay` |
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                       |
/// |---------------------|-------------------------------|
/// | `.priority(p)`      | `0`                           |
/// | `.on_dispatch(f)`   | no callback (dispatch no-op)  |
///
/// # Example
///
/// ```rust,ignore
/// let event = EventBuilder::new()
///     .queue(&queue)
///     .delay_secs(10.0)
///     .priority(5)
///     .on_dispatch(|d| println!("fired at {}", d.now()))
///     .build()?;
/// ```
#[derive(Default)]
pub struct EventBuilder<'q> {
    queue:    Option<&'q Queue>,
    priority: i32,
    delay:    Option<CoreResult<Duration>>,
    callback: Option<Callback>,
}

impl<'q> EventBuilder<'q> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue that will own the event.
    pub fn queue(mut self, queue: &'q Queue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Delay from the queue's current time to the event's due time.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(Ok(delay));
        self
    }

    /// Delay in raw seconds, validated by [`build`][Self::build].
    pub fn delay_secs(mut self, secs: f64) -> Self {
        self.delay = Some(Duration::from_secs(secs));
        self
    }

    /// Code to run when the event is dispatched.
    pub fn on_dispatch<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Dispatch<'_>) + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Validate inputs and register the event with its queue.
    ///
    /// On error nothing is registered and the queue is unchanged.
    pub fn build(self) -> SchedResult<EventHandle> {
        let queue = self.queue.ok_or(SchedulingError::MissingQueue)?;
        let delay = self.delay.ok_or(SchedulingError::MissingDelay)??;
        queue.create_event(self.priority, delay, self.callback)
    }
}
