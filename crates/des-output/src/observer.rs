//! `TraceObserver<W>` — bridges `QueueObserver` to a `TraceWriter`.

use des_core::Instant;
use des_engine::{EventHandle, QueueObserver, RunSummary};
use tracing::warn;

use crate::row::DispatchRow;
use crate::writer::TraceWriter;
use crate::{OutputError, OutputResult};

/// A [`QueueObserver`] that records every dispatch to a [`TraceWriter`].
///
/// Errors from the writer are stored internally because `QueueObserver`
/// methods have no return value.  After `queue.run()` returns, check for
/// errors with [`take_error`][Self::take_error].
pub struct TraceObserver<W: TraceWriter> {
    writer:     W,
    sequence:   u64,
    last_error: Option<OutputError>,
}

impl<W: TraceWriter> TraceObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            sequence:   0,
            last_error: None,
        }
    }

    /// Number of rows handed to the writer so far.
    pub fn rows_written(&self) -> u64 {
        self.sequence
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Finish the writer and unwrap it.
    pub fn finish(mut self) -> OutputResult<W> {
        if let Some(e) = self.last_error.take() {
            return Err(e);
        }
        self.writer.finish()?;
        Ok(self.writer)
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            warn!(error = %e, "dispatch trace write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: TraceWriter> QueueObserver for TraceObserver<W> {
    fn on_dispatch(&mut self, event: &EventHandle, now: Instant) {
        let row = DispatchRow {
            sequence:  self.sequence,
            event_id:  event.id().get(),
            priority:  event.priority(),
            time_secs: now.as_secs(),
        };
        self.sequence += 1;
        let result = self.writer.write_dispatch(&row);
        self.store_err(result);
    }

    fn on_run_end(&mut self, _summary: &RunSummary) {
        let result = self.writer.flush();
        self.store_err(result);
    }
}
