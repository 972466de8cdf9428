//! The `TraceWriter` trait implemented by all backend writers.

use crate::{DispatchRow, OutputResult};

/// A sink for dispatch rows.
///
/// Errors are reported per call; [`TraceObserver`][crate::TraceObserver]
/// stores the first one for retrieval after the run.
pub trait TraceWriter {
    /// Append one row.
    fn write_dispatch(&mut self, row: &DispatchRow) -> OutputResult<()>;

    /// Push buffered rows to the underlying sink.
    fn flush(&mut self) -> OutputResult<()>;

    /// Flush and close the underlying sink.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
