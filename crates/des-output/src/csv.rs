//! CSV trace backend.
//!
//! Creates `dispatch_trace.csv` in the configured output directory.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::TraceWriter;
use crate::{DispatchRow, OutputResult};

/// File name created inside the output directory.
pub const TRACE_FILE: &str = "dispatch_trace.csv";

/// Writes one CSV row per dispatched event.
pub struct CsvTraceWriter {
    rows:     Writer<File>,
    finished: bool,
}

impl CsvTraceWriter {
    /// Open (or create) `dispatch_trace.csv` in `dir` and write the header row.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut rows = Writer::from_path(dir.join(TRACE_FILE))?;
        rows.write_record(["sequence", "event_id", "priority", "time_secs"])?;
        Ok(Self { rows, finished: false })
    }
}

impl TraceWriter for CsvTraceWriter {
    fn write_dispatch(&mut self, row: &DispatchRow) -> OutputResult<()> {
        self.rows.write_record(&[
            row.sequence.to_string(),
            row.event_id.to_string(),
            row.priority.to_string(),
            row.time_secs.to_string(),
        ])?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.rows.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.flush()
    }
}
