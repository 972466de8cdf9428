//! `des-output` — dispatch-trace writers for the `des` scheduling kernel.
//!
//! | Backend | Files created          |
//! |---------|------------------------|
//! | CSV     | `dispatch_trace.csv`   |
//!
//! Backends implement [`TraceWriter`] and are driven by [`TraceObserver`],
//! which implements `des_engine::QueueObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use des_output::{CsvTraceWriter, TraceObserver};
//!
//! let writer = CsvTraceWriter::new(Path::new("./output"))?;
//! let mut obs = TraceObserver::new(writer);
//! queue.run(&mut obs);
//! obs.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use self::csv::CsvTraceWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TraceObserver;
pub use row::DispatchRow;
pub use writer::TraceWriter;
