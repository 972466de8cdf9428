//! Plain data row types written by trace backends.

/// One dispatched event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchRow {
    /// 0-based position in the observed dispatch sequence.
    pub sequence:  u64,
    pub event_id:  u64,
    pub priority:  i32,
    /// Clock value at dispatch, in seconds.
    pub time_secs: f64,
}
