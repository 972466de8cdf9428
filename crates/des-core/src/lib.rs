//! `des-core` — foundational types for the `des` scheduling kernel.
//!
//! This crate is a dependency of every other `des-*` crate.  It has no
//! `des-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`time`]    | `Duration`, `Instant`, `SimConfig`                      |
//! | [`ids`]     | `EventId`                                               |
//! | [`rng`]     | `SimRng` (seeded, with exponential sampling)            |
//! | [`stats`]   | `SummaryStatistics`, `Histogram`                        |
//! | [`error`]   | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                                                         |
//! |---------|------------------------------------------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to value types; time values round-trip as validated `f64` seconds |

pub mod error;
pub mod ids;
pub mod rng;
pub mod stats;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::EventId;
pub use rng::SimRng;
pub use stats::{Histogram, SummaryStatistics};
pub use time::{Duration, Instant, SimConfig};
