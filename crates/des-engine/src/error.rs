//! Scheduling errors.
//!
//! Every caller-facing failure is a [`SchedulingError`] naming exactly which
//! contract was broken.  [`SchedulingError::kind`] folds the variants into the
//! three recoverable categories callers usually branch on.
//!
//! Internal invariant violations (double insertion into the pending ordering,
//! dispatching a non-active event, the clock running backwards) are not
//! represented here: they panic.

use des_core::{CoreError, EventId};
use thiserror::Error;

use crate::Phase;

/// Coarse classification of a [`SchedulingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A constructor or convenience call received an unusable argument.
    InvalidArgument,
    /// The event's current phase does not permit the requested operation.
    InvalidTransition,
    /// The event is already part-way through a phase change.
    ChangeInProgress,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulingError {
    #[error("event has no owning queue")]
    MissingQueue,

    #[error("event has no delay")]
    MissingDelay,

    #[error("the queue owning {0} no longer exists")]
    QueueDropped(EventId),

    #[error("invalid time: {0}")]
    Time(#[from] CoreError),

    #[error("cannot {op} {event} while it is {phase}")]
    IllegalTransition {
        event: EventId,
        op:    &'static str,
        phase: Phase,
    },

    #[error("cannot resume {0}: suspend count is already zero")]
    NotSuspended(EventId),

    #[error("cannot suspend {0}: suspend count would overflow")]
    SuspendOverflow(EventId),

    #[error("{event} has no due time while it is {phase}")]
    NoDueTime { event: EventId, phase: Phase },

    #[error("{event} has no remaining time while it is {phase}")]
    NoRemainingTime { event: EventId, phase: Phase },

    #[error("{0} is already changing phase")]
    ChangeInProgress(EventId),
}

impl SchedulingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingQueue
            | Self::MissingDelay
            | Self::QueueDropped(_)
            | Self::Time(_) => ErrorKind::InvalidArgument,

            Self::IllegalTransition { .. }
            | Self::NotSuspended(_)
            | Self::SuspendOverflow(_)
            | Self::NoDueTime { .. }
            | Self::NoRemainingTime { .. } => ErrorKind::InvalidTransition,

            Self::ChangeInProgress(_) => ErrorKind::ChangeInProgress,
        }
    }
}

pub type SchedResult<T> = Result<T, SchedulingError>;
