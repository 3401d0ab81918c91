//! Course status state machine
//!
//! Every status change is one of the [`Transition`]s below. Each transition
//! has exactly one legal source status, which stores use as the precondition
//! of a compare-and-set write.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::course::CourseStatus;

/// Guarded status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Take exclusive ownership of a pending course
    Claim,
    /// Layout generated and stored
    Succeed,
    /// Retries exhausted
    Fail,
    /// Hand a claimed course back to the queue
    Release,
}

impl Transition {
    /// Status the course must be in for the transition to apply
    pub fn source(&self) -> CourseStatus {
        match self {
            Transition::Claim => CourseStatus::Pending,
            Transition::Succeed | Transition::Fail | Transition::Release => {
                CourseStatus::LayoutProcessing
            }
        }
    }

    /// Status the course ends up in
    pub fn target(&self) -> CourseStatus {
        match self {
            Transition::Claim => CourseStatus::LayoutProcessing,
            Transition::Succeed => CourseStatus::LayoutSuccess,
            Transition::Fail => CourseStatus::LayoutFailed,
            Transition::Release => CourseStatus::Pending,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({} -> {})", self, self.source(), self.target())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot apply {transition:?} to a course in {from}")]
    Illegal {
        from: CourseStatus,
        transition: Transition,
    },
}

impl CourseStatus {
    /// Applies a transition, failing if this status is not its source
    pub fn apply(self, transition: Transition) -> Result<CourseStatus, TransitionError> {
        if self == transition.source() {
            Ok(transition.target())
        } else {
            Err(TransitionError::Illegal {
                from: self,
                transition,
            })
        }
    }
}
