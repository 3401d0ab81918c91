//! Courseforge Poller
//!
//! Background worker that advances pending courses through layout generation.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Dispatch: the HTTP call to the layout endpoint, behind a trait
//! - Scheduler: the periodic single-flight sweep, claim and retry policy
//!
//! Every sweep picks at most one course: the oldest `PENDING` one. It is
//! claimed with a compare-and-set, handed to the layout endpoint with bounded
//! retries, and left in a definite state whatever happens.

pub mod config;
pub mod dispatch;
pub mod scheduler;

pub use config::PollerConfig;
pub use dispatch::{DispatchError, LayoutDispatcher};
pub use scheduler::{
    FailureClass, FailureSignal, LayoutPoller, RetryDecision, RetryPolicy, SweepOutcome, classify,
};
