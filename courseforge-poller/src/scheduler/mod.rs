//! Scheduler layer for the poller
//!
//! This layer periodically looks for pending courses, claims one, and drives
//! it through the layout endpoint. It owns the retry policy and the decision
//! of which state a claimed course is left in.

pub mod poller;
pub mod retry;

pub use poller::{LayoutPoller, SweepOutcome};
pub use retry::{FailureClass, FailureSignal, RetryDecision, RetryPolicy, classify};
