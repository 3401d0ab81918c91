//! Dispatch retry policy
//!
//! Failure classification is a pure function of a transport-agnostic
//! [`FailureSignal`], so the policy can be exercised without any HTTP client.

use std::time::Duration;

/// What went wrong with one dispatch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal {
    ConnectionRefused,
    TimedOut,
    HostNotFound,
    ConnectionReset,
    /// The endpoint answered with a non-success HTTP status
    Status(u16),
    /// Anything else, including a 2xx answer that did not report success
    Other,
}

/// How a failure is treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The endpoint is unreachable; retrying within this sweep is pointless
    Transport,
    /// The endpoint answered but did not succeed
    Application,
}

/// Classifies a dispatch failure
pub fn classify(signal: &FailureSignal) -> FailureClass {
    match signal {
        FailureSignal::ConnectionRefused
        | FailureSignal::TimedOut
        | FailureSignal::HostNotFound
        | FailureSignal::ConnectionReset => FailureClass::Transport,
        FailureSignal::Status(_) | FailureSignal::Other => FailureClass::Application,
    }
}

/// Next step after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop now and hand the course back to the queue
    Abort,
    /// Wait, then try again
    RetryAfter(Duration),
    /// Attempt ceiling reached; the course is marked failed
    GiveUp,
}

/// Bounded retry with linearly growing delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay after failed attempt `k` is `backoff_step * k`
    pub backoff_step: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
        }
    }

    /// Decides what follows the failure of attempt number `attempt` (1-based)
    pub fn decide(&self, attempt: u32, class: FailureClass) -> RetryDecision {
        match class {
            FailureClass::Transport => RetryDecision::Abort,
            FailureClass::Application if attempt >= self.max_attempts => RetryDecision::GiveUp,
            FailureClass::Application => RetryDecision::RetryAfter(self.backoff_step * attempt),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(2000))
    }
}
