//! Layout dispatch
//!
//! The call that hands a claimed course to the layout endpoint. It is a trait
//! so the scheduler can be driven by scripted dispatchers in tests; the real
//! implementation is [`LayoutClient`].

use async_trait::async_trait;
use courseforge_client::{ClientError, LayoutClient, TransportFailure};
use thiserror::Error;

use crate::scheduler::retry::FailureSignal;

/// Failed dispatch attempt
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub signal: FailureSignal,
    pub message: String,
}

impl DispatchError {
    pub fn new(signal: FailureSignal, message: impl Into<String>) -> Self {
        Self {
            signal,
            message: message.into(),
        }
    }
}

/// Invokes layout generation for one course
#[async_trait]
pub trait LayoutDispatcher: Send + Sync {
    /// Returns once the endpoint reported success for the course
    async fn dispatch(&self, course_id: &str) -> Result<(), DispatchError>;
}

#[async_trait]
impl LayoutDispatcher for LayoutClient {
    async fn dispatch(&self, course_id: &str) -> Result<(), DispatchError> {
        let response = self.generate_layout(course_id).await?;

        if response.success {
            Ok(())
        } else {
            Err(DispatchError::new(
                FailureSignal::Other,
                response
                    .error
                    .unwrap_or_else(|| "endpoint reported failure".to_string()),
            ))
        }
    }
}

impl From<ClientError> for DispatchError {
    fn from(err: ClientError) -> Self {
        let signal = match (err.transport_failure(), err.status()) {
            (Some(TransportFailure::ConnectionRefused), _) => FailureSignal::ConnectionRefused,
            (Some(TransportFailure::TimedOut), _) => FailureSignal::TimedOut,
            (Some(TransportFailure::HostNotFound), _) => FailureSignal::HostNotFound,
            (Some(TransportFailure::ConnectionReset), _) => FailureSignal::ConnectionReset,
            (None, Some(status)) => FailureSignal::Status(status),
            (None, None) => FailureSignal::Other,
        };

        DispatchError::new(signal, err.to_string())
    }
}
