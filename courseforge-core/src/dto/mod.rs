//! Data Transfer Objects for inter-service communication
//!
//! Bodies exchanged between the poller and the layout endpoint.

pub mod layout;
