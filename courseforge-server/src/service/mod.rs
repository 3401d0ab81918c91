//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between the store and the text generator.

pub mod layout;
pub mod prompt;

// Re-export for convenience
pub use layout as layout_service;
