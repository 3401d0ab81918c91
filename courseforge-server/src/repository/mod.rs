//! Repository Module
//!
//! Data access layer for the server.

pub mod course;

pub use course::PgCourseStore;
