//! Course store
//!
//! The persistence contract of the layout workflow. The only coordination
//! primitive between workers is [`CourseStore::transition`], a compare-and-set
//! on the course status: two workers racing on the same course can never both
//! see it succeed.

mod memory;

pub use memory::MemoryCourseStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::course::{Course, ProcessingCourse};
use crate::domain::layout::CourseLayout;
use crate::domain::transition::Transition;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Data store offering atomic conditional status updates
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Finds a course by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Course>, StoreError>;

    /// Finds the oldest course (by creation time) still in `PENDING`
    async fn find_oldest_pending(&self) -> Result<Option<Course>, StoreError>;

    /// Applies a transition if the course is still in its source status.
    ///
    /// Returns `false` when no course matched, i.e. it does not exist or
    /// someone else moved it first.
    async fn transition(&self, id: &str, transition: Transition) -> Result<bool, StoreError>;

    /// Applies [`Transition::Succeed`] and attaches the layout in one write.
    ///
    /// Returns `false` when the course is no longer in `LAYOUT_PROCESSING`.
    async fn complete(&self, id: &str, layout: &CourseLayout) -> Result<bool, StoreError>;

    /// Lists courses in `LAYOUT_PROCESSING`, oldest first, with their submitter
    async fn list_processing(&self) -> Result<Vec<ProcessingCourse>, StoreError>;
}
