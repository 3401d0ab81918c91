//! In-memory course store
//!
//! Mutex-guarded maps with the same compare-and-set semantics as the
//! Postgres store. Used by tests and for running without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{CourseStore, StoreError};
use crate::domain::course::{Course, CourseOwner, CourseStatus, ProcessingCourse};
use crate::domain::layout::CourseLayout;
use crate::domain::transition::Transition;

#[derive(Default)]
struct Tables {
    users: HashMap<String, CourseOwner>,
    courses: HashMap<String, Course>,
}

#[derive(Default)]
pub struct MemoryCourseStore {
    tables: Mutex<Tables>,
}

impl MemoryCourseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user
    pub fn insert_user(&self, user: CourseOwner) -> Result<(), StoreError> {
        self.lock()?.users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Adds or replaces a course
    pub fn insert_course(&self, course: Course) -> Result<(), StoreError> {
        self.lock()?.courses.insert(course.id.clone(), course);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("course store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Course>, StoreError> {
        Ok(self.lock()?.courses.get(id).cloned())
    }

    async fn find_oldest_pending(&self) -> Result<Option<Course>, StoreError> {
        let tables = self.lock()?;
        let oldest = tables
            .courses
            .values()
            .filter(|c| c.status == CourseStatus::Pending)
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .cloned();

        Ok(oldest)
    }

    async fn transition(&self, id: &str, transition: Transition) -> Result<bool, StoreError> {
        // Succeed must carry a layout
        if transition == Transition::Succeed {
            return Err(StoreError::Database(
                "Succeed is only applied through complete()".to_string(),
            ));
        }

        let mut tables = self.lock()?;
        let Some(course) = tables.courses.get_mut(id) else {
            return Ok(false);
        };

        match course.status.apply(transition) {
            Ok(next) => {
                course.status = next;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn complete(&self, id: &str, layout: &CourseLayout) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        let Some(course) = tables.courses.get_mut(id) else {
            return Ok(false);
        };

        match course.status.apply(Transition::Succeed) {
            Ok(next) => {
                course.status = next;
                course.layout = Some(layout.clone());
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn list_processing(&self) -> Result<Vec<ProcessingCourse>, StoreError> {
        let tables = self.lock()?;

        let mut processing: Vec<&Course> = tables
            .courses
            .values()
            .filter(|c| c.status == CourseStatus::LayoutProcessing)
            .collect();
        processing.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        // Inner join: courses without a known submitter are skipped
        let rows = processing
            .into_iter()
            .filter_map(|c| {
                let user = tables.users.get(&c.user_id)?.clone();
                Some(ProcessingCourse {
                    id: c.id.clone(),
                    title: c.title.clone(),
                    description: c.description.clone(),
                    difficulty: c.difficulty.clone(),
                    user,
                })
            })
            .collect();

        Ok(rows)
    }
}
