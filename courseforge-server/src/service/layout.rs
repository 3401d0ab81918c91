//! Layout Service
//!
//! Turns a course's metadata into a validated, stored layout.
//!
//! Ownership rule: whoever claimed a course releases it on failure. When the
//! endpoint finds a course `PENDING` it claims it itself and hands it back on
//! any failure. When the course is already `LAYOUT_PROCESSING` the poller owns
//! it, and generation failures are left to the poller's retry loop.

use courseforge_core::domain::course::{Course, CourseStatus, ProcessingCourse};
use courseforge_core::domain::layout::{CourseLayout, LayoutError, parse_layout};
use courseforge_core::domain::transition::Transition;
use courseforge_core::store::{CourseStore, StoreError};
use tracing::{error, info, warn};

use crate::generator::{GeneratorError, TextGenerator};
use crate::service::prompt::build_prompt;

/// Service error type
#[derive(Debug)]
pub enum LayoutServiceError {
    NotFound(String),
    MissingTitle(String),
    Conflict(String),
    EmptyResponse(String),
    Generation(GeneratorError),
    InvalidLayout(LayoutError),
    Persistence(StoreError),
    Store(StoreError),
}

impl From<StoreError> for LayoutServiceError {
    fn from(err: StoreError) -> Self {
        LayoutServiceError::Store(err)
    }
}

/// How a generation request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    /// A new layout was generated and stored
    Generated,
    /// The course already had a layout; nothing was done
    AlreadyGenerated,
}

/// Generate, validate and store the layout of a course
pub async fn generate_layout(
    store: &dyn CourseStore,
    generator: &dyn TextGenerator,
    course_id: &str,
) -> Result<LayoutOutcome, LayoutServiceError> {
    let course = store
        .find_by_id(course_id)
        .await?
        .ok_or_else(|| LayoutServiceError::NotFound(course_id.to_string()))?;

    let Some(title) = course.title() else {
        warn!("Course title of course {} is missing", course_id);
        return Err(LayoutServiceError::MissingTitle(course_id.to_string()));
    };

    let claimed_here = match course.status {
        CourseStatus::LayoutSuccess => {
            info!("Layout of course {} already generated", course_id);
            return Ok(LayoutOutcome::AlreadyGenerated);
        }
        CourseStatus::LayoutFailed => {
            return Err(LayoutServiceError::Conflict(format!(
                "Course {} is in {}",
                course_id,
                CourseStatus::LayoutFailed
            )));
        }
        CourseStatus::LayoutProcessing => false,
        CourseStatus::Pending => {
            // Direct call: this request owns the course, so it makes two
            // transitions (Claim, then Succeed or Release) instead of one
            if !store.transition(course_id, Transition::Claim).await? {
                return Err(LayoutServiceError::Conflict(format!(
                    "Course {} was claimed by another worker",
                    course_id
                )));
            }
            info!("Claimed pending course {} for direct generation", course_id);
            true
        }
    };

    info!("Generating layout for course: {} (ID: {})", title, course_id);

    let layout = match produce_layout(generator, &course, title).await {
        Ok(layout) => layout,
        Err(e) => {
            if claimed_here {
                release(store, course_id).await;
            }
            return Err(e);
        }
    };

    match store.complete(course_id, &layout).await {
        Ok(true) => {
            info!("Course layout saved to the database for course {}", course_id);
            Ok(LayoutOutcome::Generated)
        }
        Ok(false) => Err(LayoutServiceError::Conflict(format!(
            "Course {} is no longer in {}",
            course_id,
            CourseStatus::LayoutProcessing
        ))),
        Err(e) => {
            error!("Failed to save layout of course {}: {}", course_id, e);
            release(store, course_id).await;
            Err(LayoutServiceError::Persistence(e))
        }
    }
}

/// List courses currently being processed
pub async fn list_processing(
    store: &dyn CourseStore,
) -> Result<Vec<ProcessingCourse>, LayoutServiceError> {
    Ok(store.list_processing().await?)
}

/// Prompt, generate and parse; no store access
async fn produce_layout(
    generator: &dyn TextGenerator,
    course: &Course,
    title: &str,
) -> Result<CourseLayout, LayoutServiceError> {
    let prompt = build_prompt(
        &course.id,
        title,
        course.description.as_deref(),
        course.difficulty.as_deref(),
    );

    let raw = generator
        .generate(&prompt)
        .await
        .map_err(LayoutServiceError::Generation)?;

    if raw.trim().is_empty() {
        return Err(LayoutServiceError::EmptyResponse(course.id.clone()));
    }
    info!("AI response received for course {}", course.id);

    let layout = parse_layout(&raw).map_err(|e| {
        error!("Failed to parse AI response for course {}: {}", course.id, e);
        LayoutServiceError::InvalidLayout(e)
    })?;

    info!("Valid course layout generated for course {}", course.id);
    Ok(layout)
}

/// Best-effort hand back to `PENDING`
async fn release(store: &dyn CourseStore, course_id: &str) {
    match store.transition(course_id, Transition::Release).await {
        Ok(true) => info!("Course {} reverted to PENDING", course_id),
        Ok(false) => warn!(
            "Course {} already left {}, not reverted",
            course_id,
            CourseStatus::LayoutProcessing
        ),
        Err(e) => error!("Failed to revert course {} to PENDING: {}", course_id, e),
    }
}
