//! Layout API Handlers
//!
//! `POST /api/generate-course-layout` generates one course's layout;
//! `GET` on the same path lists the courses currently being processed.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use courseforge_core::domain::course::ProcessingCourse;
use courseforge_core::dto::layout::{GenerateLayoutRequest, GenerateLayoutResponse};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::layout_service::{self, LayoutServiceError};

/// POST /api/generate-course-layout
/// Generate, validate and store the layout of a course
pub async fn generate_layout(
    State(state): State<AppState>,
    body: Result<Json<GenerateLayoutRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateLayoutResponse>> {
    // A missing or unreadable body is the same client error as a missing id
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let Some(course_id) = request.course_id() else {
        return Err(ApiError::BadRequest("courseId is required".to_string()));
    };

    tracing::info!("Layout generation requested for course {}", course_id);

    layout_service::generate_layout(state.store.as_ref(), state.generator.as_ref(), course_id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(GenerateLayoutResponse::ok()))
}

/// GET /api/generate-course-layout
/// List courses in LAYOUT_PROCESSING, oldest first
pub async fn list_processing(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ProcessingCourse>>> {
    tracing::debug!("Listing processing courses");

    let courses = layout_service::list_processing(state.store.as_ref())
        .await
        .map_err(into_api_error)?;

    Ok(Json(courses))
}

fn into_api_error(err: LayoutServiceError) -> ApiError {
    match err {
        LayoutServiceError::NotFound(_) => ApiError::NotFound("Course not found".to_string()),
        LayoutServiceError::MissingTitle(_) => {
            ApiError::NotFound("Course title is missing".to_string())
        }
        LayoutServiceError::Conflict(msg) => ApiError::Conflict(msg),
        LayoutServiceError::InvalidLayout(_) => {
            ApiError::Internal("AI response parsing failed. Please try again.".to_string())
        }
        LayoutServiceError::Persistence(_) => ApiError::Internal("Database Error".to_string()),
        LayoutServiceError::EmptyResponse(id) => {
            tracing::error!("No AI response received for course {}", id);
            ApiError::Internal("Internal Server Error".to_string())
        }
        LayoutServiceError::Generation(e) => {
            tracing::error!("Layout generation failed: {}", e);
            ApiError::Internal("Internal Server Error".to_string())
        }
        LayoutServiceError::Store(e) => ApiError::Store(e),
    }
}
