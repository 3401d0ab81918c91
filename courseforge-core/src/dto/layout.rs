//! Layout endpoint DTOs

use serde::{Deserialize, Serialize};

/// Request to generate the layout of a course
///
/// `course_id` is optional on the wire so that a missing id can be answered
/// with a descriptive error instead of a generic body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLayoutRequest {
    #[serde(default)]
    pub course_id: Option<String>,
}

impl GenerateLayoutRequest {
    pub fn new(course_id: impl Into<String>) -> Self {
        Self {
            course_id: Some(course_id.into()),
        }
    }

    /// The course id, if present and not blank
    pub fn course_id(&self) -> Option<&str> {
        self.course_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Acknowledgement returned by the layout endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateLayoutResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateLayoutResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}
