//! Course domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::layout::CourseLayout;

/// Course record as stored, the unit of work of the layout workflow.
///
/// The row is the single source of truth for a course's progress: `layout` is
/// set if and only if `status` is [`CourseStatus::LayoutSuccess`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub status: CourseStatus,
    pub layout: Option<CourseLayout>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Course {
    /// Title, if present and not blank
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Layout workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseStatus {
    Pending,
    LayoutProcessing,
    LayoutSuccess,
    LayoutFailed,
}

impl CourseStatus {
    /// Column value of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Pending => "PENDING",
            CourseStatus::LayoutProcessing => "LAYOUT_PROCESSING",
            CourseStatus::LayoutSuccess => "LAYOUT_SUCCESS",
            CourseStatus::LayoutFailed => "LAYOUT_FAILED",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(CourseStatus::Pending),
            "LAYOUT_PROCESSING" => Ok(CourseStatus::LayoutProcessing),
            "LAYOUT_SUCCESS" => Ok(CourseStatus::LayoutSuccess),
            "LAYOUT_FAILED" => Ok(CourseStatus::LayoutFailed),
            other => Err(format!("unknown course status: {}", other)),
        }
    }
}

/// Submitter of a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOwner {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

/// Course currently held in `LAYOUT_PROCESSING`, joined with its submitter.
///
/// Returned by the operational listing; never used for control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingCourse {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub user: CourseOwner,
}
