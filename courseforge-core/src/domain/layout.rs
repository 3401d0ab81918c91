//! Course layout domain types and parsing
//!
//! A layout is the structured outline produced by the text generator. The
//! generator answers in free text, so [`parse_layout`] strips an optional
//! Markdown fence, checks the text is a JSON object, and validates the shape
//! level by level before converting it into a [`CourseLayout`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Generated course outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseLayout {
    pub course_title: String,
    pub course_description: String,
    pub difficulty_level: String,
    pub course_structure: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub chapter_title: String,
    pub chapter_description: String,
    pub topics_covered: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub topic_title: String,
    pub topic_description: String,
    pub subtopics: Vec<String>,
}

/// Reasons generated text is rejected as a layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response is not valid JSON: {0}")]
    Malformed(String),

    #[error("layout is missing required fields")]
    MissingFields,

    #[error("invalid structure in chapter {chapter}")]
    InvalidChapter { chapter: usize },

    #[error("invalid structure in topic {topic} of chapter {chapter}")]
    InvalidTopic { chapter: usize, topic: usize },
}

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Parses and validates generated text as a [`CourseLayout`].
///
/// Chapter and topic indexes in errors are zero-based.
pub fn parse_layout(raw: &str) -> Result<CourseLayout, LayoutError> {
    let text = strip_fence(raw);

    if !text.starts_with('{') || !text.ends_with('}') {
        return Err(LayoutError::NotAnObject);
    }

    let value: JsonValue =
        serde_json::from_str(text).map_err(|e| LayoutError::Malformed(e.to_string()))?;

    validate_layout(&value)?;

    serde_json::from_value(value).map_err(|e| LayoutError::Malformed(e.to_string()))
}

/// Removes a leading ```json marker and its closing fence, if present
fn strip_fence(raw: &str) -> &str {
    let text = raw.trim();
    match text.strip_prefix(FENCE_OPEN) {
        Some(rest) => {
            let rest = rest.trim();
            rest.strip_suffix(FENCE_CLOSE).unwrap_or(rest).trim()
        }
        None => text,
    }
}

fn validate_layout(value: &JsonValue) -> Result<(), LayoutError> {
    let root = value.as_object().ok_or(LayoutError::MissingFields)?;

    let chapters = match root.get("courseStructure") {
        Some(JsonValue::Array(chapters))
            if has_text(root, "courseTitle")
                && has_text(root, "courseDescription")
                && has_text(root, "difficultyLevel") =>
        {
            chapters
        }
        _ => return Err(LayoutError::MissingFields),
    };

    for (chapter_idx, chapter) in chapters.iter().enumerate() {
        let invalid_chapter = LayoutError::InvalidChapter {
            chapter: chapter_idx,
        };
        let chapter = chapter.as_object().ok_or(invalid_chapter.clone())?;

        if !has_text(chapter, "chapterTitle") || !has_text(chapter, "chapterDescription") {
            return Err(invalid_chapter);
        }
        let topics = chapter
            .get("topicsCovered")
            .and_then(JsonValue::as_array)
            .ok_or(invalid_chapter)?;

        for (topic_idx, topic) in topics.iter().enumerate() {
            if !is_valid_topic(topic) {
                return Err(LayoutError::InvalidTopic {
                    chapter: chapter_idx,
                    topic: topic_idx,
                });
            }
        }
    }

    Ok(())
}

fn is_valid_topic(topic: &JsonValue) -> bool {
    let Some(topic) = topic.as_object() else {
        return false;
    };

    has_text(topic, "topicTitle")
        && has_text(topic, "topicDescription")
        && topic
            .get("subtopics")
            .and_then(JsonValue::as_array)
            .is_some_and(|subtopics| subtopics.iter().all(JsonValue::is_string))
}

fn has_text(object: &Map<String, JsonValue>, key: &str) -> bool {
    object
        .get(key)
        .and_then(JsonValue::as_str)
        .is_some_and(|s| !s.is_empty())
}
