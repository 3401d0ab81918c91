//! Layout prompt

/// Upper bound on chapters requested from the model
pub const MAX_CHAPTERS: usize = 25;

/// Builds the generation prompt for a course
///
/// Missing description or difficulty are rendered as `N/A`. The prompt asks
/// for bare JSON in the [`CourseLayout`](courseforge_core::domain::CourseLayout)
/// shape and spells out the checks the answer will be subjected to.
pub fn build_prompt(
    course_id: &str,
    title: &str,
    description: Option<&str>,
    difficulty: Option<&str>,
) -> String {
    let description = description.filter(|d| !d.trim().is_empty()).unwrap_or("N/A");
    let difficulty = difficulty.filter(|d| !d.trim().is_empty()).unwrap_or("N/A");

    format!(
        r#"Generate a structured course outline based on the following details:
Course Title: {title}
Course Description: {description}
Difficulty Level: {difficulty}

The structure should include:
- Chapters (up to {MAX_CHAPTERS}), each with:
  - Chapter Title
  - Chapter Description
  - Topics Covered:
    - Topic Title
    - Topic Description
    - Subtopics (detailed breakdown)

Format the response strictly as JSON with this structure:

{{
  "courseTitle": "...",
  "courseDescription": "...",
  "difficultyLevel": "...",
  "courseStructure": [
    {{
      "chapterTitle": "...",
      "chapterDescription": "...",
      "topicsCovered": [
        {{
          "topicTitle": "...",
          "topicDescription": "...",
          "subtopics": ["...", "..."]
        }}
      ]
    }}
  ]
}}

Strictly return only JSON data.

The course outline for course {course_id} will be validated using the following criteria:
- courseTitle, courseDescription and difficultyLevel are non-empty strings, and courseStructure is an array.
- Every chapter has a non-empty chapterTitle and chapterDescription, and topicsCovered is an array.
- Every topic has a non-empty topicTitle and topicDescription, and subtopics is an array of strings.
A response failing any of these checks is rejected.
"#
    )
}
