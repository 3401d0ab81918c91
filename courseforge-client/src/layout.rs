//! Layout endpoint calls

use courseforge_core::domain::course::ProcessingCourse;
use courseforge_core::dto::layout::{GenerateLayoutRequest, GenerateLayoutResponse};
use tracing::debug;

use crate::LayoutClient;
use crate::error::Result;

const LAYOUT_PATH: &str = "/api/generate-course-layout";

impl LayoutClient {
    /// Ask the server to generate and store the layout of a course
    ///
    /// # Arguments
    /// * `course_id` - ID of the course, normally one the caller has claimed
    ///
    /// # Returns
    /// The endpoint's acknowledgement. Any non-2xx answer is an error.
    pub async fn generate_layout(&self, course_id: &str) -> Result<GenerateLayoutResponse> {
        let url = format!("{}{}", self.base_url, LAYOUT_PATH);
        debug!("POST {} for course {}", url, course_id);

        let response = self
            .client
            .post(&url)
            .json(&GenerateLayoutRequest::new(course_id))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List courses currently in `LAYOUT_PROCESSING`, oldest first
    pub async fn list_processing(&self) -> Result<Vec<ProcessingCourse>> {
        let url = format!("{}{}", self.base_url, LAYOUT_PATH);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
