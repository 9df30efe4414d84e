use std::sync::Arc;

use async_trait::async_trait;
use course_core::model::{Course, CourseId, CourseProgress, VideoId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend returned status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Everything the course viewer needs on mount.
///
/// `progress` is absent for courses the student never opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseViewerPayload {
    pub course: Course,
    #[serde(default)]
    pub progress: Option<CourseProgress>,
}

/// Contract for the remote course-progress collaborator.
///
/// Implementations must treat `update_course_progress` as idempotent: the
/// client cannot guarantee exactly-once delivery.
#[async_trait]
pub trait CourseApi: Send + Sync {
    /// Fetch a course with the current student's progress record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the course does not exist, or other
    /// transport errors.
    async fn fetch_course_viewer(&self, course_id: &CourseId)
    -> Result<CourseViewerPayload, ApiError>;

    /// Mark a video as completed for the current student.
    ///
    /// Returns the recomputed record when the backend sends one back.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend refuses the update or cannot be reached.
    async fn update_course_progress(
        &self,
        course_id: &CourseId,
        video_id: &VideoId,
    ) -> Result<Option<CourseProgress>, ApiError>;

    /// Fetch every progress record of the current student.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or decoding failures.
    async fn fetch_all_course_progress(&self) -> Result<Vec<CourseProgress>, ApiError>;
}

/// Backend handle behind a trait object for easy swapping.
#[derive(Clone)]
pub struct Backend {
    pub courses: Arc<dyn CourseApi>,
}

impl Backend {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseApi>) -> Self {
        Self { courses }
    }
}
