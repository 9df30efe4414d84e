use async_trait::async_trait;
use course_core::model::{CourseId, CourseProgress, VideoId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::api::{ApiError, CourseApi, CourseViewerPayload};

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

/// REST adapter for the marketplace backend.
///
/// Routes, relative to `base_url`:
/// - `GET  courses/{course_id}/viewer`
/// - `POST courses/{course_id}/progress` with `{"videoId": ...}`
/// - `GET  progress`
#[derive(Clone)]
pub struct HttpCourseApi {
    client: Client,
    config: HttpConfig,
}

impl HttpCourseApi {
    #[must_use]
    pub fn new(config: HttpConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Build an absolute endpoint URL from path segments.
    ///
    /// Segments are percent-encoded, so opaque ids cannot escape their slot.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, route: Route) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if let Err(err) = check_status(status, route) {
            warn!(%status, url = %response.url(), "backend request failed");
            return Err(err);
        }
        Ok(response)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Viewer,
    Progress,
}

// Only a missing course is a domain-level `NotFound`; a 404 elsewhere means
// the backend is misconfigured.
fn check_status(status: StatusCode, route: Route) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::NOT_FOUND && route == Route::Viewer {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpStatus(status))
}

#[async_trait]
impl CourseApi for HttpCourseApi {
    async fn fetch_course_viewer(
        &self,
        course_id: &CourseId,
    ) -> Result<CourseViewerPayload, ApiError> {
        let url = self.endpoint(&["courses", course_id.as_str(), "viewer"])?;
        debug!(%url, "fetching course viewer");
        let response = self.send(self.client.get(url), Route::Viewer).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn update_course_progress(
        &self,
        course_id: &CourseId,
        video_id: &VideoId,
    ) -> Result<Option<CourseProgress>, ApiError> {
        let url = self.endpoint(&["courses", course_id.as_str(), "progress"])?;
        debug!(%url, video_id = %video_id, "posting progress update");
        let payload = ProgressUpdateRequest {
            video_id: video_id.as_str(),
        };
        let request = self.client.post(url).json(&payload);
        let response = self.send(request, Route::Progress).await?;
        let bytes = response.bytes().await?;
        decode_update(&bytes)
    }

    async fn fetch_all_course_progress(&self) -> Result<Vec<CourseProgress>, ApiError> {
        let url = self.endpoint(&["progress"])?;
        debug!(%url, "fetching all course progress");
        let response = self.send(self.client.get(url), Route::Progress).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressUpdateRequest<'a> {
    video_id: &'a str,
}

// Bare first: a wrapped body lacks the record's required ids.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProgressUpdateResponse {
    Bare(CourseProgress),
    Wrapped {
        #[serde(default)]
        progress: Option<CourseProgress>,
    },
}

// The update route may answer 204, the record itself, or `{"progress": ...}`.
fn decode_update(bytes: &[u8]) -> Result<Option<CourseProgress>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice(bytes)? {
        ProgressUpdateResponse::Bare(progress) => Ok(Some(progress)),
        ProgressUpdateResponse::Wrapped { progress } => Ok(progress),
    }
}
