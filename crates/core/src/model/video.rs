use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::ids::VideoId;

/// One authored lecture video belonging to a course.
///
/// Immutable once authored. `duration_seconds` is whatever the authoring
/// pipeline recorded and may be missing; playback never relies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUnit {
    pub id: VideoId,
    pub title: String,
    pub url: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl VideoUnit {
    #[must_use]
    pub fn new(id: VideoId, title: impl Into<String>, url: Url) -> Self {
        Self {
            id,
            title: title.into(),
            url,
            duration_seconds: None,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}
