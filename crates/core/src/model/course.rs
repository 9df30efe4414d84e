use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, VideoId};
use crate::model::video::VideoUnit;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("video {0} appears more than once in the course")]
    DuplicateVideo(VideoId),
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A course as the viewer sees it: metadata plus the ordered video sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CourseWire", into = "CourseWire")]
pub struct Course {
    id: CourseId,
    title: String,
    videos: Vec<VideoUnit>,
}

impl Course {
    /// Creates a course with an ordered list of videos.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank.
    /// Returns `CourseError::DuplicateVideo` if two videos share an id.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        videos: Vec<VideoUnit>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }

        let mut seen = HashSet::with_capacity(videos.len());
        for video in &videos {
            if !seen.insert(&video.id) {
                return Err(CourseError::DuplicateVideo(video.id.clone()));
            }
        }

        Ok(Self { id, title, videos })
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn videos(&self) -> &[VideoUnit] {
        &self.videos
    }

    #[must_use]
    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    #[must_use]
    pub fn video(&self, index: usize) -> Option<&VideoUnit> {
        self.videos.get(index)
    }

    /// Position of a video in the authored sequence, if it still exists.
    #[must_use]
    pub fn position_of(&self, id: &VideoId) -> Option<usize> {
        self.videos.iter().position(|video| &video.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &VideoId) -> bool {
        self.position_of(id).is_some()
    }
}

#[derive(Serialize, Deserialize)]
struct CourseWire {
    #[serde(alias = "_id")]
    id: CourseId,
    title: String,
    #[serde(default)]
    videos: Vec<VideoUnit>,
}

impl TryFrom<CourseWire> for Course {
    type Error = CourseError;

    fn try_from(wire: CourseWire) -> Result<Self, Self::Error> {
        Course::new(wire.id, wire.title, wire.videos)
    }
}

impl From<Course> for CourseWire {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            videos: course.videos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn video(id: &str) -> VideoUnit {
        let url = Url::parse(&format!("https://cdn.example.com/{id}.mp4")).unwrap();
        VideoUnit::new(VideoId::new(id), format!("Lecture {id}"), url)
    }

    #[test]
    fn rejects_blank_title() {
        let err = Course::new(CourseId::new("c1"), "  ", vec![]).unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);
    }

    #[test]
    fn rejects_duplicate_video_ids() {
        let err = Course::new(
            CourseId::new("c1"),
            "Rust 101",
            vec![video("a"), video("b"), video("a")],
        )
        .unwrap_err();
        assert_eq!(err, CourseError::DuplicateVideo(VideoId::new("a")));
    }

    #[test]
    fn position_of_follows_authored_order() {
        let course = Course::new(
            CourseId::new("c1"),
            "Rust 101",
            vec![video("a"), video("b"), video("c")],
        )
        .unwrap();
        assert_eq!(course.position_of(&VideoId::new("c")), Some(2));
        assert_eq!(course.position_of(&VideoId::new("z")), None);
    }

    #[test]
    fn course_without_videos_deserializes() {
        let course: Course = serde_json::from_str(r#"{"_id":"c9","title":"Draft"}"#).unwrap();
        assert_eq!(course.video_count(), 0);
        assert_eq!(course.id().as_str(), "c9");
    }

    #[test]
    fn invalid_payload_fails_deserialization() {
        let result = serde_json::from_str::<Course>(r#"{"id":"c9","title":""}"#);
        assert!(result.is_err());
    }
}
