use chrono::{DateTime, Utc};

use crate::model::ids::CourseId;

/// Client-only state of one mounted course viewer.
///
/// Lives for a single viewing session and is dropped on navigation away.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    course_id: CourseId,
    active_video_index: usize,
    current_time_seconds: f64,
    duration: Option<f64>,
    last_progress_signal_at: Option<DateTime<Utc>>,
}

impl PlaybackSession {
    #[must_use]
    pub fn new(course_id: CourseId, active_video_index: usize) -> Self {
        Self {
            course_id,
            active_video_index,
            current_time_seconds: 0.0,
            duration: None,
            last_progress_signal_at: None,
        }
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn active_video_index(&self) -> usize {
        self.active_video_index
    }

    #[must_use]
    pub fn current_time_seconds(&self) -> f64 {
        self.current_time_seconds
    }

    /// Last duration reported by the media element, if any.
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    #[must_use]
    pub fn last_progress_signal_at(&self) -> Option<DateTime<Utc>> {
        self.last_progress_signal_at
    }

    /// Record a playback sample from the media element.
    pub fn record_sample(&mut self, current_time_seconds: f64, duration: f64) {
        self.current_time_seconds = current_time_seconds;
        self.duration = Some(duration);
    }

    /// Move to another video; playback position restarts.
    pub fn switch_to(&mut self, index: usize) {
        self.active_video_index = index;
        self.current_time_seconds = 0.0;
        self.duration = None;
    }

    /// The active video moved within the course; playback continues.
    pub fn reindex(&mut self, index: usize) {
        self.active_video_index = index;
    }

    pub fn mark_progress_signal(&mut self, at: DateTime<Utc>) {
        self.last_progress_signal_at = Some(at);
    }
}
