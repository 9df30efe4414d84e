//! Read-side projection of a course viewer's initial state.
//!
//! Combines the authored video list with the server's progress snapshot (and,
//! optionally, a locally cached last-watched pointer) into the resume point and
//! per-video completion marks. Nothing here writes; calling it twice with the
//! same inputs yields the same state.

use std::collections::HashMap;

use crate::classifier::classify;
use crate::model::{Course, CourseId, CourseProgress, EnrollmentBucket, VideoId, VideoUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    NotCompleted,
    Completed,
}

impl VideoStatus {
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, VideoStatus::Completed)
    }
}

/// Where the resume point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSource {
    /// `last_watched_video_id` from the server record.
    Server,
    /// The pointer cached on this device.
    LocalCache,
    /// Nothing usable; start at the first video.
    Default,
}

/// Initial viewer state for one course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseViewState {
    pub course_id: CourseId,
    pub resume_index: usize,
    pub resume_video_id: Option<VideoId>,
    pub resume_source: ResumeSource,
    pub statuses: HashMap<VideoId, VideoStatus>,
    pub completed_count: usize,
    pub progress_percentage: f64,
    pub is_completed: bool,
    pub bucket: EnrollmentBucket,
}

impl CourseViewState {
    /// Status of a video; ids not in the course read as not completed.
    #[must_use]
    pub fn status_of(&self, id: &VideoId) -> VideoStatus {
        self.statuses
            .get(id)
            .copied()
            .unwrap_or(VideoStatus::NotCompleted)
    }

    /// Videos in authored order paired with their completion mark.
    pub fn rows<'a>(
        &'a self,
        course: &'a Course,
    ) -> impl Iterator<Item = (&'a VideoUnit, VideoStatus)> + 'a {
        course
            .videos()
            .iter()
            .map(|video| (video, self.status_of(&video.id)))
    }
}

pub struct CourseStateReconciler;

impl CourseStateReconciler {
    /// Project the viewer state from the course and the server snapshot.
    #[must_use]
    pub fn reconcile(course: &Course, progress: Option<&CourseProgress>) -> CourseViewState {
        Self::reconcile_with_cached(course, progress, None)
    }

    /// Like [`reconcile`](Self::reconcile), falling back to a device-local
    /// last-watched pointer when the server pointer is missing or stale.
    #[must_use]
    pub fn reconcile_with_cached(
        course: &Course,
        progress: Option<&CourseProgress>,
        cached: Option<&VideoId>,
    ) -> CourseViewState {
        let (resume_index, resume_source) = resume_point(course, progress, cached);

        let statuses: HashMap<VideoId, VideoStatus> = course
            .videos()
            .iter()
            .map(|video| {
                let status = match progress {
                    Some(p) if p.is_video_completed(&video.id) => VideoStatus::Completed,
                    _ => VideoStatus::NotCompleted,
                };
                (video.id.clone(), status)
            })
            .collect();
        let completed_count = statuses.values().filter(|s| s.is_completed()).count();

        CourseViewState {
            course_id: course.id().clone(),
            resume_index,
            resume_video_id: course.video(resume_index).map(|video| video.id.clone()),
            resume_source,
            statuses,
            completed_count,
            progress_percentage: progress.map_or(0.0, |p| p.progress_percentage),
            is_completed: progress.is_some_and(|p| p.is_completed),
            bucket: progress.map_or(EnrollmentBucket::NotStarted, classify),
        }
    }
}

fn resume_point(
    course: &Course,
    progress: Option<&CourseProgress>,
    cached: Option<&VideoId>,
) -> (usize, ResumeSource) {
    let server = progress
        .and_then(|p| p.last_watched_video_id.as_ref())
        .and_then(|id| course.position_of(id));
    if let Some(index) = server {
        return (index, ResumeSource::Server);
    }

    if let Some(index) = cached.and_then(|id| course.position_of(id)) {
        return (index, ResumeSource::LocalCache);
    }

    (0, ResumeSource::Default)
}
