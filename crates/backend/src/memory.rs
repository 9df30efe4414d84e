use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use course_core::Clock;
use course_core::model::{Course, CourseId, CourseProgress, StudentId, VideoId};
use tracing::debug;

use crate::api::{ApiError, CourseApi, CourseViewerPayload};

#[derive(Default)]
struct State {
    courses: HashMap<CourseId, Course>,
    // Enrollment order is the dashboard order.
    progress: Vec<CourseProgress>,
    update_calls: usize,
}

impl State {
    fn progress_mut(&mut self, course_id: &CourseId) -> Option<&mut CourseProgress> {
        self.progress.iter_mut().find(|p| &p.course_id == course_id)
    }
}

/// In-memory backend for one student, with the server's progress semantics.
///
/// Completions are set insertions, so repeating an update is a no-op; the
/// percentage and completion flag are recomputed on every write.
#[derive(Clone)]
pub struct InMemoryBackend {
    student_id: StudentId,
    clock: Clock,
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(student_id: StudentId, clock: Clock) -> Self {
        Self {
            student_id,
            clock,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    #[must_use]
    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ApiError> {
        self.state
            .lock()
            .map_err(|e| ApiError::Unavailable(e.to_string()))
    }

    /// Publish or replace a course.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unavailable` if the state lock is poisoned.
    pub fn upsert_course(&self, course: Course) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        if let Some(progress) = state.progress_mut(course.id()) {
            recompute(progress, &course);
        }
        state.courses.insert(course.id().clone(), course);
        Ok(())
    }

    /// Create an empty progress record, as a purchase would.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the course is unknown.
    pub fn enroll(&self, course_id: &CourseId) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        let total = state
            .courses
            .get(course_id)
            .map(video_total)
            .ok_or(ApiError::NotFound)?;
        if state.progress_mut(course_id).is_none() {
            state.progress.push(CourseProgress::enrolled(
                self.student_id.clone(),
                course_id.clone(),
                total,
            ));
        }
        Ok(())
    }

    /// Current record for a course, if any.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unavailable` if the state lock is poisoned.
    pub fn progress(&self, course_id: &CourseId) -> Result<Option<CourseProgress>, ApiError> {
        let mut state = self.lock()?;
        Ok(state.progress_mut(course_id).map(|p| p.clone()))
    }

    /// Number of update requests received, including repeats.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.lock().map_or(0, |state| state.update_calls)
    }
}

#[async_trait]
impl CourseApi for InMemoryBackend {
    async fn fetch_course_viewer(
        &self,
        course_id: &CourseId,
    ) -> Result<CourseViewerPayload, ApiError> {
        let mut state = self.lock()?;
        let course = state
            .courses
            .get(course_id)
            .cloned()
            .ok_or(ApiError::NotFound)?;
        let progress = state.progress_mut(course_id).map(|p| p.clone());
        Ok(CourseViewerPayload { course, progress })
    }

    async fn update_course_progress(
        &self,
        course_id: &CourseId,
        video_id: &VideoId,
    ) -> Result<Option<CourseProgress>, ApiError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        state.update_calls += 1;

        let course = state
            .courses
            .get(course_id)
            .cloned()
            .ok_or(ApiError::NotFound)?;
        if !course.contains(video_id) {
            return Err(ApiError::Rejected(format!(
                "video {video_id} is not part of course {course_id}"
            )));
        }

        if state.progress_mut(course_id).is_none() {
            state.progress.push(CourseProgress::enrolled(
                self.student_id.clone(),
                course_id.clone(),
                video_total(&course),
            ));
        }
        let progress = state
            .progress_mut(course_id)
            .ok_or_else(|| ApiError::Unavailable("progress record vanished".into()))?;

        let inserted = progress.completed_video_ids.insert(video_id.clone());
        recompute(progress, &course);
        progress.last_watched_video_id = Some(video_id.clone());
        progress.last_accessed_at = Some(now);

        debug!(
            course_id = %course_id,
            video_id = %video_id,
            inserted,
            percentage = progress.progress_percentage,
            "progress updated"
        );
        Ok(Some(progress.clone()))
    }

    async fn fetch_all_course_progress(&self) -> Result<Vec<CourseProgress>, ApiError> {
        Ok(self.lock()?.progress.clone())
    }
}

fn video_total(course: &Course) -> u32 {
    u32::try_from(course.video_count()).unwrap_or(u32::MAX)
}

// Server-side derivation: completed ids stay within the course and the
// aggregate fields follow from them.
fn recompute(progress: &mut CourseProgress, course: &Course) {
    progress
        .completed_video_ids
        .retain(|video_id| course.contains(video_id));
    let total = video_total(course);
    let completed = u32::try_from(progress.completed_video_ids.len()).unwrap_or(u32::MAX);
    progress.total_videos = total;
    progress.progress_percentage = if total == 0 {
        0.0
    } else {
        100.0 * f64::from(completed) / f64::from(total)
    };
    progress.is_completed = total > 0 && completed >= total;
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::VideoUnit;
    use course_core::time::{fixed_clock, fixed_now};
    use url::Url;

    fn course(id: &str, videos: usize) -> Course {
        let videos = (1..=videos)
            .map(|n| {
                let url = Url::parse(&format!("https://cdn.example.com/{id}/{n}.mp4")).unwrap();
                VideoUnit::new(VideoId::new(format!("video{n}")), format!("Part {n}"), url)
            })
            .collect();
        Course::new(CourseId::new(id), format!("Course {id}"), videos).unwrap()
    }

    fn backend_with(course_id: &str, videos: usize) -> InMemoryBackend {
        let backend = InMemoryBackend::new(StudentId::new("s1"), fixed_clock());
        backend.upsert_course(course(course_id, videos)).unwrap();
        backend
    }

    #[tokio::test]
    async fn repeated_updates_do_not_grow_the_set() {
        let backend = backend_with("c1", 4);
        let course_id = CourseId::new("c1");
        let video = VideoId::new("video2");

        let once = backend
            .update_course_progress(&course_id, &video)
            .await
            .unwrap()
            .unwrap();
        let twice = backend
            .update_course_progress(&course_id, &video)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(once.completed_count(), 1);
        assert_eq!(twice.completed_count(), once.completed_count());
        assert!((twice.progress_percentage - 25.0).abs() < f64::EPSILON);
        assert_eq!(backend.update_calls(), 2);
    }

    #[tokio::test]
    async fn completing_every_video_completes_the_course() {
        let backend = backend_with("c1", 2);
        let course_id = CourseId::new("c1");

        backend
            .update_course_progress(&course_id, &VideoId::new("video2"))
            .await
            .unwrap();
        let last = backend
            .update_course_progress(&course_id, &VideoId::new("video1"))
            .await
            .unwrap()
            .unwrap();

        assert!(last.is_completed);
        assert!((last.progress_percentage - 100.0).abs() < f64::EPSILON);
        assert_eq!(last.last_watched_video_id, Some(VideoId::new("video1")));
        assert_eq!(last.last_accessed_at, Some(fixed_now()));
    }

    #[tokio::test]
    async fn unknown_video_is_rejected() {
        let backend = backend_with("c1", 2);

        let err = backend
            .update_course_progress(&CourseId::new("c1"), &VideoId::new("nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Rejected(_)));
        assert_eq!(backend.progress(&CourseId::new("c1")).unwrap(), None);
    }

    #[tokio::test]
    async fn viewer_payload_has_no_progress_before_enrollment() {
        let backend = backend_with("c1", 3);

        let payload = backend
            .fetch_course_viewer(&CourseId::new("c1"))
            .await
            .unwrap();

        assert_eq!(payload.course.video_count(), 3);
        assert!(payload.progress.is_none());
    }

    #[tokio::test]
    async fn missing_course_is_not_found() {
        let backend = backend_with("c1", 3);
        let err = backend
            .fetch_course_viewer(&CourseId::new("c404"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn all_progress_follows_enrollment_order() {
        let backend = backend_with("c2", 1);
        backend.upsert_course(course("c1", 2)).unwrap();
        backend.enroll(&CourseId::new("c2")).unwrap();
        backend.enroll(&CourseId::new("c1")).unwrap();
        backend.enroll(&CourseId::new("c2")).unwrap();

        let all = backend.fetch_all_course_progress().await.unwrap();

        let ids: Vec<_> = all.iter().map(|p| p.course_id.as_str()).collect();
        assert_eq!(ids, ["c2", "c1"]);
        assert_eq!(all[1].total_videos, 2);
    }

    #[tokio::test]
    async fn course_edit_recomputes_existing_progress() {
        let backend = backend_with("c1", 4);
        let course_id = CourseId::new("c1");
        for video in ["video1", "video4"] {
            backend
                .update_course_progress(&course_id, &VideoId::new(video))
                .await
                .unwrap();
        }

        backend.upsert_course(course("c1", 2)).unwrap();
        let progress = backend.progress(&course_id).unwrap().unwrap();
        assert_eq!(
            progress.completed_video_ids.iter().collect::<Vec<_>>(),
            [&VideoId::new("video1")]
        );
        assert_eq!(progress.total_videos, 2);
        assert!((progress.progress_percentage - 50.0).abs() < 1e-9);
        assert!(!progress.is_completed);

        backend.upsert_course(course("c1", 1)).unwrap();
        let progress = backend.progress(&course_id).unwrap().unwrap();
        assert!((progress.progress_percentage - 100.0).abs() < 1e-9);
        assert!(progress.is_completed);
    }
}
