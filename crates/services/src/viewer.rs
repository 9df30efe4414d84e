use std::sync::Arc;

use backend::{CourseApi, CourseViewerPayload};
use chrono::{DateTime, Utc};
use course_core::model::{Course, CourseId, CourseProgress, PlaybackSession, VideoUnit};
use course_core::{
    Clock, CompletionSignal, CourseStateReconciler, CourseViewState, ProgressTracker,
    TrackerConfig, TrackerState,
};
use tracing::{debug, instrument, warn};

use crate::error::ViewerError;
use crate::notify::{Notification, Notifier};
use crate::progress_updater::{ProgressDispatch, ProgressUpdater};
use crate::store::{Action, AppStore};

pub const COURSE_NOT_LOADED: &str = "This course could not be loaded. Please try again.";

/// Opens course viewer sessions.
#[derive(Clone)]
pub struct CourseViewerService {
    clock: Clock,
    api: Arc<dyn CourseApi>,
    notifier: Arc<dyn Notifier>,
    store: AppStore,
    tracker_config: TrackerConfig,
}

impl CourseViewerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        api: Arc<dyn CourseApi>,
        notifier: Arc<dyn Notifier>,
        store: AppStore,
    ) -> Self {
        Self {
            clock,
            api,
            notifier,
            store,
            tracker_config: TrackerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_tracker_config(mut self, config: TrackerConfig) -> Self {
        self.tracker_config = config;
        self
    }

    /// Fetch the course and mount a viewer at its resume point.
    ///
    /// # Errors
    ///
    /// Returns `ViewerError::Api` if the course cannot be fetched; the learner
    /// has already been notified.
    #[instrument(skip_all, fields(course_id = %course_id))]
    pub async fn open(&self, course_id: &CourseId) -> Result<ViewerSession, ViewerError> {
        let payload = self.fetch(course_id).await?;
        let cached = self.store.last_watched(course_id);
        let view = CourseStateReconciler::reconcile_with_cached(
            &payload.course,
            payload.progress.as_ref(),
            cached.as_ref(),
        );
        debug!(
            resume_index = view.resume_index,
            resume_source = ?view.resume_source,
            completed = view.completed_count,
            "course viewer mounted"
        );

        let mut tracker = ProgressTracker::new(self.tracker_config);
        if let Some(video_id) = &view.resume_video_id {
            tracker.select_video(video_id.clone());
        }

        Ok(ViewerSession {
            playback: PlaybackSession::new(course_id.clone(), view.resume_index),
            course: payload.course,
            progress: payload.progress,
            view,
            tracker,
            updater: ProgressUpdater::new(Arc::clone(&self.api), Arc::clone(&self.notifier)),
            store: self.store.clone(),
            clock: self.clock.clone(),
        })
    }

    /// Replace a session's server snapshot with a fresh fetch.
    ///
    /// Playback position and the tracker are left alone while the active video
    /// is still in the course. Otherwise any pending completion is cancelled
    /// and the viewer moves to the first video, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ViewerError::Api` if the fetch fails; the session keeps its
    /// previous snapshot.
    #[instrument(skip_all, fields(course_id = %session.course.id()))]
    pub async fn refresh(&self, session: &mut ViewerSession) -> Result<(), ViewerError> {
        let payload = self.fetch(session.course.id()).await?;
        session.apply_snapshot(payload);
        Ok(())
    }

    async fn fetch(&self, course_id: &CourseId) -> Result<CourseViewerPayload, ViewerError> {
        match self.api.fetch_course_viewer(course_id).await {
            Ok(payload) => Ok(payload),
            Err(err) => {
                warn!(error = %err, "course viewer fetch failed");
                self.notifier.notify(Notification::error(COURSE_NOT_LOADED));
                Err(err.into())
            }
        }
    }
}

/// One mounted course viewer.
///
/// Owns the ephemeral playback state and the completion tracker; dropping the
/// session discards both, along with any pending debounce.
pub struct ViewerSession {
    course: Course,
    progress: Option<CourseProgress>,
    view: CourseViewState,
    playback: PlaybackSession,
    tracker: ProgressTracker,
    updater: ProgressUpdater,
    store: AppStore,
    clock: Clock,
}

impl ViewerSession {
    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    /// Server snapshot as of the last fetch.
    #[must_use]
    pub fn progress(&self) -> Option<&CourseProgress> {
        self.progress.as_ref()
    }

    #[must_use]
    pub fn view(&self) -> &CourseViewState {
        &self.view
    }

    #[must_use]
    pub fn playback(&self) -> &PlaybackSession {
        &self.playback
    }

    #[must_use]
    pub fn tracker_state(&self) -> &TrackerState {
        self.tracker.state()
    }

    #[must_use]
    pub fn active_video(&self) -> Option<&VideoUnit> {
        self.course.video(self.playback.active_video_index())
    }

    /// When `tick` should next be called, if a completion is pending.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.tracker.next_deadline()
    }

    #[must_use]
    pub fn is_updating_progress(&self) -> bool {
        self.updater.is_updating_any()
    }

    /// The learner picked another video.
    ///
    /// # Errors
    ///
    /// Returns `ViewerError::VideoOutOfRange` if `index` is past the end of the course.
    pub fn select_video(&mut self, index: usize) -> Result<(), ViewerError> {
        let video_id = self
            .course
            .video(index)
            .map(|video| video.id.clone())
            .ok_or(ViewerError::VideoOutOfRange {
                index,
                len: self.course.video_count(),
            })?;

        if let Some(cancelled) = self.tracker.select_video(video_id.clone()) {
            debug!(video_id = %cancelled, "pending completion cancelled by video switch");
        }
        self.playback.switch_to(index);
        self.store.dispatch(Action::VideoWatched {
            course_id: self.course.id().clone(),
            video_id,
        });
        Ok(())
    }

    /// A `timeupdate` sample from the media element.
    pub fn on_time_update(
        &mut self,
        current_time_seconds: f64,
        duration: f64,
    ) -> ProgressDispatch {
        self.playback.record_sample(current_time_seconds, duration);
        let signal = self
            .tracker
            .on_sample(current_time_seconds, duration, self.clock.now());
        self.dispatch(signal)
    }

    /// The media element reached the end of the active video.
    pub fn on_ended(&mut self) -> ProgressDispatch {
        let signal = self.tracker.on_ended(self.clock.now());
        self.dispatch(signal)
    }

    /// Fire a pending completion whose debounce window has elapsed.
    pub fn tick(&mut self) -> ProgressDispatch {
        let signal = self.tracker.poll(self.clock.now());
        self.dispatch(signal)
    }

    fn dispatch(&mut self, signal: Option<CompletionSignal>) -> ProgressDispatch {
        let Some(signal) = signal else {
            return ProgressDispatch::Idle;
        };
        self.playback.mark_progress_signal(signal.emitted_at);
        self.updater.submit(self.course.id(), signal)
    }

    fn apply_snapshot(&mut self, payload: CourseViewerPayload) {
        let active = self.tracker.active_video().cloned();
        self.course = payload.course;
        self.progress = payload.progress;
        self.view = CourseStateReconciler::reconcile(&self.course, self.progress.as_ref());

        if let Some(index) = active.as_ref().and_then(|id| self.course.position_of(id)) {
            self.playback.reindex(index);
            return;
        }

        // The active video left the course, or there was none to begin with.
        if let Some(cancelled) = self.tracker.clear_active() {
            debug!(video_id = %cancelled, "pending completion cancelled by course refresh");
        }
        self.playback.switch_to(0);
        if let Some(first) = self.course.video(0) {
            self.tracker.select_video(first.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;
    use chrono::Duration;
    use course_core::model::{StudentId, VideoId};
    use course_core::time::fixed_now;
    use course_core::{ResumeSource, VideoStatus};
    use url::Url;

    use crate::notify::QueueNotifier;

    struct Fixture {
        clock: Clock,
        backend: InMemoryBackend,
        notifier: Arc<QueueNotifier>,
        store: AppStore,
        service: CourseViewerService,
    }

    fn course(videos: usize) -> Course {
        let videos = (1..=videos)
            .map(|n| {
                let url = Url::parse(&format!("https://cdn.example.com/c1/{n}.mp4")).unwrap();
                VideoUnit::new(VideoId::new(format!("video{n}")), format!("Part {n}"), url)
            })
            .collect();
        Course::new(CourseId::new("c1"), "Rust basics", videos).unwrap()
    }

    fn fixture(videos: usize) -> Fixture {
        let clock = Clock::manual(fixed_now());
        let backend = InMemoryBackend::new(StudentId::new("s1"), clock.clone());
        backend.upsert_course(course(videos)).unwrap();
        backend.enroll(&CourseId::new("c1")).unwrap();
        let notifier = Arc::new(QueueNotifier::new());
        let store = AppStore::new();
        let service = CourseViewerService::new(
            clock.clone(),
            Arc::new(backend.clone()),
            notifier.clone(),
            store.clone(),
        );
        Fixture {
            clock,
            backend,
            notifier,
            store,
            service,
        }
    }

    #[tokio::test]
    async fn fresh_enrollment_opens_on_first_video() {
        let fx = fixture(3);
        let session = fx.service.open(&CourseId::new("c1")).await.unwrap();

        assert_eq!(session.playback().active_video_index(), 0);
        assert_eq!(session.view().resume_source, ResumeSource::Default);
        assert_eq!(session.active_video().unwrap().id, VideoId::new("video1"));
        assert_eq!(session.view().completed_count, 0);
    }

    #[tokio::test]
    async fn threshold_crossing_waits_for_debounce_then_sends_once() {
        let fx = fixture(4);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();
        session.select_video(1).unwrap();

        for step in 0..30_i32 {
            let at = 57.0 + f64::from(step) * 0.05;
            assert!(matches!(
                session.on_time_update(at, 60.0),
                ProgressDispatch::Idle
            ));
        }
        assert!(session.next_deadline().is_some());
        assert!(matches!(session.tick(), ProgressDispatch::Idle));

        fx.clock.advance(Duration::seconds(1));
        let dispatch = session.tick();
        assert!(dispatch.is_sent());
        dispatch.finished().await.unwrap();

        assert!(matches!(
            session.on_time_update(59.9, 60.0),
            ProgressDispatch::Idle
        ));
        assert!(matches!(session.on_ended(), ProgressDispatch::Idle));
        assert_eq!(fx.backend.update_calls(), 1);
        assert_eq!(session.playback().last_progress_signal_at(), Some(fx.clock.now()));
    }

    #[tokio::test]
    async fn switching_video_cancels_pending_completion() {
        let fx = fixture(3);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();

        session.on_time_update(55.0, 60.0);
        assert!(session.next_deadline().is_some());
        session.select_video(2).unwrap();
        assert_eq!(session.next_deadline(), None);

        fx.clock.advance(Duration::seconds(5));
        assert!(matches!(session.tick(), ProgressDispatch::Idle));
        assert_eq!(fx.backend.update_calls(), 0);
        assert_eq!(
            fx.store.last_watched(&CourseId::new("c1")),
            Some(VideoId::new("video3"))
        );
    }

    #[tokio::test]
    async fn ended_sends_without_waiting() {
        let fx = fixture(2);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();

        let dispatch = session.on_ended();
        assert!(dispatch.is_sent());
        dispatch.finished().await.unwrap();
        assert_eq!(fx.backend.update_calls(), 1);
    }

    #[tokio::test]
    async fn out_of_range_selection_is_rejected() {
        let fx = fixture(2);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();

        let err = session.select_video(5).unwrap_err();
        assert!(matches!(err, ViewerError::VideoOutOfRange { index: 5, len: 2 }));
        assert_eq!(session.playback().active_video_index(), 0);
    }

    #[tokio::test]
    async fn refresh_reflects_saved_completion_and_keeps_position() {
        let fx = fixture(4);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();
        session.select_video(1).unwrap();
        session.on_time_update(30.0, 60.0);
        session.on_ended().finished().await.unwrap();

        fx.service.refresh(&mut session).await.unwrap();

        assert_eq!(
            session.view().status_of(&VideoId::new("video2")),
            VideoStatus::Completed
        );
        assert!((session.view().progress_percentage - 25.0).abs() < 1e-9);
        assert_eq!(session.playback().active_video_index(), 1);
        assert!((session.playback().current_time_seconds() - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn reopening_resumes_at_last_watched_video() {
        let fx = fixture(4);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();
        session.select_video(2).unwrap();
        session.on_ended().finished().await.unwrap();
        drop(session);

        let session = fx.service.open(&CourseId::new("c1")).await.unwrap();
        assert_eq!(session.playback().active_video_index(), 2);
        assert_eq!(session.view().resume_source, ResumeSource::Server);
    }

    #[tokio::test]
    async fn unknown_course_notifies_and_errors() {
        let fx = fixture(1);
        let Err(err) = fx.service.open(&CourseId::new("missing")).await else {
            panic!("unknown course should not open");
        };

        assert!(matches!(err, ViewerError::Api(_)));
        assert_eq!(
            fx.notifier.drain(),
            vec![Notification::error(COURSE_NOT_LOADED)]
        );
    }

    #[tokio::test]
    async fn refresh_drops_pending_completion_for_removed_video() {
        let fx = fixture(2);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();
        session.on_time_update(55.0, 60.0);
        assert!(session.next_deadline().is_some());

        fx.backend.upsert_course(course(0)).unwrap();
        fx.service.refresh(&mut session).await.unwrap();
        fx.clock.advance(Duration::seconds(2));

        assert!(session.active_video().is_none());
        assert_eq!(session.next_deadline(), None);
        assert!(matches!(session.tick(), ProgressDispatch::Idle));
        assert!(matches!(session.on_ended(), ProgressDispatch::Idle));
        assert_eq!(fx.backend.update_calls(), 0);
        assert!(fx.notifier.is_empty());
    }

    #[tokio::test]
    async fn refresh_moves_to_first_video_when_active_one_is_removed() {
        let fx = fixture(3);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();
        session.select_video(2).unwrap();
        session.on_time_update(58.0, 60.0);

        fx.backend.upsert_course(course(2)).unwrap();
        fx.service.refresh(&mut session).await.unwrap();
        fx.clock.advance(Duration::seconds(2));

        assert_eq!(session.playback().active_video_index(), 0);
        assert!(matches!(session.tick(), ProgressDispatch::Idle));
        let dispatch = session.on_ended();
        assert!(dispatch.is_sent());
        dispatch.finished().await.unwrap();
        let progress = fx.backend.progress(&CourseId::new("c1")).unwrap().unwrap();
        assert!(progress.is_video_completed(&VideoId::new("video1")));
        assert!(fx.notifier.is_empty());
    }

    #[tokio::test]
    async fn refresh_of_previously_empty_course_tracks_first_video() {
        let fx = fixture(0);
        let mut session = fx.service.open(&CourseId::new("c1")).await.unwrap();
        assert!(session.active_video().is_none());

        fx.backend.upsert_course(course(2)).unwrap();
        fx.service.refresh(&mut session).await.unwrap();

        assert_eq!(session.active_video().unwrap().id, VideoId::new("video1"));
        let dispatch = session.on_ended();
        assert!(dispatch.is_sent());
        dispatch.finished().await.unwrap();
        assert_eq!(fx.backend.update_calls(), 1);
    }
}
