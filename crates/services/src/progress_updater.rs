use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use backend::{ApiError, CourseApi};
use course_core::CompletionSignal;
use course_core::model::{CourseId, CourseProgress, VideoId};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notify::{Notification, Notifier};

pub const PROGRESS_NOT_SAVED: &str = "Your progress for this video could not be saved.";

/// Result of one progress-update request.
#[derive(Debug)]
pub enum UpdateOutcome {
    Saved(Option<CourseProgress>),
    Failed(ApiError),
}

/// What happened to a completion signal handed to the updater.
#[derive(Debug)]
pub enum ProgressDispatch {
    /// No completion this time.
    Idle,
    /// A request is on its way; the handle resolves when it settles.
    Sent {
        video_id: VideoId,
        handle: JoinHandle<UpdateOutcome>,
    },
    /// A request for the same video was still outstanding.
    Dropped { video_id: VideoId },
}

impl ProgressDispatch {
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, ProgressDispatch::Sent { .. })
    }

    #[must_use]
    pub fn is_dropped(&self) -> bool {
        matches!(self, ProgressDispatch::Dropped { .. })
    }

    /// Wait for a sent request to settle. `None` unless the dispatch was sent.
    pub async fn finished(self) -> Option<UpdateOutcome> {
        match self {
            ProgressDispatch::Sent { handle, .. } => handle.await.ok(),
            _ => None,
        }
    }
}

/// Fire-and-forget progress writes with an in-flight guard per video.
///
/// Each request runs as its own task. The caller keeps nothing but the guard,
/// so a response landing after the viewer is gone has nothing to touch.
#[derive(Clone)]
pub struct ProgressUpdater {
    api: Arc<dyn CourseApi>,
    notifier: Arc<dyn Notifier>,
    in_flight: Arc<Mutex<HashSet<VideoId>>>,
}

impl ProgressUpdater {
    #[must_use]
    pub fn new(api: Arc<dyn CourseApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    #[must_use]
    pub fn is_updating(&self, video_id: &VideoId) -> bool {
        lock(&self.in_flight).contains(video_id)
    }

    #[must_use]
    pub fn is_updating_any(&self) -> bool {
        !lock(&self.in_flight).is_empty()
    }

    /// Send one update for the signalled video unless one is already outstanding.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, course_id: &CourseId, signal: CompletionSignal) -> ProgressDispatch {
        let video_id = signal.video_id;
        let Some(guard) = InFlight::acquire(&self.in_flight, &video_id) else {
            debug!(
                course_id = %course_id,
                video_id = %video_id,
                "update already in flight, dropping"
            );
            return ProgressDispatch::Dropped { video_id };
        };

        info!(
            course_id = %course_id,
            video_id = %video_id,
            cause = ?signal.cause,
            "sending progress update"
        );
        let api = Arc::clone(&self.api);
        let notifier = Arc::clone(&self.notifier);
        let course_id = course_id.clone();
        let task_video = video_id.clone();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            match api.update_course_progress(&course_id, &task_video).await {
                Ok(progress) => UpdateOutcome::Saved(progress),
                Err(err) => {
                    warn!(
                        course_id = %course_id,
                        video_id = %task_video,
                        error = %err,
                        "progress update failed"
                    );
                    notifier.notify(Notification::error(PROGRESS_NOT_SAVED));
                    UpdateOutcome::Failed(err)
                }
            }
        });

        ProgressDispatch::Sent { video_id, handle }
    }
}

/// Marks a video as in flight until dropped.
struct InFlight {
    set: Arc<Mutex<HashSet<VideoId>>>,
    video_id: VideoId,
}

impl InFlight {
    fn acquire(set: &Arc<Mutex<HashSet<VideoId>>>, video_id: &VideoId) -> Option<Self> {
        if !lock(set).insert(video_id.clone()) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            video_id: video_id.clone(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock(&self.set).remove(&self.video_id);
    }
}

fn lock(set: &Mutex<HashSet<VideoId>>) -> MutexGuard<'_, HashSet<VideoId>> {
    match set.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
