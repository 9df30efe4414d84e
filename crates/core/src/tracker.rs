use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::VideoId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum TrackerConfigError {
    #[error("completion threshold must be in (0, 1], got {provided}")]
    InvalidThreshold { provided: f64 },
    #[error("debounce window must be non-negative")]
    NegativeDebounce,
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Tuning for when a video counts as watched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    completion_threshold: f64,
    debounce: Duration,
}

impl TrackerConfig {
    pub const DEFAULT_THRESHOLD: f64 = 0.9;
    pub const DEFAULT_DEBOUNCE_MS: i64 = 1_000;

    /// # Errors
    ///
    /// Returns `TrackerConfigError` if the threshold is outside `(0, 1]` or the
    /// debounce window is negative.
    pub fn new(completion_threshold: f64, debounce: Duration) -> Result<Self, TrackerConfigError> {
        if !(completion_threshold > 0.0 && completion_threshold <= 1.0) {
            return Err(TrackerConfigError::InvalidThreshold {
                provided: completion_threshold,
            });
        }
        if debounce < Duration::zero() {
            return Err(TrackerConfigError::NegativeDebounce);
        }
        Ok(Self {
            completion_threshold,
            debounce,
        })
    }

    #[must_use]
    pub fn completion_threshold(&self) -> f64 {
        self.completion_threshold
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            completion_threshold: Self::DEFAULT_THRESHOLD,
            debounce: Duration::milliseconds(Self::DEFAULT_DEBOUNCE_MS),
        }
    }
}

//
// ─── SIGNALS & STATES ──────────────────────────────────────────────────────────
//

/// What caused a completion to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCause {
    /// Playback crossed the threshold and the debounce window elapsed.
    Threshold,
    /// The media element reported the end of playback.
    Ended,
}

/// A single "this video is done" signal, emitted at most once per video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    pub video_id: VideoId,
    pub cause: CompletionCause,
    pub emitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    PendingEmission {
        video_id: VideoId,
        deadline: DateTime<Utc>,
    },
    Emitted {
        video_id: VideoId,
    },
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Turns playback telemetry into completion signals.
///
/// The tracker never reads a clock: every transition takes `now`, so timing
/// races are reproduced by choosing timestamps. Hosts call [`poll`] when the
/// pending deadline ([`next_deadline`]) is reached.
///
/// Completion is monotonic for the lifetime of the tracker: once a video has
/// emitted, seeking backward or replaying never emits again.
///
/// [`poll`]: ProgressTracker::poll
/// [`next_deadline`]: ProgressTracker::next_deadline
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    config: TrackerConfig,
    active: Option<VideoId>,
    state: TrackerState,
    emitted: HashSet<VideoId>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            active: None,
            state: TrackerState::Idle,
            emitted: HashSet::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    #[must_use]
    pub fn active_video(&self) -> Option<&VideoId> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn has_emitted(&self, video_id: &VideoId) -> bool {
        self.emitted.contains(video_id)
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            TrackerState::PendingEmission { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// Make `video_id` the active video.
    ///
    /// Returns the id of a video whose pending emission was cancelled by the
    /// switch. Re-selecting the active video is a no-op.
    pub fn select_video(&mut self, video_id: VideoId) -> Option<VideoId> {
        if self.active.as_ref() == Some(&video_id) {
            return None;
        }

        let cancelled = match std::mem::replace(&mut self.state, TrackerState::Idle) {
            TrackerState::PendingEmission { video_id, .. } => Some(video_id),
            _ => None,
        };

        if self.emitted.contains(&video_id) {
            self.state = TrackerState::Emitted {
                video_id: video_id.clone(),
            };
        }
        self.active = Some(video_id);
        cancelled
    }

    /// Forget the active video, cancelling any pending emission for it.
    ///
    /// Returns the id whose pending emission was cancelled. Samples and
    /// `ended` events are ignored until another video is selected.
    pub fn clear_active(&mut self) -> Option<VideoId> {
        self.active = None;
        match std::mem::replace(&mut self.state, TrackerState::Idle) {
            TrackerState::PendingEmission { video_id, .. } => Some(video_id),
            _ => None,
        }
    }

    /// Feed a `(current_time, duration)` sample for the active video.
    ///
    /// Samples with a non-positive or non-finite duration never cross the
    /// threshold; the `ended` event covers those videos. A sample arriving
    /// after an elapsed deadline flushes that emission first.
    pub fn on_sample(
        &mut self,
        current_time_seconds: f64,
        duration_seconds: f64,
        now: DateTime<Utc>,
    ) -> Option<CompletionSignal> {
        if let Some(signal) = self.poll(now) {
            return Some(signal);
        }

        let active = self.active.clone()?;
        if !matches!(self.state, TrackerState::Idle) {
            return None;
        }

        if !crosses_threshold(
            current_time_seconds,
            duration_seconds,
            self.config.completion_threshold,
        ) {
            return None;
        }

        let deadline = now + self.config.debounce;
        self.state = TrackerState::PendingEmission {
            video_id: active,
            deadline,
        };
        self.poll(now)
    }

    /// The media element finished playing the active video.
    ///
    /// Emits immediately, flushing any pending debounce, unless the video has
    /// already emitted during this session.
    pub fn on_ended(&mut self, now: DateTime<Utc>) -> Option<CompletionSignal> {
        let active = self.active.clone()?;
        if self.emitted.contains(&active) {
            return None;
        }
        Some(self.emit(active, CompletionCause::Ended, now))
    }

    /// Fire the pending emission if its deadline has passed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<CompletionSignal> {
        let TrackerState::PendingEmission { video_id, deadline } = &self.state else {
            return None;
        };
        if now < *deadline {
            return None;
        }
        let video_id = video_id.clone();
        Some(self.emit(video_id, CompletionCause::Threshold, now))
    }

    fn emit(
        &mut self,
        video_id: VideoId,
        cause: CompletionCause,
        now: DateTime<Utc>,
    ) -> CompletionSignal {
        self.emitted.insert(video_id.clone());
        self.state = TrackerState::Emitted {
            video_id: video_id.clone(),
        };
        CompletionSignal {
            video_id,
            cause,
            emitted_at: now,
        }
    }
}

fn crosses_threshold(current: f64, duration: f64, threshold: f64) -> bool {
    if !duration.is_finite() || duration <= 0.0 || !current.is_finite() {
        return false;
    }
    current / duration >= threshold
}
