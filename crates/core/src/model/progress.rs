use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, StudentId, VideoId};

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Server-held aggregate of one student's completion state for one course.
///
/// The client treats this as a read-only snapshot: `progress_percentage` and
/// `is_completed` are computed by the backend and are never recomputed here.
/// A fresher view is obtained by fetching again, not by mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub student_id: StudentId,
    pub course_id: CourseId,
    #[serde(default)]
    pub completed_video_ids: BTreeSet<VideoId>,
    #[serde(default)]
    pub total_videos: u32,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watched_video_id: Option<VideoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl CourseProgress {
    /// A fresh enrollment with nothing watched yet.
    #[must_use]
    pub fn enrolled(student_id: StudentId, course_id: CourseId, total_videos: u32) -> Self {
        Self {
            student_id,
            course_id,
            completed_video_ids: BTreeSet::new(),
            total_videos,
            progress_percentage: 0.0,
            is_completed: false,
            last_watched_video_id: None,
            last_accessed_at: None,
        }
    }

    #[must_use]
    pub fn is_video_completed(&self, id: &VideoId) -> bool {
        self.completed_video_ids.contains(id)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_video_ids.len()
    }

    /// Dashboard bucket for this record.
    #[must_use]
    pub fn bucket(&self) -> EnrollmentBucket {
        crate::classifier::classify(self)
    }
}

//
// ─── ENROLLMENT BUCKET ─────────────────────────────────────────────────────────
//

/// Coarse dashboard label derived from a progress record. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnrollmentBucket {
    NotStarted,
    InProgress,
    Completed,
}

impl EnrollmentBucket {
    pub const ALL: [EnrollmentBucket; 3] = [
        EnrollmentBucket::NotStarted,
        EnrollmentBucket::InProgress,
        EnrollmentBucket::Completed,
    ];

    /// Tab label used by the dashboard.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EnrollmentBucket::NotStarted => "Not Started",
            EnrollmentBucket::InProgress => "In Progress",
            EnrollmentBucket::Completed => "Completed",
        }
    }
}
