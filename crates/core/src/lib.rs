#![forbid(unsafe_code)]

pub mod classifier;
pub mod model;
pub mod reconciler;
pub mod time;
pub mod tracker;

pub use classifier::{EnrollmentBuckets, EnrollmentClassifier, classify};
pub use reconciler::{CourseStateReconciler, CourseViewState, ResumeSource, VideoStatus};
pub use time::Clock;
pub use tracker::{
    CompletionCause, CompletionSignal, ProgressTracker, TrackerConfig, TrackerConfigError,
    TrackerState,
};
