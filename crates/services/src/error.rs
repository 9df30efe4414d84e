//! Shared error types for the services crate.

use thiserror::Error;

use backend::ApiError;
use course_core::TrackerConfigError;

/// Errors emitted by the course viewer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ViewerError {
    #[error("video index {index} is out of range for a course with {len} videos")]
    VideoOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors raised while reading client configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid url {raw:?}: {source}")]
    InvalidUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} must be a number, got {raw:?}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error(transparent)]
    Tracker(#[from] TrackerConfigError),
}
