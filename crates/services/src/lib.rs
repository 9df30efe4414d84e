#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod progress_updater;
pub mod store;
pub mod viewer;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use config::ClientConfig;
pub use dashboard::{Dashboard, DashboardService, DashboardTab};
pub use error::{ConfigError, DashboardError, ViewerError};
pub use notify::{Notification, NotificationLevel, Notifier, QueueNotifier, TracingNotifier};
pub use progress_updater::{ProgressDispatch, ProgressUpdater, UpdateOutcome};
pub use store::{Action, AppStore, SessionInfo, StoreState};
pub use viewer::{CourseViewerService, ViewerSession};
