use std::sync::Arc;

use backend::CourseApi;
use course_core::model::{CourseProgress, EnrollmentBucket};
use course_core::{EnrollmentBuckets, EnrollmentClassifier};
use tracing::{debug, instrument, warn};

use crate::error::DashboardError;
use crate::notify::{Notification, Notifier};

pub const DASHBOARD_NOT_LOADED: &str = "Your courses could not be loaded. Please try again.";

/// One filter tab on the learner dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardTab {
    pub bucket: EnrollmentBucket,
    pub label: &'static str,
    pub count: usize,
}

/// Enrolled courses grouped for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub buckets: EnrollmentBuckets,
}

impl Dashboard {
    #[must_use]
    pub fn from_records(records: &[CourseProgress]) -> Self {
        Self {
            buckets: EnrollmentClassifier::partition(records),
        }
    }

    /// Tabs in display order with their badge counts.
    #[must_use]
    pub fn tabs(&self) -> Vec<DashboardTab> {
        EnrollmentBucket::ALL
            .into_iter()
            .map(|bucket| DashboardTab {
                bucket,
                label: bucket.label(),
                count: self.buckets.count(bucket),
            })
            .collect()
    }

    #[must_use]
    pub fn courses(&self, bucket: EnrollmentBucket) -> &[CourseProgress] {
        self.buckets.get(bucket)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.total() == 0
    }
}

#[derive(Clone)]
pub struct DashboardService {
    api: Arc<dyn CourseApi>,
    notifier: Arc<dyn Notifier>,
}

impl DashboardService {
    #[must_use]
    pub fn new(api: Arc<dyn CourseApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Fetch every enrollment and bucket it.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Api` if the fetch fails; the learner has
    /// already been notified.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Dashboard, DashboardError> {
        let records = match self.api.fetch_all_course_progress().await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "dashboard fetch failed");
                self.notifier.notify(Notification::error(DASHBOARD_NOT_LOADED));
                return Err(err.into());
            }
        };

        let dashboard = Dashboard::from_records(&records);
        debug!(
            not_started = dashboard.buckets.not_started.len(),
            in_progress = dashboard.buckets.in_progress.len(),
            completed = dashboard.buckets.completed.len(),
            "dashboard loaded"
        );
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use backend::{ApiError, CourseViewerPayload};
    use course_core::model::{CourseId, StudentId, VideoId};

    use crate::notify::QueueNotifier;

    struct DownApi;

    #[async_trait]
    impl CourseApi for DownApi {
        async fn fetch_course_viewer(
            &self,
            _course_id: &CourseId,
        ) -> Result<CourseViewerPayload, ApiError> {
            Err(ApiError::Unavailable("offline".into()))
        }

        async fn update_course_progress(
            &self,
            _course_id: &CourseId,
            _video_id: &VideoId,
        ) -> Result<Option<CourseProgress>, ApiError> {
            Err(ApiError::Unavailable("offline".into()))
        }

        async fn fetch_all_course_progress(&self) -> Result<Vec<CourseProgress>, ApiError> {
            Err(ApiError::Unavailable("offline".into()))
        }
    }

    fn record(course: &str, total: u32, percentage: f64, done: bool) -> CourseProgress {
        let mut progress =
            CourseProgress::enrolled(StudentId::new("s1"), CourseId::new(course), total);
        progress.progress_percentage = percentage;
        progress.is_completed = done;
        progress
    }

    #[test]
    fn tabs_follow_bucket_order_with_counts() {
        let dashboard = Dashboard::from_records(&[
            record("a", 4, 0.0, false),
            record("b", 4, 50.0, false),
            record("c", 4, 100.0, true),
            record("d", 0, 0.0, false),
        ]);

        let tabs = dashboard.tabs();
        let summary: Vec<_> = tabs.iter().map(|tab| (tab.label, tab.count)).collect();
        assert_eq!(
            summary,
            [("Not Started", 2), ("In Progress", 1), ("Completed", 1)]
        );
        assert_eq!(
            dashboard.courses(EnrollmentBucket::NotStarted)[1].course_id,
            CourseId::new("d")
        );
    }

    #[tokio::test]
    async fn failed_load_notifies() {
        let notifier = Arc::new(QueueNotifier::new());
        let service = DashboardService::new(Arc::new(DownApi), notifier.clone());

        let err = service.load().await.unwrap_err();

        assert!(matches!(err, DashboardError::Api(ApiError::Unavailable(_))));
        assert_eq!(
            notifier.drain(),
            vec![Notification::error(DASHBOARD_NOT_LOADED)]
        );
    }
}
