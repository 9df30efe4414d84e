use std::sync::Arc;

use backend::{Backend, HttpConfig, HttpCourseApi};
use course_core::{Clock, TrackerConfig};
use tracing::debug;

use crate::config::ClientConfig;
use crate::dashboard::DashboardService;
use crate::notify::Notifier;
use crate::store::{Action, AppStore, SessionInfo};
use crate::viewer::CourseViewerService;

/// Assembles the client-facing services around one backend.
#[derive(Clone)]
pub struct AppServices {
    store: AppStore,
    viewer: Arc<CourseViewerService>,
    dashboard: Arc<DashboardService>,
}

impl AppServices {
    #[must_use]
    pub fn new(
        backend: &Backend,
        clock: Clock,
        notifier: Arc<dyn Notifier>,
        tracker: TrackerConfig,
    ) -> Self {
        let store = AppStore::new();
        let viewer = CourseViewerService::new(
            clock,
            Arc::clone(&backend.courses),
            Arc::clone(&notifier),
            store.clone(),
        )
        .with_tracker_config(tracker);
        let dashboard = DashboardService::new(Arc::clone(&backend.courses), notifier);

        Self {
            store,
            viewer: Arc::new(viewer),
            dashboard: Arc::new(dashboard),
        }
    }

    /// Build services talking to the REST backend named in `config`.
    ///
    /// A configured student with a token starts signed in.
    #[must_use]
    pub fn from_config(config: &ClientConfig, clock: Clock, notifier: Arc<dyn Notifier>) -> Self {
        let api = HttpCourseApi::new(HttpConfig {
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
        });
        let services = Self::new(
            &Backend::new(Arc::new(api)),
            clock,
            notifier,
            config.tracker,
        );

        if let (Some(student_id), Some(token)) = (&config.student_id, &config.api_token) {
            debug!(student_id = %student_id, "starting signed in");
            services.store.dispatch(Action::SignedIn(SessionInfo {
                student_id: student_id.clone(),
                token: token.clone(),
            }));
        }
        services
    }

    #[must_use]
    pub fn store(&self) -> AppStore {
        self.store.clone()
    }

    #[must_use]
    pub fn viewer(&self) -> Arc<CourseViewerService> {
        Arc::clone(&self.viewer)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}
