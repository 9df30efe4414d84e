//! Process-wide client state behind an explicit handle.
//!
//! Views receive an `AppStore` clone from the composition root and mutate it
//! only through `Action`s; nothing reaches for a global.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use course_core::model::{CourseId, StudentId, VideoId};
use tracing::debug;

/// The signed-in student as reported by the external auth service.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub student_id: StudentId,
    pub token: String,
}

impl fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionInfo")
            .field("student_id", &self.student_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub session: Option<SessionInfo>,
    pub cart: Vec<CourseId>,
    pub last_watched: HashMap<CourseId, VideoId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SignedIn(SessionInfo),
    SignedOut,
    CartAdded(CourseId),
    CartRemoved(CourseId),
    CartCleared,
    VideoWatched { course_id: CourseId, video_id: VideoId },
}

/// Apply one action. Signing out forgets everything tied to the student.
pub fn reduce(state: &mut StoreState, action: Action) {
    match action {
        Action::SignedIn(session) => {
            if state
                .session
                .as_ref()
                .is_some_and(|current| current.student_id != session.student_id)
            {
                *state = StoreState::default();
            }
            state.session = Some(session);
        }
        Action::SignedOut => *state = StoreState::default(),
        Action::CartAdded(course_id) => {
            if !state.cart.contains(&course_id) {
                state.cart.push(course_id);
            }
        }
        Action::CartRemoved(course_id) => state.cart.retain(|id| id != &course_id),
        Action::CartCleared => state.cart.clear(),
        Action::VideoWatched {
            course_id,
            video_id,
        } => {
            state.last_watched.insert(course_id, video_id);
        }
    }
}

#[derive(Clone, Default)]
pub struct AppStore {
    state: Arc<RwLock<StoreState>>,
}

impl AppStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, action: Action) {
        debug!(?action, "store dispatch");
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        reduce(&mut *guard, action);
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.read(StoreState::clone)
    }

    #[must_use]
    pub fn current_student(&self) -> Option<StudentId> {
        self.read(|state| state.session.as_ref().map(|s| s.student_id.clone()))
    }

    #[must_use]
    pub fn last_watched(&self, course_id: &CourseId) -> Option<VideoId> {
        self.read(|state| state.last_watched.get(course_id).cloned())
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        match self.state.read() {
            Ok(guard) => f(&*guard),
            Err(poisoned) => f(&*poisoned.into_inner()),
        }
    }
}
