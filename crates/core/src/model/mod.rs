mod course;
mod ids;
mod playback;
mod progress;
mod video;

pub use ids::{CourseId, ParseIdError, StudentId, VideoId};

pub use course::{Course, CourseError};
pub use playback::PlaybackSession;
pub use progress::{CourseProgress, EnrollmentBucket};
pub use video::VideoUnit;
