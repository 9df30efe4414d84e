#![forbid(unsafe_code)]

pub mod api;
pub mod http;
pub mod memory;

pub use api::{ApiError, Backend, CourseApi, CourseViewerPayload};
pub use http::{HttpConfig, HttpCourseApi};
pub use memory::InMemoryBackend;
