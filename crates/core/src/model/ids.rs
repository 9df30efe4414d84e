use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot be blank", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// Backend ids are opaque strings; we never inspect their shape beyond "non-blank".
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self::new(trimmed))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a Course
    CourseId
);

string_id!(
    /// Unique identifier for a video unit within a course
    VideoId
);

string_id!(
    /// Unique identifier for a Student
    StudentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_display_is_raw_value() {
        let id = VideoId::new("65f1c0ffee");
        assert_eq!(id.to_string(), "65f1c0ffee");
        assert_eq!(format!("{id:?}"), "VideoId(65f1c0ffee)");
    }

    #[test]
    fn course_id_from_str_trims() {
        let id: CourseId = "  c-42 ".parse().unwrap();
        assert_eq!(id, CourseId::new("c-42"));
    }

    #[test]
    fn blank_ids_are_rejected() {
        let err = "   ".parse::<StudentId>().unwrap_err();
        assert_eq!(err.to_string(), "StudentId cannot be blank");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&VideoId::new("v1")).unwrap();
        assert_eq!(json, "\"v1\"");
        let back: VideoId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "v1");
    }
}
