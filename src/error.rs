//! Unified error handling for the runsketch library.
//!
//! Every fallible operation in the crate returns [`Result`], so callers on
//! the mobile side only ever have one error type to map.

use thiserror::Error;

/// Unified error type for runsketch operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SketchError {
    /// A run must end strictly after it starts
    #[error("Run ends at {end_time} but starts at {start_time}, duration must be positive")]
    InvalidDuration { start_time: i64, end_time: i64 },

    /// Per-point timestamps are missing, misaligned or out of order
    #[error("Invalid timestamps: {message}")]
    InvalidTimestamps { message: String },

    /// Tournament fields violate an invariant
    #[error("Invalid tournament: {message}")]
    InvalidTournament { message: String },

    /// The user is not a member of the tournament or conversation
    #[error("User '{user_id}' is not a participant of '{group_id}'")]
    NotParticipant { group_id: String, user_id: String },

    /// A document or entry could not be found
    #[error("No '{key}' in {collection}")]
    NotFound { collection: String, key: String },

    /// Backing store failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Document could not be encoded or decoded
    #[error("Encoding error: {message}")]
    Encoding { message: String },
}

/// Result type alias for runsketch operations.
pub type Result<T> = std::result::Result<T, SketchError>;

impl From<rmp_serde::encode::Error> for SketchError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        SketchError::Encoding {
            message: err.to_string(),
        }
    }
}

impl From<rmp_serde::decode::Error> for SketchError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        SketchError::Encoding {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SketchError {
    fn from(err: serde_json::Error) -> Self {
        SketchError::Encoding {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "persistence")]
impl From<rusqlite::Error> for SketchError {
    fn from(err: rusqlite::Error) -> Self {
        SketchError::Storage {
            message: err.to_string(),
        }
    }
}

/// Extension trait for converting Option to SketchError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a not-found error.
    fn ok_or_not_found(self, collection: &str, key: &str) -> Result<T>;

    /// Convert Option to Result with an invalid-timestamps error.
    fn ok_or_invalid_timestamps(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, collection: &str, key: &str) -> Result<T> {
        self.ok_or_else(|| SketchError::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })
    }

    fn ok_or_invalid_timestamps(self, message: &str) -> Result<T> {
        self.ok_or_else(|| SketchError::InvalidTimestamps {
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SketchError::InvalidDuration {
            start_time: 100,
            end_time: 40,
        };
        assert!(err.to_string().contains("40"));
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_not_found("tournaments", "t-1");
        assert!(matches!(result, Err(SketchError::NotFound { .. })));

        let some = Some(3).ok_or_invalid_timestamps("unused");
        assert_eq!(some, Ok(3));
    }
}
