//! Error types for lexicard operations.
//!
//! Every error carries a structured [`ErrorCode`] so that callers (chat
//! handlers, the scheduler loop) can decide how to react without matching on
//! message text.

use thiserror::Error;

/// Result type alias for lexicard operations.
pub type LexicardResult<T> = Result<T, LexicardError>;

/// Main error type for all lexicard operations.
#[derive(Error, Debug)]
pub enum LexicardError {
    /// Card or learner not found.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        entity_id: Option<i64>,
    },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// Storage operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Message delivery failed.
    #[error("Notification error: {message}")]
    Notification {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Cards (CARD_xxx)
    CardNotFound,
    CardCorrupted,

    // Learners (LRN_xxx)
    LearnerNotFound,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValOutOfRange,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,

    // Notification (NTF_xxx)
    NtfDeliveryFailed,
    NtfRejected,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CardNotFound => "CARD_001",
            ErrorCode::CardCorrupted => "CARD_002",
            ErrorCode::LearnerNotFound => "LRN_001",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValOutOfRange => "VAL_002",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::NtfDeliveryFailed => "NTF_001",
            ErrorCode::NtfRejected => "NTF_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl LexicardError {
    /// Create a card-not-found error.
    pub fn card_not_found(card_id: i64) -> Self {
        Self::NotFound {
            message: format!("Card with id '{}' not found", card_id),
            code: ErrorCode::CardNotFound,
            entity_id: Some(card_id),
        }
    }

    /// Create a learner-not-found error.
    pub fn learner_not_found(learner_id: i64) -> Self {
        Self::NotFound {
            message: format!("Learner with id '{}' not found", learner_id),
            code: ErrorCode::LearnerNotFound,
            entity_id: Some(learner_id),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a validation error for a value outside its allowed range.
    pub fn out_of_range(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValOutOfRange,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create an error for a database that cannot be opened or reached.
    pub fn database_connection(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbConnectionFailed,
            source: None,
        }
    }

    /// Create an error for a stored card row that cannot be decoded.
    pub fn card_corrupted(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::CardCorrupted,
            source: None,
        }
    }

    /// Create a notification delivery error.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification {
            message: message.into(),
            code: ErrorCode::NtfDeliveryFailed,
            source: None,
        }
    }

    /// Create a notification error the transport will not accept on retry.
    pub fn notification_rejected(message: impl Into<String>) -> Self {
        Self::Notification {
            message: message.into(),
            code: ErrorCode::NtfRejected,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Notification { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// The scheduler loop retries every learner on the next tick regardless;
    /// this is reported alongside per-learner failures.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::DbConnectionFailed | ErrorCode::DbOperationFailed | ErrorCode::NtfDeliveryFailed
        ) || matches!(self, Self::Io(_))
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::NotFound { .. } => Some("The card may have been deleted; request a new one"),
            Self::Database {
                code: ErrorCode::CardCorrupted,
                ..
            } => Some("The stored card is unreadable; delete and re-add it"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Database { .. } => Some("Please check the database path and permissions"),
            Self::Notification { .. } => Some("Please check the notifier endpoint configuration"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for LexicardError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::CannotOpen) | Some(rusqlite::ErrorCode::NotADatabase) => {
                ErrorCode::DbConnectionFailed
            }
            _ => ErrorCode::DbOperationFailed,
        };
        Self::Database {
            message: err.to_string(),
            code,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_not_found_error() {
        let err = LexicardError::card_not_found(42);
        assert_eq!(err.code(), ErrorCode::CardNotFound);
        assert!(err.to_string().contains("42"));
        assert!(err.suggestion().is_some());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_out_of_range_carries_suggestion() {
        let err = LexicardError::out_of_range("interval is 0", "use at least 1 minute");
        assert_eq!(err.code(), ErrorCode::ValOutOfRange);
        assert_eq!(err.suggestion(), Some("use at least 1 minute"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(LexicardError::database("locked").is_transient());
        assert!(LexicardError::notification("timeout").is_transient());
        assert!(!LexicardError::notification_rejected("bad chat").is_transient());
        assert!(!LexicardError::Configuration("bad".into()).is_transient());
    }

    #[test]
    fn test_sqlite_open_failure_is_connection_error() {
        let err: LexicardError = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            None,
        )
        .into();
        assert_eq!(err.code(), ErrorCode::DbConnectionFailed);
        assert!(err.is_transient());

        let err: LexicardError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.code(), ErrorCode::DbOperationFailed);
    }

    #[test]
    fn test_card_corrupted_is_permanent() {
        let err = LexicardError::card_corrupted("bad created_at");
        assert_eq!(err.code(), ErrorCode::CardCorrupted);
        assert!(!err.is_transient());
        assert!(err.suggestion().unwrap().contains("re-add"));
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::CardNotFound.as_str(), "CARD_001");
        assert_eq!(ErrorCode::DbOperationFailed.as_str(), "DB_002");
        assert_eq!(ErrorCode::NtfRejected.as_str(), "NTF_002");
    }
}
