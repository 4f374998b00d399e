//! Error types for the redressal service.
//!
//! All errors are explicitly typed using thiserror. No panics in production code.

use thiserror::Error;

/// Central error type for all redressal operations.
#[derive(Debug, Error)]
pub enum RedressalError {
    /// A complaint or admin id did not resolve to a record.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Forward target is already at its maximum caseload.
    #[error("Admin {admin_id} is at maximum capacity")]
    CapacityExceeded {
        /// The admin that could not accept the complaint.
        admin_id: String,
    },

    /// Every selection tier was exhausted without finding an eligible admin.
    #[error("No available admin found for assignment")]
    NoCandidateAvailable,

    /// Caller-supplied data failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Could not generate an unused tracking token within the retry budget.
    #[error("Failed to generate a unique tracking token")]
    TokenExhausted,

    /// Configuration error (missing env vars, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RedressalError {
    /// Log error with full context using tracing.
    ///
    /// Rejected operations (not-found, capacity, no candidate) are expected
    /// outcomes and log as warnings; everything else is an error.
    pub fn log_with_context(&self, context: &ErrorContext) {
        match self {
            Self::NotFound(_)
            | Self::CapacityExceeded { .. }
            | Self::NoCandidateAvailable
            | Self::InvalidInput(_) => {
                tracing::warn!(
                    error = %self,
                    request_id = %context.request_id,
                    complaint_id = ?context.complaint_id,
                    admin_id = ?context.admin_id,
                    operation = %context.operation,
                    "Operation rejected"
                );
            }
            Self::Config(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    "Configuration error"
                );
            }
            Self::Database(_) | Self::Json(_) | Self::TokenExhausted => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    complaint_id = ?context.complaint_id,
                    admin_id = ?context.admin_id,
                    operation = %context.operation,
                    "Critical error occurred"
                );
            }
        }
    }

    /// Check if this error is critical and requires alerting.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Json(_) | Self::Config(_) | Self::TokenExhausted
        )
    }

    /// Whether this is a rejection the caller can act on, as opposed to an
    /// internal fault.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::CapacityExceeded { .. }
                | Self::NoCandidateAvailable
                | Self::InvalidInput(_)
        )
    }

    /// Get user-friendly error message (hides internal details).
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "The requested record was not found",
            Self::CapacityExceeded { .. } => "Target admin is at maximum capacity",
            Self::NoCandidateAvailable => "No available admin found for assignment",
            Self::InvalidInput(_) => "The request was invalid",
            Self::Config(_) => "Service configuration error",
            Self::Database(_) => "Database service temporarily unavailable",
            Self::Json(_) => "Data format error",
            Self::TokenExhausted => "Could not allocate a tracking token, please retry",
        }
    }
}

/// Context information for error logging.
///
/// Provides structured context for debugging and monitoring.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Unique request identifier for correlation.
    pub request_id: String,
    /// Complaint ID if available.
    pub complaint_id: Option<String>,
    /// Admin ID if available.
    pub admin_id: Option<String>,
    /// Operation being performed.
    pub operation: String,
}

impl ErrorContext {
    /// Create a new error context.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            complaint_id: None,
            admin_id: None,
            operation: operation.into(),
        }
    }

    /// Set complaint ID.
    pub fn with_complaint_id(mut self, complaint_id: impl Into<String>) -> Self {
        self.complaint_id = Some(complaint_id.into());
        self
    }

    /// Set admin ID.
    pub fn with_admin_id(mut self, admin_id: impl Into<String>) -> Self {
        self.admin_id = Some(admin_id.into());
        self
    }
}

/// Result type alias for redressal operations.
pub type Result<T> = std::result::Result<T, RedressalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_not_found() {
        let err = RedressalError::NotFound("Complaint not found".to_string());
        assert_eq!(err.to_string(), "Not found: Complaint not found");
    }

    #[test]
    fn error_display_capacity_exceeded() {
        let err = RedressalError::CapacityExceeded {
            admin_id: "adm-1".to_string(),
        };
        assert_eq!(err.to_string(), "Admin adm-1 is at maximum capacity");
    }

    #[test]
    fn error_display_config() {
        let err = RedressalError::Config("DATABASE_PATH not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: DATABASE_PATH not set"
        );
    }

    #[test]
    fn error_is_critical() {
        assert!(RedressalError::Database("test".to_string()).is_critical());
        assert!(RedressalError::Config("test".to_string()).is_critical());
        assert!(!RedressalError::NoCandidateAvailable.is_critical());
        assert!(!RedressalError::NotFound("test".to_string()).is_critical());
    }

    #[test]
    fn rejections_are_not_critical() {
        let rejections = [
            RedressalError::NotFound("x".to_string()),
            RedressalError::CapacityExceeded {
                admin_id: "a".to_string(),
            },
            RedressalError::NoCandidateAvailable,
            RedressalError::InvalidInput("bad".to_string()),
        ];
        for err in rejections {
            assert!(err.is_rejection());
            assert!(!err.is_critical());
        }
    }

    #[test]
    fn error_user_message_hides_details() {
        let err = RedressalError::Database("SELECT * FROM admins".to_string());
        assert_eq!(
            err.user_message(),
            "Database service temporarily unavailable"
        );
        assert!(!err.user_message().contains("admins"));
    }

    #[test]
    fn error_context_builder() {
        let ctx = ErrorContext::new("assign_complaint")
            .with_complaint_id("cmp-1")
            .with_admin_id("adm-1");

        assert_eq!(ctx.operation, "assign_complaint");
        assert_eq!(ctx.complaint_id.as_deref(), Some("cmp-1"));
        assert_eq!(ctx.admin_id.as_deref(), Some("adm-1"));
    }

    #[test]
    fn error_context_generates_request_id() {
        let ctx1 = ErrorContext::new("op1");
        let ctx2 = ErrorContext::new("op2");

        // Request IDs should be unique
        assert_ne!(ctx1.request_id, ctx2.request_id);
        assert!(!ctx1.request_id.is_empty());
    }
}
