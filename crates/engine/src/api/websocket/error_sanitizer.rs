//! Error sanitization for client-facing messages.
//!
//! Prevents leaking internal details (paths, DB errors, stack traces) to clients.

use std::fmt::Display;

use farmstead_shared::ErrorCode;

use crate::use_cases::ErrorKind;

/// Sanitize a repository error.
pub fn sanitize_repo_error<E: Display>(error: &E, operation: &str) -> String {
    tracing::error!(
        error = %error,
        operation = operation,
        "Repository error"
    );

    format!("Failed to {} - please try again", operation)
}

/// Wire code for an error kind.
pub fn error_code(kind: ErrorKind) -> ErrorCode {
    match kind {
        ErrorKind::Validation => ErrorCode::ValidationError,
        ErrorKind::NotFound => ErrorCode::NotFound,
        ErrorKind::Conflict => ErrorCode::Conflict,
        ErrorKind::InsufficientResource => ErrorCode::InsufficientResource,
        ErrorKind::Inconsistency => ErrorCode::Inconsistency,
        ErrorKind::Internal => ErrorCode::InternalError,
    }
}

/// Client message for a classified use-case error.
///
/// Internal errors are logged and replaced; everything else is already
/// phrased for the caller.
pub fn client_message<E: Display>(kind: ErrorKind, error: &E, operation: &str) -> String {
    match kind {
        ErrorKind::Internal => sanitize_repo_error(error, operation),
        _ => error.to_string(),
    }
}

/// Common error messages for client consumption.
pub mod messages {
    pub const UNKNOWN_EVENT: &str = "Unknown event";
    pub const MISSING_USER: &str = "Missing or invalid X-User-Id header";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_replaced() {
        let msg = client_message(
            ErrorKind::Internal,
            &"connection refused at 10.0.0.3:27017",
            "plant crops",
        );
        assert_eq!(msg, "Failed to plant crops - please try again");
        assert!(!msg.contains("27017"));
    }

    #[test]
    fn client_errors_pass_through() {
        let msg = client_message(ErrorKind::NotFound, &"Map not found: abc", "load map");
        assert_eq!(msg, "Map not found: abc");
        assert_eq!(error_code(ErrorKind::InsufficientResource), ErrorCode::InsufficientResource);
    }
}
