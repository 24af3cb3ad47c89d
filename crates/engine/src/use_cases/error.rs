//! Error taxonomy shared by every use case.
//!
//! Each use-case error enum classifies itself into an [`ErrorKind`]; the API
//! layer turns kinds into status codes and wire error codes.

use std::fmt;

use crate::infrastructure::ports::RepoError;

/// Coarse classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    InsufficientResource,
    /// One store committed and another did not.
    Inconsistency,
    Internal,
}

impl ErrorKind {
    /// Kind of a bare repository error.
    pub fn of_repo(e: &RepoError) -> Self {
        match e {
            RepoError::NotFound { .. } => ErrorKind::NotFound,
            RepoError::InsufficientResource { .. } => ErrorKind::InsufficientResource,
            RepoError::ConstraintViolation(_) => ErrorKind::Conflict,
            RepoError::Database { .. } | RepoError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Details of a cross-store partial failure.
///
/// Never downgraded to a generic error: callers surface it as-is so the
/// orphaned or dangling records can be repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InconsistencyReport {
    /// Operation that was running, e.g. `remove_character`.
    pub operation: &'static str,
    /// Store whose writes are durable.
    pub committed_store: &'static str,
    /// Store that is missing the matching writes.
    pub pending_store: &'static str,
    /// Records left behind, as `collection/id`.
    pub records: Vec<String>,
    pub detail: String,
}

impl InconsistencyReport {
    pub fn new(
        operation: &'static str,
        committed_store: &'static str,
        pending_store: &'static str,
        records: Vec<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            committed_store,
            pending_store,
            records,
            detail: detail.into(),
        }
    }

    /// Emit the report at error level and hand it back.
    pub fn logged(self) -> Self {
        tracing::error!(
            operation = self.operation,
            committed_store = self.committed_store,
            pending_store = self.pending_store,
            records = ?self.records,
            detail = %self.detail,
            "Cross-store inconsistency"
        );
        self
    }
}

impl fmt::Display for InconsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} committed but {} did not ({}); records: {}",
            self.operation,
            self.committed_store,
            self.pending_store,
            self.detail,
            self.records.join(", ")
        )
    }
}

pub const LINK_STORE: &str = "link_store";
pub const DOCUMENT_STORE: &str = "document_store";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_classify() {
        assert_eq!(
            ErrorKind::of_repo(&RepoError::not_found("Map", "x")),
            ErrorKind::NotFound
        );
        assert_eq!(
            ErrorKind::of_repo(&RepoError::insufficient("coins", 5, 1)),
            ErrorKind::InsufficientResource
        );
        assert_eq!(
            ErrorKind::of_repo(&RepoError::database("op", "boom")),
            ErrorKind::Internal
        );
    }

    #[test]
    fn report_display_names_both_stores() {
        let report = InconsistencyReport::new(
            "remove_character",
            LINK_STORE,
            DOCUMENT_STORE,
            vec!["wallets/abc".to_string()],
            "wallet delete failed",
        );
        let text = report.to_string();
        assert!(text.contains("link_store committed"));
        assert!(text.contains("wallets/abc"));
    }
}
