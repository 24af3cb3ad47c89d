//! Character status log operations.

use std::sync::Arc;

use farmstead_domain::{CharacterId, StatusEntry, StatusLogId, StatusType};

use crate::infrastructure::ports::{CharacterLinkRepo, ClockPort, RepoError, StatusLogRepo};
use crate::use_cases::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Status log not found: {0}")]
    LogNotFound(StatusLogId),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl StatusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatusError::LogNotFound(_) => ErrorKind::NotFound,
            StatusError::Repo(e) => ErrorKind::of_repo(e),
        }
    }
}

pub struct StatusOps {
    status_logs: Arc<dyn StatusLogRepo>,
    links: Arc<dyn CharacterLinkRepo>,
    clock: Arc<dyn ClockPort>,
}

impl StatusOps {
    pub fn new(
        status_logs: Arc<dyn StatusLogRepo>,
        links: Arc<dyn CharacterLinkRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            status_logs,
            links,
            clock,
        }
    }

    pub async fn append(
        &self,
        log_id: StatusLogId,
        status_type: StatusType,
        details: impl Into<String>,
    ) -> Result<StatusEntry, StatusError> {
        let entry = StatusEntry::new(status_type, details, self.clock.now());
        self.status_logs
            .append(log_id, &entry)
            .await
            .map_err(|e| match e {
                RepoError::NotFound { .. } => StatusError::LogNotFound(log_id),
                other => StatusError::Repo(other),
            })?;
        Ok(entry)
    }

    /// Append, logging instead of failing.
    pub async fn append_best_effort(
        &self,
        log_id: StatusLogId,
        status_type: StatusType,
        details: impl Into<String>,
    ) {
        if let Err(e) = self.append(log_id, status_type, details).await {
            tracing::warn!(
                status_log_id = %log_id,
                status_type = %status_type,
                error = %e,
                "Failed to append status entry"
            );
        }
    }

    /// The newest `n` entries, newest first.
    pub async fn recent(&self, log_id: StatusLogId, n: usize) -> Result<Vec<StatusEntry>, StatusError> {
        let log = self
            .status_logs
            .get(log_id)
            .await?
            .ok_or(StatusError::LogNotFound(log_id))?;
        Ok(log.recent(n))
    }

    /// Best-effort `disconnected` entry for a character's log.
    pub async fn record_disconnect(&self, character_id: CharacterId) {
        let link = match self.links.get_by_character(character_id).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                tracing::debug!(character_id = %character_id, "No link for disconnected character");
                return;
            }
            Err(e) => {
                tracing::warn!(character_id = %character_id, error = %e, "Link lookup failed on disconnect");
                return;
            }
        };
        self.append_best_effort(link.status_log_id, StatusType::Disconnected, "Left the farm")
            .await;
    }
}
