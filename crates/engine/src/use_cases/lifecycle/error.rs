//! Character lifecycle errors.

use farmstead_domain::{CharacterId, DomainError};

use crate::infrastructure::ports::RepoError;
use crate::use_cases::error::{ErrorKind, InconsistencyReport};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Owner not found: {0}")]
    OwnerNotFound(String),
    #[error("Character name already taken: {0}")]
    DuplicateName(String),
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),
    #[error("{0}")]
    Inconsistency(InconsistencyReport),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            // An unknown owner is a bad request, not a missing resource.
            LifecycleError::Validation(_) | LifecycleError::OwnerNotFound(_) => {
                ErrorKind::Validation
            }
            LifecycleError::DuplicateName(_) => ErrorKind::Conflict,
            LifecycleError::CharacterNotFound(_) => ErrorKind::NotFound,
            LifecycleError::Inconsistency(_) => ErrorKind::Inconsistency,
            LifecycleError::Repo(_) => ErrorKind::Internal,
        }
    }
}
