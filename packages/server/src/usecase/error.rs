//! UseCase error types.

use thiserror::Error;

use crate::{domain::UsernameError, infrastructure::RegistryError};

/// Why a connection could not be turned into a registered session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error(transparent)]
    InvalidUsername(#[from] UsernameError),

    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),
}

impl From<RegistryError> for ConnectError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateUsername(name) => ConnectError::DuplicateUsername(name),
        }
    }
}
