//! Error kinds surfaced by the account service and the access guard.

use crate::crypto::{CredentialError, TokenError};
use crate::storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User not exist.")]
    NotFound,
    #[error("Email already exist.")]
    DuplicateEmail,
    #[error("New password must differ from the current one.")]
    PasswordUnchanged,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// An account/wallet invariant does not hold in storage.
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Missing bearer token.")]
    MissingToken,
    #[error("Invalid token.")]
    InvalidToken,
    #[error("Token expired.")]
    ExpiredToken,
    #[error("Unauthorized user.")]
    UnauthorizedSubject,
    #[error(transparent)]
    Storage(#[from] StoreError),
}
