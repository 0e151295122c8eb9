//! Bearer-token guard for protected routes.

use crate::crypto::{TokenCodec, TokenError};
use crate::domain::account::Account;
use crate::domain::error::GuardError;
use crate::storage::{AccountStore, Storage, StoreTransaction};
use std::sync::Arc;
use tracing::debug;

const BEARER_PREFIX: &str = "Bearer ";

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, GuardError> {
    let token = authorization
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .ok_or(GuardError::MissingToken)?;
    if token.is_empty() {
        return Err(GuardError::MissingToken);
    }
    Ok(token)
}

/// Resolves a presented session token to a live account.
///
/// Stateless across requests: there is no revocation list, so tokens of a
/// deleted account still verify but fail here with `UnauthorizedSubject`.
#[derive(Clone)]
pub struct AccessGuard {
    storage: Arc<dyn Storage>,
    tokens: TokenCodec,
}

impl AccessGuard {
    pub fn new(storage: Arc<dyn Storage>, tokens: TokenCodec) -> Self {
        Self { storage, tokens }
    }

    pub async fn authorize(&self, authorization: Option<&str>) -> Result<Account, GuardError> {
        let token = bearer_token(authorization)?;

        let claims = self.tokens.verify(token).map_err(|e| match e {
            TokenError::Expired => GuardError::ExpiredToken,
            _ => GuardError::InvalidToken,
        })?;

        let mut tx = self.storage.begin().await?;
        let account = tx.find_account(claims.sub).await?;
        tx.rollback().await?;

        account.ok_or_else(|| {
            debug!(subject = %claims.sub, "token subject no longer exists");
            GuardError::UnauthorizedSubject
        })
    }
}
