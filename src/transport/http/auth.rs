//! Request extractor that runs the access guard.

use crate::domain::account::Account;
use crate::domain::error::GuardError;
use crate::transport::http::types::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// The account resolved from the request's bearer token.
///
/// Taking this as a handler argument makes the route protected; the resolved
/// account is also stored in the request extensions.
#[derive(Clone, Debug)]
pub struct CurrentAccount(pub Account);

#[async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentAccount>() {
            return Ok(current.clone());
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let account = state.guard.authorize(header.as_deref()).await?;

        let current = CurrentAccount(account);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}
