use crate::app::{AccessGuard, AccountService};
use crate::crypto::{CredentialCodec, TokenCodec};
use crate::domain::account::{
    AccountProfile, AccountSummary, CreatedAccount, RenamedAccount, SessionToken,
};
use crate::storage::Storage;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub guard: AccessGuard,
}

impl AppState {
    /// Wires the service and the guard over one shared storage backend.
    pub fn new(storage: Arc<dyn Storage>, credentials: CredentialCodec, tokens: TokenCodec) -> Self {
        let guard = AccessGuard::new(storage.clone(), tokens.clone());
        let accounts = Arc::new(AccountService::new(storage, credentials, tokens));
        Self { accounts, guard }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of every successful response that carries data: `{"success": true, "data": ...}`.
#[derive(Serialize, ToSchema)]
#[aliases(
    UserListEnvelope = DataEnvelope<UserListResponse>,
    CreatedAccountEnvelope = DataEnvelope<CreatedAccount>,
    AccountProfileEnvelope = DataEnvelope<AccountProfile>,
    RenamedAccountEnvelope = DataEnvelope<RenamedAccount>,
    SessionTokenEnvelope = DataEnvelope<SessionToken>
)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub password: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameUserRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<AccountSummary>,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(format!("Invalid JSON body: {} (expected: {})", err, expected)),
        }),
    )
}

pub fn path_400(err: PathRejection) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(format!("Invalid path parameter: {}", err)),
        }),
    )
}
