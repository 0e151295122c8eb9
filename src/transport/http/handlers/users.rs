use crate::transport::http::auth::CurrentAccount;
use crate::transport::http::handlers::common::{bad_request, success};
use crate::transport::http::types::{
    json_422, path_400, AccountProfileEnvelope, ApiResponse, AppState, ChangePasswordRequest,
    CreateUserRequest, CreatedAccountEnvelope, RenameUserRequest, RenamedAccountEnvelope,
    UserListEnvelope, UserListResponse,
};
use crate::transport::http::validation::{validate_email, validate_name, validate_strong_password};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users with their wallets", body = UserListEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn list_users_handler(
    State(state): State<AppState>,
    _current: CurrentAccount,
) -> Response {
    match state.accounts.list_accounts().await {
        Ok(users) => success(StatusCode::OK, &UserListResponse { users }),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User and wallet created", body = CreatedAccountEnvelope),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 409, description = "Email already registered", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_user_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, r#"{"name": "...", "password": "...", "email": "..."}"#)
                .into_response()
        }
    };

    let checked = validate_name(&request.name)
        .and_then(|_| validate_email(&request.email))
        .and_then(|_| validate_strong_password(&request.password));
    if let Err(message) = checked {
        return bad_request(message);
    }

    match state
        .accounts
        .create_account(&request.name, &request.password, &request.email)
        .await
    {
        Ok(created) => success(StatusCode::CREATED, &created),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/users/me",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile of the token's user", body = AccountProfileEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ApiResponse)
    )
)]
pub async fn current_user_handler(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Response {
    match state.accounts.get_account(account.id).await {
        Ok(profile) => success(StatusCode::OK, &profile),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    security(("bearer" = [])),
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile with wallet", body = AccountProfileEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ApiResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    )
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    _current: CurrentAccount,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(user_id) = match user_id {
        Ok(v) => v,
        Err(e) => return path_400(e).into_response(),
    };

    match state.accounts.get_account(user_id).await {
        Ok(profile) => success(StatusCode::OK, &profile),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/users/{user_id}",
    security(("bearer" = [])),
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = RenameUserRequest,
    responses(
        (status = 200, description = "User renamed", body = RenamedAccountEnvelope),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ApiResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    )
)]
pub async fn rename_user_handler(
    State(state): State<AppState>,
    _current: CurrentAccount,
    user_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<RenameUserRequest>, JsonRejection>,
) -> Response {
    let Path(user_id) = match user_id {
        Ok(v) => v,
        Err(e) => return path_400(e).into_response(),
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, r#"{"name": "..."}"#).into_response(),
    };
    if let Err(message) = validate_name(&request.name) {
        return bad_request(message);
    }

    match state.accounts.rename_account(user_id, &request.name).await {
        Ok(renamed) => success(StatusCode::OK, &renamed),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/users/{user_id}/password",
    security(("bearer" = [])),
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Weak password or same as current", body = ApiResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ApiResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    )
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    _current: CurrentAccount,
    user_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Response {
    let Path(user_id) = match user_id {
        Ok(v) => v,
        Err(e) => return path_400(e).into_response(),
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, r#"{"password": "..."}"#).into_response(),
    };
    if let Err(message) = validate_strong_password(&request.password) {
        return bad_request(message);
    }

    match state
        .accounts
        .change_password(user_id, &request.password)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    security(("bearer" = [])),
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User and wallet deleted"),
        (status = 401, description = "Missing, invalid or expired token", body = ApiResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    )
)]
pub async fn delete_user_handler(
    State(state): State<AppState>,
    _current: CurrentAccount,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(user_id) = match user_id {
        Ok(v) => v,
        Err(e) => return path_400(e).into_response(),
    };

    match state.accounts.delete_account(user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
