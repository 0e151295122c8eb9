use crate::domain::account::{
    AccountProfile, AccountSummary, CreatedAccount, RenamedAccount, SessionToken, WalletView,
};
use crate::transport::http::handlers::{health, login, users};
use crate::transport::http::types::{
    AccountProfileEnvelope, ApiResponse, ChangePasswordRequest, CreateUserRequest,
    CreatedAccountEnvelope, LoginRequest, RenameUserRequest, RenamedAccountEnvelope,
    SessionTokenEnvelope, UserListEnvelope, UserListResponse,
};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        login::login_handler,
        users::list_users_handler,
        users::create_user_handler,
        users::current_user_handler,
        users::get_user_handler,
        users::rename_user_handler,
        users::change_password_handler,
        users::delete_user_handler
    ),
    components(schemas(
        ApiResponse,
        CreateUserRequest,
        RenameUserRequest,
        ChangePasswordRequest,
        LoginRequest,
        UserListResponse,
        AccountSummary,
        AccountProfile,
        CreatedAccount,
        RenamedAccount,
        SessionToken,
        WalletView,
        UserListEnvelope,
        CreatedAccountEnvelope,
        AccountProfileEnvelope,
        RenamedAccountEnvelope,
        SessionTokenEnvelope
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/login", post(login::login_handler))
        .route(
            "/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route("/users/me", get(users::current_user_handler))
        .route(
            "/users/:user_id",
            get(users::get_user_handler)
                .put(users::rename_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(
            "/users/:user_id/password",
            patch(users::change_password_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
