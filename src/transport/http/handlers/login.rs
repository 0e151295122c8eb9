use crate::transport::http::handlers::common::{bad_request, success};
use crate::transport::http::types::{
    json_422, ApiResponse, AppState, LoginRequest, SessionTokenEnvelope,
};
use crate::transport::http::validation::validate_present;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued (valid for 24h)", body = SessionTokenEnvelope),
        (status = 400, description = "Email or password missing", body = ApiResponse),
        (status = 404, description = "Unknown email or wrong password", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, r#"{"email": "...", "password": "..."}"#).into_response()
        }
    };

    let checked = validate_present("email", &request.email)
        .and_then(|_| validate_present("password", &request.password));
    if let Err(message) = checked {
        return bad_request(message);
    }

    match state
        .accounts
        .authenticate(&request.email, &request.password)
        .await
    {
        Ok(session) => success(StatusCode::OK, &session),
        Err(e) => e.into_response(),
    }
}
