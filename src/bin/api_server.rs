// src/bin/api_server.rs

use account_wallet_service::infra::telemetry;
use account_wallet_service::transport;
use account_wallet_service::{storage, AppConfig, CredentialCodec, TokenCodec};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    telemetry::init_logging(config.log_format);

    // --- Storage Initialization ---
    let storage = storage::connect(&config).await?;
    info!(backend = storage.backend_name(), "storage initialized");

    // --- Service Initialization ---
    let tokens = TokenCodec::with_ttl(config.jwt_secret.as_bytes(), config.token_ttl());
    let app_state = transport::http::AppState::new(storage, CredentialCodec::new(), tokens);

    // --- API Server Initialization ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "API server listening");
    info!("Swagger UI available at /swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received (Ctrl+C)");
}
