use crate::Registry;
use crate::error::{AppResult, InfraError};
use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

mod signup;

#[derive(Clone)]
pub struct HttpAppCtx {
    pub registry: Arc<Registry>,
}

/// All routes, without a listener. `serve` binds this; tests drive it directly.
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/signup", post(signup::signup))
        .with_state(HttpAppCtx { registry })
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

/// Run the HTTP server
pub async fn serve(addr: SocketAddr, registry: Arc<Registry>) -> AppResult<()> {
    let app = router(registry);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(InfraError::from)?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(InfraError::from)?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
