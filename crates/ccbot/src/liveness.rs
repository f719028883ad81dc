//! Liveness endpoint for the hosting platform.
//!
//! Shares nothing with the bot core; it only proves the process is up.

use std::net::SocketAddr;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use ccbot_core::Result;
use tokio::net::TcpListener;

pub const ROOT_BODY: &str = "Bot activo y listo 😎";

pub fn router() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .fallback(|| async { StatusCode::NOT_FOUND })
}

/// Bind `0.0.0.0:<port>`. A taken or forbidden port surfaces as `Error::Io`.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "liveness endpoint listening");
    Ok(listener)
}

pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

async fn root_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROOT_BODY,
    )
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ccbot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
