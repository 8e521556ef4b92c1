//! Admin HTTP API.
//!
//! Read access to the monitor's records plus the few write operations a
//! human operator needs (reset, reported failure). Every route requires the
//! configured bearer token.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::lifecycle::Services;

/// Shared state of the admin router.
#[derive(Clone)]
pub struct AdminState {
    pub services: Services,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/providers", get(get_providers))
        .route("/admin/providers/ranked", get(get_ranked))
        .route("/admin/providers/best", get(get_best))
        .route("/admin/providers/{id}", get(get_provider))
        .route("/admin/providers/{id}/reset", post(reset_provider))
        .route("/admin/providers/{id}/failure", post(report_failure))
        .route("/admin/select", get(select_provider))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
