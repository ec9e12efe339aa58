//! Perpetua HTTP API
//!
//! Thin axum handlers over the ledger book and governance registry.
//! Caller identity arrives from the upstream auth middleware via
//! headers; this crate never authenticates.

mod auth;
mod chain;
mod error;
mod governance_handlers;
mod routes;
mod state;
mod token_handlers;

pub use auth::Identity;
pub use chain::{ChainClient, ChainError, DevChainClient, DisabledChainClient};
pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

fn build_app(state: ApiState) -> Router {
    // browser clients send the identity headers on every authenticated
    // call, so the preflight must allow them
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            auth::USER_ID_HEADER,
            auth::USER_ROLE_HEADER,
        ]);

    routes::create_routes()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_server(
    addr: SocketAddr,
    state: ApiState,
) -> Result<(), Box<dyn std::error::Error>> {
    start_server_with_shutdown(addr, state, std::future::pending()).await
}

/// Same as [`start_server`] but stops when `shutdown` resolves, so the
/// node can write a final snapshot.
pub async fn start_server_with_shutdown(
    addr: SocketAddr,
    state: ApiState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::DisabledChainClient;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use perpetua_governance::GovernanceRegistry;
    use perpetua_ledger::LedgerBook;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    fn test_state() -> ApiState {
        ApiState::new(
            Arc::new(RwLock::new(LedgerBook::new())),
            Arc::new(RwLock::new(GovernanceRegistry::new())),
            None,
            Arc::new(DisabledChainClient),
            false,
        )
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_identity_headers() {
        let app = build_app(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/governance/proposals")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(
                        header::ACCESS_CONTROL_REQUEST_HEADERS,
                        "x-user-id,x-user-role",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(allowed.contains("x-user-id"));
        assert!(allowed.contains("x-user-role"));
    }
}
