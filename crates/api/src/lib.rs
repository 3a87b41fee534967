//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for wallets and health
//! - JSON error responses
//!
//! The router is generic over the wallet store so tests can run it against
//! [`walletd_core::InMemoryWalletStore`] and the server against Postgres.

pub mod error;
pub mod routes;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use walletd_core::{LedgerService, WalletStore};

pub use error::ApiError;

/// Application state shared across handlers.
pub struct AppState<S: WalletStore> {
    /// Ledger operations over the configured store.
    pub ledger: LedgerService<S>,
}

impl<S: WalletStore> AppState<S> {
    /// Creates the state around a ledger service.
    #[must_use]
    pub const fn new(ledger: LedgerService<S>) -> Self {
        Self { ledger }
    }
}

impl<S: WalletStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: WalletStore>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
