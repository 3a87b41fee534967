//! API route definitions.

use axum::Router;
use walletd_core::WalletStore;

use crate::AppState;

pub mod health;
pub mod wallets;

/// Creates the API router with all routes.
pub fn api_routes<S: WalletStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes())
        .merge(wallets::routes())
}
