//! Health check endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;
use walletd_core::WalletStore;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check handler. Reports unhealthy when storage cannot be reached.
async fn health_check<S: WalletStore>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION");
    match state.ledger.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                version,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    version,
                }),
            )
        }
    }
}

/// Creates health check routes.
pub fn routes<S: WalletStore>() -> Router<AppState<S>> {
    Router::new().route("/health", get(health_check::<S>))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use walletd_core::{InMemoryWalletStore, LedgerService, StoreError, Wallet};
    use walletd_shared::WalletId;

    use super::*;
    use crate::create_router;

    /// Store whose backend is never reachable.
    struct DownStore;

    #[async_trait]
    impl WalletStore for DownStore {
        type Tx = ();

        async fn begin(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn begin_read_only(&self) -> Result<(), StoreError> {
            self.begin().await
        }
        async fn commit(&self, _tx: ()) -> Result<(), StoreError> {
            Ok(())
        }
        async fn rollback(&self, _tx: ()) -> Result<(), StoreError> {
            Ok(())
        }
        async fn load(&self, _: &mut (), _: WalletId) -> Result<Option<Wallet>, StoreError> {
            Ok(None)
        }
        async fn load_for_update(
            &self,
            _: &mut (),
            _: WalletId,
        ) -> Result<Option<Wallet>, StoreError> {
            Ok(None)
        }
        async fn save(&self, _: &mut (), _: &Wallet) -> Result<(), StoreError> {
            Ok(())
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn health_request() -> Request<Body> {
        Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthy() {
        let store = Arc::new(InMemoryWalletStore::new());
        let app = create_router(AppState::new(LedgerService::new(store)));

        let response = app.oneshot(health_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unreachable_storage_is_503() {
        let app = create_router(AppState::new(LedgerService::new(Arc::new(DownStore))));

        let response = app.oneshot(health_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_operation_on_unreachable_storage_is_503() {
        let app = create_router(AppState::new(LedgerService::new(Arc::new(DownStore))));
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/wallets/{}/operation", WalletId::new()))
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"operation_type":"DEPOSIT","amount":5}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "STORAGE_UNAVAILABLE");
        assert!(!body["message"].as_str().unwrap().contains("refused"));
    }
}
