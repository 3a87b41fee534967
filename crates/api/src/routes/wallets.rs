//! Wallet routes.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use walletd_core::{OperationKind, Wallet, WalletStore};
use walletd_shared::WalletId;

use crate::{AppState, error::ApiError};

/// Creates the wallet routes.
pub fn routes<S: WalletStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/wallets/{wallet_id}", get(get_wallet::<S>))
        .route("/wallets/{wallet_id}/operation", post(apply_operation::<S>))
}

/// Request body for a wallet operation.
#[derive(Debug, Deserialize)]
pub struct OperationRequest {
    /// `DEPOSIT` or `WITHDRAW`.
    pub operation_type: OperationKind,
    /// Amount in minor units. Must be positive.
    pub amount: i64,
}

/// Wallet snapshot returned by every wallet route.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    /// Wallet ID.
    pub uuid: Uuid,
    /// Current balance.
    pub balance: i64,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            uuid: wallet.id().into_inner(),
            balance: wallet.balance(),
        }
    }
}

/// POST `/wallets/{wallet_id}/operation` - Deposit into or withdraw from a wallet.
async fn apply_operation<S: WalletStore>(
    State(state): State<AppState<S>>,
    wallet_id: Result<Path<WalletId>, PathRejection>,
    payload: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<WalletResponse>, ApiError> {
    let Path(wallet_id) = wallet_id?;
    let Json(payload) = payload?;

    let wallet = state
        .ledger
        .apply_operation(wallet_id, payload.operation_type, payload.amount)
        .await?;

    Ok(Json(wallet.into()))
}

/// GET `/wallets/{wallet_id}` - Get the current balance.
async fn get_wallet<S: WalletStore>(
    State(state): State<AppState<S>>,
    wallet_id: Result<Path<WalletId>, PathRejection>,
) -> Result<Json<WalletResponse>, ApiError> {
    let Path(wallet_id) = wallet_id?;
    debug!(wallet_id = %wallet_id, "Fetching wallet");

    let wallet = state.ledger.get_balance(wallet_id).await?;
    Ok(Json(wallet.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
        response::Response,
    };
    use http_body_util::BodyExt;
    use rstest::rstest;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use walletd_core::{InMemoryWalletStore, LedgerService};

    use crate::{AppState, create_router};

    fn app() -> Router {
        let store = InMemoryWalletStore::with_lock_timeout(Duration::from_secs(1));
        create_router(AppState::new(LedgerService::new(Arc::new(store))))
    }

    fn operation(wallet_id: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/v1/wallets/{wallet_id}/operation"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_wallet(wallet_id: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(format!("/api/v1/wallets/{wallet_id}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_unknown_wallet_returns_404() {
        let id = uuid::Uuid::new_v4().to_string();
        let response = app().oneshot(get_wallet(&id)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "WALLET_NOT_FOUND");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn test_deposit_then_get() {
        let app = app();
        let id = uuid::Uuid::new_v4().to_string();

        let response = app
            .clone()
            .oneshot(operation(&id, r#"{"operation_type":"DEPOSIT","amount":1000}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "uuid": id, "balance": 1000 }));

        let response = app.oneshot(get_wallet(&id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["balance"], 1000);
    }

    #[tokio::test]
    async fn test_withdraw_scenario() {
        let app = app();
        let id = uuid::Uuid::new_v4().to_string();

        app.clone()
            .oneshot(operation(&id, r#"{"operation_type":"DEPOSIT","amount":1000}"#))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(operation(&id, r#"{"operation_type":"WITHDRAW","amount":1500}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "INSUFFICIENT_BALANCE");

        let response = app
            .clone()
            .oneshot(operation(&id, r#"{"operation_type":"WITHDRAW","amount":1000}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["balance"], 0);
    }

    #[tokio::test]
    async fn test_withdraw_from_unknown_wallet_is_insufficient_balance() {
        let app = app();
        let id = uuid::Uuid::new_v4().to_string();

        let response = app
            .clone()
            .oneshot(operation(&id, r#"{"operation_type":"WITHDRAW","amount":1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "INSUFFICIENT_BALANCE");

        let response = app.oneshot(get_wallet(&id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case(r#"{"operation_type":"DEPOSIT","amount":0}"#)]
    #[case(r#"{"operation_type":"DEPOSIT","amount":-5}"#)]
    #[case(r#"{"operation_type":"WITHDRAW","amount":-1}"#)]
    #[tokio::test]
    async fn test_non_positive_amount_returns_400(#[case] body: &str) {
        let id = uuid::Uuid::new_v4().to_string();
        let response = app().oneshot(operation(&id, body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "INVALID_AMOUNT");
    }

    #[rstest]
    #[case(r#"{"operation_type":"TRANSFER","amount":10}"#)]
    #[case(r#"{"operation_type":"DEPOSIT","amount":"10"}"#)]
    #[case(r#"{"operation_type":"DEPOSIT","amount":1.5}"#)]
    #[case(r#"{"operation_type":"DEPOSIT"}"#)]
    #[case(r#"{"operation_type":"DEPOSIT","amount":"#)]
    #[case("")]
    #[case("not json")]
    #[tokio::test]
    async fn test_malformed_body_returns_422(#[case] body: &str) {
        let id = uuid::Uuid::new_v4().to_string();
        let response = app().oneshot(operation(&id, body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "INVALID_REQUEST_BODY");
    }

    #[tokio::test]
    async fn test_missing_content_type_returns_422() {
        let id = uuid::Uuid::new_v4().to_string();
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/wallets/{id}/operation"))
            .body(Body::from(r#"{"operation_type":"DEPOSIT","amount":10}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "INVALID_REQUEST_BODY");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn test_invalid_wallet_id_returns_400() {
        let response = app().oneshot(get_wallet("not-a-uuid")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "INVALID_WALLET_ID");
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let id = uuid::Uuid::new_v4().to_string();
        let response = app().oneshot(get_wallet(&id)).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
