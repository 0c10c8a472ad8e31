//! API Routes
//!
//! - `POST /pago` - Start a payment, returns the grant approval URL
//! - `POST /finalizar-pago` - Create the outgoing payment after approval
//! - `GET /api/health` - Health check
//! - `GET /` - Banner

pub mod health;
pub mod payment;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let allowed_origins = state.config.server.cors_allowed_origins.clone();
    let router = Router::new()
        .merge(payment::router(state.clone()))
        .merge(health::router(state))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &allowed_origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, OpenPaymentsConfig, PaymentConfig, ServerConfig};
    use crate::open_payments::testing::{
        Step, StubClient, StubProvider, OUTGOING_ID, RECEIVER_URL, REDIRECT_URL, SENDER_URL,
    };
    use crate::open_payments::OpenPaymentsError;
    use crate::payment::PaymentOrchestrator;
    use crate::types::{GRANT_NOT_FINALIZED, MISSING_FIELDS, NO_PENDING_GRANT};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            open_payments: OpenPaymentsConfig {
                wallet_address_url: "https://wallet.test/me".to_string(),
                private_key: "./private.key".to_string(),
                key_id: "key-1".to_string(),
                sending_wallet_url: SENDER_URL.to_string(),
                receiving_wallet_url: RECEIVER_URL.to_string(),
            },
            payment: PaymentConfig {
                pending_grant_ttl_secs: 0,
                ledger_capacity: 16,
                ledger_ttl_secs: 60,
            },
        }
    }

    fn app(stub: Arc<StubClient>) -> Router {
        let config = test_config();
        let orchestrator = PaymentOrchestrator::from_config(
            StubProvider::new(stub),
            &config.open_payments,
            &config.payment,
        );
        create_router(AppState {
            config,
            orchestrator: Arc::new(orchestrator),
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_pago_returns_redirect_url() {
        let stub = StubClient::new();
        let app = app(stub);

        let (status, body) = send(
            &app,
            post_json("/pago", serde_json::json!({"monto": "100", "concepto": "lunch"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], REDIRECT_URL);
        assert_eq!(body["monto"], "100");
        assert_eq!(body["concepto"], "lunch");
        assert!(body["message"].as_str().unwrap().contains("Abre la URL"));
        assert!(body.get("sesion").is_none());
    }

    #[tokio::test]
    async fn test_pago_missing_fields_is_bad_request() {
        let stub = StubClient::new();
        let app = app(stub.clone());

        let (status, body) = send(&app, post_json("/pago", serde_json::json!({"monto": "100"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": MISSING_FIELDS}));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pago_malformed_json_is_bad_request() {
        let app = app(StubClient::new());
        let request = Request::builder()
            .method("POST")
            .uri("/pago")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_pago_client_error_is_bad_request() {
        let stub = StubClient::new();
        stub.fail_at(Step::Quote, OpenPaymentsError::client("insufficient funds"));
        let app = app(stub.clone());

        let (status, body) = send(
            &app,
            post_json("/pago", serde_json::json!({"monto": "100", "concepto": "lunch"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "insufficient funds"}));

        // nothing was left pending
        let (status, body) = send(&app, post_empty("/finalizar-pago")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], NO_PENDING_GRANT);
    }

    #[tokio::test]
    async fn test_pago_internal_error_is_server_error() {
        let stub = StubClient::new();
        stub.fail_at(
            Step::IncomingPayment,
            OpenPaymentsError::InvalidResponse("unexpected end of input".to_string()),
        );
        let app = app(stub);

        let (status, body) = send(
            &app,
            post_json("/pago", serde_json::json!({"monto": "100", "concepto": "lunch"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("unexpected end of input"));
    }

    #[tokio::test]
    async fn test_full_checkout_flow() {
        let stub = StubClient::new();
        let app = app(stub.clone());

        let (status, _) = send(
            &app,
            post_json("/pago", serde_json::json!({"monto": "100", "concepto": "lunch"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // user has not approved yet
        let (status, body) = send(&app, post_empty("/finalizar-pago")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], GRANT_NOT_FINALIZED);

        stub.approve();
        let (status, body) = send(&app, post_empty("/finalizar-pago")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Pago realizado correctamente");
        assert_eq!(body["outgoingPayment"]["id"], OUTGOING_ID);

        let (status, body) = send(&app, post_json("/finalizar-pago", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], NO_PENDING_GRANT);
    }

    #[tokio::test]
    async fn test_sessions_from_request_bodies() {
        let stub = StubClient::new();
        stub.approve();
        let app = app(stub);

        let (status, body) = send(
            &app,
            post_json(
                "/pago",
                serde_json::json!({"monto": "100", "concepto": "lunch", "sesion": "tab-1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sesion"], "tab-1");

        let (status, _) = send(&app, post_empty("/finalizar-pago")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            post_json("/finalizar-pago", serde_json::json!({"sesion": "tab-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_pending_grants() {
        let app = app(StubClient::new());

        let (status, body) = send(
            &app,
            Request::builder().uri("/api/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["pendingGrants"], 0);
    }
}
