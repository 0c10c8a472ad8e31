use axum::{extract::State, routing::get, Json, Router};

use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn banner() -> &'static str {
    "Backend Open Payments activo! Usa POST /pago para iniciar pagos."
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        pending_grants: state.orchestrator.pending().len().await,
    })
}
