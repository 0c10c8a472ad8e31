use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::models::{
    session_key, AppState, FinalizeRequest, FinalizeResponse, PaymentRequest, PaymentResponse,
};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/pago", post(create_payment))
        .route("/finalizar-pago", post(finalize_payment))
        .with_state(state)
}

/// POST /pago - start a payment and return the approval URL
async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> AppResult<Json<PaymentResponse>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let session = session_key(request.sesion.as_deref());

    let initiated = state
        .orchestrator
        .request_payment(
            session,
            request.monto.as_deref().unwrap_or_default(),
            request.concepto.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(PaymentResponse {
        message: "Grant interactivo generado. Abre la URL para aceptar el pago".to_string(),
        url: initiated.redirect_url,
        concepto: initiated.memo,
        monto: initiated.amount,
        sesion: request.sesion.clone(),
    }))
}

/// POST /finalizar-pago - create the outgoing payment once the grant is approved
///
/// The form posts without a body, so an empty body means the default session.
async fn finalize_payment(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<FinalizeResponse>> {
    let request: FinalizeRequest = if body.iter().all(u8::is_ascii_whitespace) {
        FinalizeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid JSON body: {}", e)))?
    };
    let session = session_key(request.sesion.as_deref());

    let outgoing_payment = state.orchestrator.finalize_payment(session).await?;
    info!("Outgoing payment created: {}", outgoing_payment.id);

    Ok(Json(FinalizeResponse {
        message: "Pago realizado correctamente".to_string(),
        outgoing_payment,
    }))
}
