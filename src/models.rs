use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::Config;
use crate::open_payments::OutgoingPayment;
use crate::payment::{PaymentOrchestrator, DEFAULT_SESSION};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orchestrator: Arc<PaymentOrchestrator>,
}

// API Request/Response types
// Field names follow the checkout form (monto = amount, concepto = memo).

#[derive(Debug, Default, Deserialize)]
pub struct PaymentRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub monto: Option<String>,
    #[serde(default)]
    pub concepto: Option<String>,
    /// Optional key isolating this checkout from others in flight
    #[serde(default)]
    pub sesion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub message: String,
    pub url: String,
    pub concepto: String,
    pub monto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sesion: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeRequest {
    #[serde(default)]
    pub sesion: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    pub message: String,
    pub outgoing_payment: OutgoingPayment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub pending_grants: usize,
}

/// Session key a request refers to, falling back to the shared slot
pub fn session_key(sesion: Option<&str>) -> &str {
    match sesion.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => DEFAULT_SESSION,
    }
}

// The form sends the amount as a string, other clients send a number
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}
