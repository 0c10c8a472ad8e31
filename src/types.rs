// Application error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::open_payments::OpenPaymentsError;

pub const MISSING_FIELDS: &str = "Debes enviar monto y concepto";
pub const NO_PENDING_GRANT: &str = "No hay grant pendiente";
pub const GRANT_NOT_FINALIZED: &str = "Grant no finalizado, acepta el enlace en el navegador.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    /// Failure reported by the Open Payments servers
    #[error("{0}")]
    OpenPayments(String),

    #[error("{}", NO_PENDING_GRANT)]
    NoPendingGrant,

    #[error("{}", GRANT_NOT_FINALIZED)]
    GrantNotFinalized,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<OpenPaymentsError> for AppError {
    fn from(e: OpenPaymentsError) -> Self {
        if e.is_client_error() {
            AppError::OpenPayments(e.description())
        } else {
            AppError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
