use thiserror::Error;

/// Failure kinds surfaced by an Open Payments client.
///
/// `Client` is the protocol-level failure the caller can act on (rejected
/// grant, insufficient funds, unreachable server). The other kinds point at
/// this service itself: a bad signing key or a response it cannot decode.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpenPaymentsError {
    #[error("{description}")]
    Client {
        description: String,
        status: Option<u16>,
        code: Option<String>,
    },

    #[error("Invalid signing key: {0}")]
    Key(String),

    #[error("Invalid Open Payments response: {0}")]
    InvalidResponse(String),
}

impl OpenPaymentsError {
    /// Client error with just a description
    pub fn client(description: impl Into<String>) -> Self {
        OpenPaymentsError::Client {
            description: description.into(),
            status: None,
            code: None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, OpenPaymentsError::Client { .. })
    }

    pub fn description(&self) -> String {
        match self {
            OpenPaymentsError::Client { description, .. } => description.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for OpenPaymentsError {
    fn from(e: reqwest::Error) -> Self {
        OpenPaymentsError::Client {
            description: format!("Error making Open Payments request: {}", e),
            status: e.status().map(|s| s.as_u16()),
            code: None,
        }
    }
}

pub type OpenPaymentsResult<T> = std::result::Result<T, OpenPaymentsError>;
