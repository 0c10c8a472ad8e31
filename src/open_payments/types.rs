// Open Payments wire records (camelCase resource servers, snake_case GNAP)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddress {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,
    pub asset_code: String,
    pub asset_scale: u8,
    pub auth_server: String,
    pub resource_server: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    pub value: String,
    pub asset_code: String,
    pub asset_scale: u8,
}

// =============================================================================
// GNAP grants
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessType {
    IncomingPayment,
    Quote,
    OutgoingPayment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessAction {
    Create,
    Complete,
    Read,
    ReadAll,
    List,
    ListAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debit_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_amount: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessItem {
    #[serde(rename = "type")]
    pub access_type: AccessType,
    pub actions: Vec<AccessAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<AccessLimits>,
}

impl AccessItem {
    pub fn new(access_type: AccessType, actions: Vec<AccessAction>) -> Self {
        Self {
            access_type,
            actions,
            identifier: None,
            limits: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    pub access: Vec<AccessItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractRequest {
    pub start: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub access_token: AccessTokenRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractRequest>,
}

impl GrantRequest {
    /// Non-interactive grant for a single access item
    pub fn single(item: AccessItem) -> Self {
        Self {
            access_token: AccessTokenRequest { access: vec![item] },
            interact: None,
        }
    }

    /// Grant that needs the user to approve it through a browser redirect
    pub fn interactive(item: AccessItem) -> Self {
        Self {
            access_token: AccessTokenRequest { access: vec![item] },
            interact: Some(InteractRequest {
                start: vec!["redirect".to_string()],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access: Vec<AccessItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueToken {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    pub access_token: ContinueToken,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub redirect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
}

/// Response of a grant request or continuation.
///
/// A pending (interactive) grant has `interact` and `continue`; a finalized
/// grant has an `access_token`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact: Option<Interaction>,
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continuation>,
}

impl Grant {
    pub fn is_finalized(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn access_token_value(&self) -> Option<&str> {
        self.access_token.as_ref().map(|t| t.value.as_str())
    }

    pub fn redirect_url(&self) -> Option<&str> {
        self.interact.as_ref().map(|i| i.redirect.as_str())
    }
}

pub fn is_finalized_grant(grant: &Grant) -> bool {
    grant.is_finalized()
}

// =============================================================================
// Resource server records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncomingPayment {
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPayment {
    pub id: String,
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_amount: Option<Amount>,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuote {
    pub wallet_address: String,
    pub receiver: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub wallet_address: String,
    pub receiver: String,
    pub debit_amount: Amount,
    pub receive_amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutgoingPayment {
    pub wallet_address: String,
    pub quote_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPayment {
    pub id: String,
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,
    pub receiver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debit_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_amount: Option<Amount>,
    #[serde(default)]
    pub failed: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
