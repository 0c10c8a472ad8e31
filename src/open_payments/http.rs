// Open Payments client over reqwest
// Every request except wallet address lookups is signed with the client's
// Ed25519 key (see `signature`). Access tokens are sent as `GNAP <token>`.

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::error::{OpenPaymentsError, OpenPaymentsResult};
use super::signature::{content_digest, load_signing_key, SignatureInput, SignedBody};
use super::types::*;
use super::{ClientProvider, OpenPaymentsClient};
use crate::config::OpenPaymentsConfig;

const JSON_CONTENT_TYPE: &str = "application/json";

pub struct AuthenticatedHttpClient {
    client: Client,
    wallet_address_url: String,
    key_id: String,
    signing_key: SigningKey,
}

// Grant requests always name the client wallet
#[derive(Serialize)]
struct ClientGrantRequest<'a> {
    #[serde(flatten)]
    request: &'a GrantRequest,
    client: &'a str,
}

// Error body returned by Open Payments servers
#[derive(Deserialize)]
struct OpenPaymentsErrorResponse {
    error: OpenPaymentsErrorBody,
}

#[derive(Deserialize)]
struct OpenPaymentsErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl AuthenticatedHttpClient {
    pub fn new(wallet_address_url: &str, key_id: &str, signing_key: SigningKey) -> Self {
        Self {
            client: Client::new(),
            wallet_address_url: wallet_address_url.to_string(),
            key_id: key_id.to_string(),
            signing_key,
        }
    }

    fn resource_url(resource_server: &str, collection: &str) -> String {
        format!("{}/{}", resource_server.trim_end_matches('/'), collection)
    }

    /// Send a signed JSON POST and decode the response
    async fn post_signed<B, T>(
        &self,
        url: &str,
        access_token: Option<&str>,
        body: &B,
    ) -> OpenPaymentsResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)
            .map_err(|e| OpenPaymentsError::InvalidResponse(format!("could not encode request: {}", e)))?;
        let digest = content_digest(&body);
        let authorization = access_token.map(|token| format!("GNAP {}", token));

        let input = SignatureInput {
            method: "POST",
            target_uri: url,
            authorization: authorization.as_deref(),
            body: Some(SignedBody {
                content_digest: &digest,
                content_length: body.len(),
                content_type: JSON_CONTENT_TYPE,
            }),
        };
        let headers = input.sign(&self.signing_key, &self.key_id, chrono::Utc::now().timestamp());

        let mut request = self
            .client
            .post(url)
            .header("Accept", JSON_CONTENT_TYPE)
            .header("Content-Type", JSON_CONTENT_TYPE)
            .header("Content-Digest", &digest)
            .header("Signature", headers.signature)
            .header("Signature-Input", headers.signature_input);
        if let Some(authorization) = &authorization {
            request = request.header("Authorization", authorization);
        }

        debug!("Open Payments POST {}", url);
        let response = request.body(body).send().await?;
        Self::decode("POST", response).await
    }

    async fn decode<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> OpenPaymentsResult<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as Open Payments error response
            let parsed = serde_json::from_str::<OpenPaymentsErrorResponse>(&error_text).ok();
            let code = parsed.as_ref().and_then(|e| e.error.code.clone());
            let description = parsed
                .and_then(|e| e.error.description)
                .unwrap_or_else(|| {
                    format!("Error making Open Payments {} request ({})", method, status)
                });

            return Err(OpenPaymentsError::Client {
                description,
                status: Some(status.as_u16()),
                code,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| OpenPaymentsError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl OpenPaymentsClient for AuthenticatedHttpClient {
    async fn wallet_address(&self, url: &str) -> OpenPaymentsResult<WalletAddress> {
        debug!("Open Payments GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", JSON_CONTENT_TYPE)
            .send()
            .await?;
        Self::decode("GET", response).await
    }

    async fn request_grant(
        &self,
        auth_server: &str,
        request: &GrantRequest,
    ) -> OpenPaymentsResult<Grant> {
        let body = ClientGrantRequest {
            request,
            client: &self.wallet_address_url,
        };
        self.post_signed(auth_server, None, &body).await
    }

    async fn continue_grant(&self, uri: &str, access_token: &str) -> OpenPaymentsResult<Grant> {
        self.post_signed(uri, Some(access_token), &serde_json::json!({}))
            .await
    }

    async fn create_incoming_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        body: &CreateIncomingPayment,
    ) -> OpenPaymentsResult<IncomingPayment> {
        let url = Self::resource_url(resource_server, "incoming-payments");
        self.post_signed(&url, Some(access_token), body).await
    }

    async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &str,
        body: &CreateQuote,
    ) -> OpenPaymentsResult<Quote> {
        let url = Self::resource_url(resource_server, "quotes");
        self.post_signed(&url, Some(access_token), body).await
    }

    async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        body: &CreateOutgoingPayment,
    ) -> OpenPaymentsResult<OutgoingPayment> {
        let url = Self::resource_url(resource_server, "outgoing-payments");
        self.post_signed(&url, Some(access_token), body).await
    }
}

/// Builds a fresh [`AuthenticatedHttpClient`] per call, reloading the key
pub struct HttpClientProvider {
    config: OpenPaymentsConfig,
}

impl HttpClientProvider {
    pub fn new(config: OpenPaymentsConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClientProvider for HttpClientProvider {
    async fn authenticated_client(&self) -> OpenPaymentsResult<Arc<dyn OpenPaymentsClient>> {
        let signing_key = load_signing_key(&self.config.private_key).await?;
        Ok(Arc::new(AuthenticatedHttpClient::new(
            &self.config.wallet_address_url,
            &self.config.key_id,
            signing_key,
        )))
    }
}
