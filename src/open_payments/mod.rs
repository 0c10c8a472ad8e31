// Open Payments client abstraction

pub mod error;
pub mod http;
pub mod signature;
pub mod types;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{OpenPaymentsError, OpenPaymentsResult};
pub use http::{AuthenticatedHttpClient, HttpClientProvider};
pub use types::*;

/// Operations an authenticated Open Payments client exposes.
///
/// `auth_server` / `resource_server` are the URLs advertised by a
/// [`WalletAddress`]; access tokens are GNAP token values.
#[async_trait]
pub trait OpenPaymentsClient: Send + Sync {
    async fn wallet_address(&self, url: &str) -> OpenPaymentsResult<WalletAddress>;

    async fn request_grant(
        &self,
        auth_server: &str,
        request: &GrantRequest,
    ) -> OpenPaymentsResult<Grant>;

    async fn continue_grant(&self, uri: &str, access_token: &str) -> OpenPaymentsResult<Grant>;

    async fn create_incoming_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        body: &CreateIncomingPayment,
    ) -> OpenPaymentsResult<IncomingPayment>;

    async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &str,
        body: &CreateQuote,
    ) -> OpenPaymentsResult<Quote>;

    async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &str,
        body: &CreateOutgoingPayment,
    ) -> OpenPaymentsResult<OutgoingPayment>;
}

/// Hands out authenticated clients for the configured wallet identity
#[async_trait]
pub trait ClientProvider: Send + Sync {
    async fn authenticated_client(&self) -> OpenPaymentsResult<Arc<dyn OpenPaymentsClient>>;
}
