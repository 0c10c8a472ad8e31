//! Payment orchestration over Open Payments
//!
//! Two operations drive a checkout:
//! - [`PaymentOrchestrator::request_payment`] creates the incoming payment and
//!   quote, then asks the sender's auth server for an interactive
//!   outgoing-payment grant and parks it in the [`PendingGrantStore`].
//! - [`PaymentOrchestrator::finalize_payment`] continues that grant once the
//!   user approved it in the browser and creates the outgoing payment.
//!
//! Steps run strictly in order and the first failure aborts the sequence.
//! Grants and payments already created on the remote servers are left as
//! they are.

pub mod ledger;
pub mod pending;

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{OpenPaymentsConfig, PaymentConfig};
use crate::open_payments::{
    AccessAction, AccessItem, AccessLimits, AccessType, Amount, ClientProvider,
    CreateIncomingPayment, CreateOutgoingPayment, CreateQuote, Grant, GrantRequest,
    OpenPaymentsClient, OutgoingPayment, is_finalized_grant,
};
use crate::types::{AppError, AppResult, MISSING_FIELDS};

pub use ledger::{PaymentLedger, PaymentMeta};
pub use pending::{PendingGrantStore, PendingOutgoingGrant, DEFAULT_SESSION};

/// Quote transport method
const QUOTE_METHOD: &str = "ilp";

/// Result of a successful RequestPayment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInitiated {
    pub redirect_url: String,
    pub amount: String,
    pub memo: String,
}

/// Wallets the checkout moves money between
#[derive(Debug, Clone)]
pub struct WalletPair {
    pub sending: String,
    pub receiving: String,
}

impl From<&OpenPaymentsConfig> for WalletPair {
    fn from(config: &OpenPaymentsConfig) -> Self {
        Self {
            sending: config.sending_wallet_url.clone(),
            receiving: config.receiving_wallet_url.clone(),
        }
    }
}

pub struct PaymentOrchestrator {
    provider: Arc<dyn ClientProvider>,
    wallets: WalletPair,
    pending: PendingGrantStore,
    ledger: PaymentLedger,
}

// 0 means no expiry
fn ttl_from_secs(secs: u64) -> Option<Duration> {
    match secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

fn granted_token(grant: &Grant, what: &str) -> AppResult<String> {
    grant
        .access_token_value()
        .map(str::to_string)
        .ok_or_else(|| AppError::Internal(format!("{} grant was not granted with an access token", what)))
}

impl PaymentOrchestrator {
    pub fn new(
        provider: Arc<dyn ClientProvider>,
        wallets: WalletPair,
        pending: PendingGrantStore,
        ledger: PaymentLedger,
    ) -> Self {
        Self {
            provider,
            wallets,
            pending,
            ledger,
        }
    }

    pub fn from_config(
        provider: Arc<dyn ClientProvider>,
        open_payments: &OpenPaymentsConfig,
        payment: &PaymentConfig,
    ) -> Self {
        Self::new(
            provider,
            WalletPair::from(open_payments),
            PendingGrantStore::new(ttl_from_secs(payment.pending_grant_ttl_secs)),
            PaymentLedger::new(
                payment.ledger_capacity,
                ttl_from_secs(payment.ledger_ttl_secs),
            ),
        )
    }

    pub fn pending(&self) -> &PendingGrantStore {
        &self.pending
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    /// Start a payment of `amount` (in the receiver's asset) described by `memo`
    pub async fn request_payment(
        &self,
        session: &str,
        amount: &str,
        memo: &str,
    ) -> AppResult<PaymentInitiated> {
        if amount.trim().is_empty() || memo.trim().is_empty() {
            return Err(AppError::InvalidRequest(MISSING_FIELDS.to_string()));
        }

        info!("Starting payment of {} for '{}' (session {})", amount, memo, session);

        let client = self.provider.authenticated_client().await?;
        let result = self
            .run_request_sequence(client, session, amount.trim(), memo)
            .await
            .map(|redirect_url| PaymentInitiated {
                redirect_url,
                amount: amount.to_string(),
                memo: memo.to_string(),
            });
        if let Err(e) = &result {
            warn!("Payment request aborted, remote grants are not rolled back: {}", e);
        }
        result
    }

    /// Runs the remote steps and returns the interaction redirect

    async fn run_request_sequence(
        &self,
        client: Arc<dyn OpenPaymentsClient>,
        session: &str,
        amount: &str,
        memo: &str,
    ) -> AppResult<String> {
        let sending_wallet = client.wallet_address(&self.wallets.sending).await?;
        let receiving_wallet = client.wallet_address(&self.wallets.receiving).await?;

        // Incoming payment on the receiver's side
        let incoming_grant = client
            .request_grant(
                &receiving_wallet.auth_server,
                &GrantRequest::single(AccessItem::new(
                    AccessType::IncomingPayment,
                    vec![AccessAction::Read, AccessAction::Create, AccessAction::Complete],
                )),
            )
            .await?;
        let incoming_token = granted_token(&incoming_grant, "Incoming payment")?;

        let incoming_payment = client
            .create_incoming_payment(
                &receiving_wallet.resource_server,
                &incoming_token,
                &CreateIncomingPayment {
                    wallet_address: receiving_wallet.id.clone(),
                    incoming_amount: Some(Amount {
                        value: amount.to_string(),
                        asset_code: receiving_wallet.asset_code.clone(),
                        asset_scale: receiving_wallet.asset_scale,
                    }),
                    expires_at: None,
                    metadata: None,
                },
            )
            .await?;

        self.ledger
            .record(
                &incoming_payment.id,
                PaymentMeta {
                    amount: amount.to_string(),
                    memo: memo.to_string(),
                },
            )
            .await;

        // Quote on the sender's side
        let quote_grant = client
            .request_grant(
                &sending_wallet.auth_server,
                &GrantRequest::single(AccessItem::new(
                    AccessType::Quote,
                    vec![AccessAction::Read, AccessAction::Create],
                )),
            )
            .await?;
        let quote_token = granted_token(&quote_grant, "Quote")?;

        let quote = client
            .create_quote(
                &sending_wallet.resource_server,
                &quote_token,
                &CreateQuote {
                    wallet_address: sending_wallet.id.clone(),
                    receiver: incoming_payment.id.clone(),
                    method: QUOTE_METHOD.to_string(),
                },
            )
            .await?;

        // Interactive grant capped at the quoted debit amount
        let mut outgoing_access = AccessItem::new(
            AccessType::OutgoingPayment,
            vec![AccessAction::Read, AccessAction::Create],
        );
        outgoing_access.identifier = Some(sending_wallet.id.clone());
        outgoing_access.limits = Some(AccessLimits {
            debit_amount: Some(quote.debit_amount.clone()),
            receive_amount: None,
        });

        let outgoing_grant = client
            .request_grant(
                &sending_wallet.auth_server,
                &GrantRequest::interactive(outgoing_access),
            )
            .await?;

        let redirect_url = outgoing_grant
            .redirect_url()
            .map(str::to_string)
            .ok_or_else(|| AppError::Internal("Outgoing payment grant has no interaction redirect".to_string()))?;
        if outgoing_grant.continuation.is_none() {
            return Err(AppError::Internal(
                "Outgoing payment grant has no continuation".to_string(),
            ));
        }

        self.pending
            .insert(
                session,
                PendingOutgoingGrant::new(client, outgoing_grant, sending_wallet, quote),
            )
            .await;

        info!("Interactive grant ready for session {}", session);

        Ok(redirect_url)
    }

    /// Complete the session's payment after the user approved the grant
    pub async fn finalize_payment(&self, session: &str) -> AppResult<OutgoingPayment> {
        let pending = self
            .pending
            .take(session)
            .await
            .ok_or(AppError::NoPendingGrant)?;

        match self.run_finalize_sequence(&pending).await {
            Ok(payment) => {
                match self.ledger.take(&pending.quote.receiver).await {
                    Some(meta) => info!(
                        "Payment {} completed: {} for '{}'",
                        payment.id, meta.amount, meta.memo
                    ),
                    None => info!("Payment {} completed", payment.id),
                }
                Ok(payment)
            }
            Err(e) => {
                if !self.pending.restore(session, pending).await {
                    warn!("Session {} started a new payment while finalizing", session);
                }
                Err(e)
            }
        }
    }

    async fn run_finalize_sequence(
        &self,
        pending: &PendingOutgoingGrant,
    ) -> AppResult<OutgoingPayment> {
        let continuation = pending.grant.continuation.as_ref().ok_or_else(|| {
            AppError::Internal("Pending grant has no continuation".to_string())
        })?;

        let finalized = pending
            .client
            .continue_grant(&continuation.uri, &continuation.access_token.value)
            .await?;

        if !is_finalized_grant(&finalized) {
            return Err(AppError::GrantNotFinalized);
        }
        let token = granted_token(&finalized, "Outgoing payment")?;

        let payment = pending
            .client
            .create_outgoing_payment(
                &pending.sending_wallet.resource_server,
                &token,
                &CreateOutgoingPayment {
                    wallet_address: pending.sending_wallet.id.clone(),
                    quote_id: pending.quote.id.clone(),
                },
            )
            .await?;

        Ok(payment)
    }
}
