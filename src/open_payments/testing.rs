// Deterministic in-memory Open Payments client for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::*;

pub const SENDER_URL: &str = "https://wallet.test/alice";
pub const RECEIVER_URL: &str = "https://wallet.test/bob";
pub const REDIRECT_URL: &str = "https://auth.test/interact/xyz";
pub const QUOTE_ID: &str = "https://rs.test/alice/quotes/q-1";
pub const INCOMING_ID: &str = "https://rs.test/bob/incoming-payments/in-1";
pub const OUTGOING_ID: &str = "https://rs.test/alice/outgoing-payments/out-1";

/// Step of the payment sequence a stub can be told to fail at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    WalletAddress,
    RequestGrant,
    ContinueGrant,
    IncomingPayment,
    Quote,
    OutgoingPayment,
}

#[derive(Default)]
pub struct StubClient {
    calls: Mutex<Vec<Step>>,
    failures: Mutex<Vec<(Step, OpenPaymentsError)>>,
    approved: AtomicBool,
    grant_counter: AtomicUsize,
}

impl StubClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_at(&self, step: Step, error: OpenPaymentsError) {
        self.failures.lock().unwrap().push((step, error));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Simulate the user accepting the interactive grant
    pub fn approve(&self) {
        self.approved.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Step> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, step: Step) -> OpenPaymentsResult<()> {
        self.calls.lock().unwrap().push(step);
        let failures = self.failures.lock().unwrap();
        match failures.iter().find(|(s, _)| *s == step) {
            Some((_, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn amount(value: &str) -> Amount {
        Amount {
            value: value.to_string(),
            asset_code: "USD".to_string(),
            asset_scale: 2,
        }
    }

    fn finalized(token: &str) -> Grant {
        Grant {
            access_token: Some(AccessToken {
                value: token.to_string(),
                manage: None,
                expires_in: None,
                access: vec![],
            }),
            interact: None,
            continuation: None,
        }
    }

    fn pending() -> Grant {
        Grant {
            access_token: None,
            interact: Some(Interaction {
                redirect: REDIRECT_URL.to_string(),
                finish: None,
            }),
            continuation: Some(Continuation {
                access_token: ContinueToken {
                    value: "continue-token".to_string(),
                },
                uri: "https://auth.test/continue/xyz".to_string(),
                wait: None,
            }),
        }
    }
}

#[async_trait]
impl OpenPaymentsClient for StubClient {
    async fn wallet_address(&self, url: &str) -> OpenPaymentsResult<WalletAddress> {
        self.record(Step::WalletAddress)?;
        Ok(WalletAddress {
            id: url.to_string(),
            public_name: None,
            asset_code: "USD".to_string(),
            asset_scale: 2,
            auth_server: format!("{}/auth", url),
            resource_server: format!("{}/rs", url),
        })
    }

    async fn request_grant(
        &self,
        _auth_server: &str,
        request: &GrantRequest,
    ) -> OpenPaymentsResult<Grant> {
        self.record(Step::RequestGrant)?;
        let n = self.grant_counter.fetch_add(1, Ordering::SeqCst);
        if request.interact.is_some() {
            Ok(Self::pending())
        } else {
            Ok(Self::finalized(&format!("grant-token-{}", n)))
        }
    }

    async fn continue_grant(&self, _uri: &str, _access_token: &str) -> OpenPaymentsResult<Grant> {
        self.record(Step::ContinueGrant)?;
        if self.approved.load(Ordering::SeqCst) {
            Ok(Self::finalized("outgoing-token"))
        } else {
            Ok(Self::pending())
        }
    }

    async fn create_incoming_payment(
        &self,
        _resource_server: &str,
        _access_token: &str,
        body: &CreateIncomingPayment,
    ) -> OpenPaymentsResult<IncomingPayment> {
        self.record(Step::IncomingPayment)?;
        Ok(IncomingPayment {
            id: INCOMING_ID.to_string(),
            wallet_address: body.wallet_address.clone(),
            incoming_amount: body.incoming_amount.clone(),
            received_amount: Some(Self::amount("0")),
            completed: false,
            extra: Default::default(),
        })
    }

    async fn create_quote(
        &self,
        _resource_server: &str,
        _access_token: &str,
        body: &CreateQuote,
    ) -> OpenPaymentsResult<Quote> {
        self.record(Step::Quote)?;
        Ok(Quote {
            id: QUOTE_ID.to_string(),
            wallet_address: body.wallet_address.clone(),
            receiver: body.receiver.clone(),
            debit_amount: Self::amount("105"),
            receive_amount: Self::amount("100"),
            method: Some(body.method.clone()),
            extra: Default::default(),
        })
    }

    async fn create_outgoing_payment(
        &self,
        _resource_server: &str,
        access_token: &str,
        body: &CreateOutgoingPayment,
    ) -> OpenPaymentsResult<OutgoingPayment> {
        self.record(Step::OutgoingPayment)?;
        assert_eq!(access_token, "outgoing-token");
        Ok(OutgoingPayment {
            id: OUTGOING_ID.to_string(),
            wallet_address: body.wallet_address.clone(),
            quote_id: Some(body.quote_id.clone()),
            receiver: INCOMING_ID.to_string(),
            debit_amount: Some(Self::amount("105")),
            receive_amount: Some(Self::amount("100")),
            sent_amount: Some(Self::amount("0")),
            failed: false,
            extra: Default::default(),
        })
    }
}

/// Provider that always hands out the same stub
pub struct StubProvider {
    pub client: Arc<StubClient>,
}

impl StubProvider {
    pub fn new(client: Arc<StubClient>) -> Arc<Self> {
        Arc::new(Self { client })
    }
}

#[async_trait]
impl ClientProvider for StubProvider {
    async fn authenticated_client(&self) -> OpenPaymentsResult<Arc<dyn OpenPaymentsClient>> {
        Ok(self.client.clone())
    }
}
