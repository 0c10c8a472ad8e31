// Outgoing-payment grants waiting for the user's approval, keyed by session

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::open_payments::{Grant, OpenPaymentsClient, Quote, WalletAddress};

/// Session used when the caller does not name one
pub const DEFAULT_SESSION: &str = "default";

/// Everything FinalizePayment needs to pick up where RequestPayment stopped
#[derive(Clone)]
pub struct PendingOutgoingGrant {
    pub client: Arc<dyn OpenPaymentsClient>,
    pub grant: Grant,
    pub sending_wallet: WalletAddress,
    pub quote: Quote,
    pub created_at: Instant,
}

impl PendingOutgoingGrant {
    pub fn new(
        client: Arc<dyn OpenPaymentsClient>,
        grant: Grant,
        sending_wallet: WalletAddress,
        quote: Quote,
    ) -> Self {
        Self {
            client,
            grant,
            sending_wallet,
            quote,
            created_at: Instant::now(),
        }
    }
}

pub struct PendingGrantStore {
    slots: Mutex<HashMap<String, PendingOutgoingGrant>>,
    ttl: Option<Duration>,
}

impl PendingGrantStore {
    /// `ttl` of `None` keeps grants until they are finalized or replaced
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn is_expired(&self, grant: &PendingOutgoingGrant) -> bool {
        self.ttl
            .map(|ttl| grant.created_at.elapsed() >= ttl)
            .unwrap_or(false)
    }

    fn purge_expired(&self, slots: &mut HashMap<String, PendingOutgoingGrant>) {
        let before = slots.len();
        slots.retain(|_, grant| !self.is_expired(grant));
        if slots.len() < before {
            debug!("Dropped {} expired pending grant(s)", before - slots.len());
        }
    }

    /// Store a grant, returning true if it replaced one
    pub async fn insert(&self, session: &str, grant: PendingOutgoingGrant) -> bool {
        let mut slots = self.slots.lock().await;
        self.purge_expired(&mut slots);
        let replaced = slots.insert(session.to_string(), grant).is_some();
        if replaced {
            warn!(
                "Pending grant for session '{}' replaced before it was finalized",
                session
            );
        }
        replaced
    }

    /// Remove and return the session's grant
    pub async fn take(&self, session: &str) -> Option<PendingOutgoingGrant> {
        let mut slots = self.slots.lock().await;
        self.purge_expired(&mut slots);
        slots.remove(session)
    }

    /// Put a grant back unless the session has been given a newer one
    pub async fn restore(&self, session: &str, grant: PendingOutgoingGrant) -> bool {
        let mut slots = self.slots.lock().await;
        if slots.contains_key(session) {
            return false;
        }
        slots.insert(session.to_string(), grant);
        true
    }

    pub async fn contains(&self, session: &str) -> bool {
        let mut slots = self.slots.lock().await;
        self.purge_expired(&mut slots);
        slots.contains_key(session)
    }

    pub async fn len(&self) -> usize {
        let mut slots = self.slots.lock().await;
        self.purge_expired(&mut slots);
        slots.len()
    }
}
