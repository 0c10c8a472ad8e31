// Amount and memo of payments in flight, keyed by incoming-payment id.
// Open Payments servers reject free-text descriptions on incoming payments,
// so the memo only lives here.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMeta {
    pub amount: String,
    pub memo: String,
}

struct Entry {
    meta: PaymentMeta,
    inserted_at: Instant,
}

/// Bounded map with time-to-live eviction
pub struct PaymentLedger {
    entries: Mutex<HashMap<String, Entry>>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl Entry {
    fn is_live(&self, ttl: Option<Duration>) -> bool {
        ttl.map(|ttl| self.inserted_at.elapsed() < ttl).unwrap_or(true)
    }
}

impl PaymentLedger {
    /// `ttl` of `None` keeps entries until they are taken or evicted
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub async fn record(&self, incoming_payment_id: &str, meta: PaymentMeta) {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| e.is_live(self.ttl));

        if entries.len() >= self.capacity && !entries.contains_key(incoming_payment_id) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                debug!("Payment ledger full, evicting {}", id);
                entries.remove(&id);
            }
        }

        entries.insert(
            incoming_payment_id.to_string(),
            Entry {
                meta,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn take(&self, incoming_payment_id: &str) -> Option<PaymentMeta> {
        let mut entries = self.entries.lock().await;
        entries
            .remove(incoming_payment_id)
            .filter(|e| e.is_live(self.ttl))
            .map(|e| e.meta)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
