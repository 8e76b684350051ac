use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::repository::TransactionPage;
use crate::domain::types::WalletId;

#[derive(Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    wallet_id: WalletId,
    page: i64,
    page_size: i64,
}

struct Entry {
    page: TransactionPage,
    expires_at: Instant,
}

/// Process-local cache of paginated transaction listings, keyed by `(wallet_id, page,
/// page_size)`. Entries expire after `ttl` and can also be invalidated exactly (no glob match
/// needed) through a reverse index from `wallet_id` to its cached keys — the in-process
/// equivalent of the original system's `cache.delete_pattern`. Indexed by wallet rather than
/// owning user: every write site already has the wallet id in hand and a wallet has exactly one
/// owner, so the two are interchangeable here.
pub struct TransactionListCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
    keys_by_wallet: Mutex<HashMap<WalletId, HashSet<CacheKey>>>,
}

impl TransactionListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            keys_by_wallet: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(
        &self,
        wallet_id: WalletId,
        page: i64,
        page_size: i64,
    ) -> Option<TransactionPage> {
        let key = CacheKey {
            wallet_id,
            page,
            page_size,
        };
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.page.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, wallet_id: WalletId, page: i64, page_size: i64, value: TransactionPage) {
        let key = CacheKey {
            wallet_id,
            page,
            page_size,
        };
        self.entries.lock().expect("cache mutex poisoned").insert(
            key.clone(),
            Entry {
                page: value,
                expires_at: Instant::now() + self.ttl,
            },
        );
        self.keys_by_wallet
            .lock()
            .expect("cache mutex poisoned")
            .entry(wallet_id)
            .or_default()
            .insert(key);
    }

    /// Drops every cached page for `wallet_id`. Called after any write that touches this
    /// wallet's transaction history (its own transaction, or the counterparty side of a
    /// transfer).
    pub fn invalidate_wallet(&self, wallet_id: WalletId) {
        let Some(keys) = self
            .keys_by_wallet
            .lock()
            .expect("cache mutex poisoned")
            .remove(&wallet_id)
        else {
            return;
        };
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        for key in keys {
            entries.remove(&key);
        }
    }
}
