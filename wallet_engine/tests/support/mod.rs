//! In-memory stand-ins for the Postgres-backed adapters, used to drive the facade through full
//! multi-step scenarios without a live database. Each fake commits nothing until
//! `AtomicUnit::commit` is called, mirroring the real transaction's rollback-on-drop behavior.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use wallet_engine::domain::directory::UserDirectory;
use wallet_engine::domain::entities::{Transaction, Wallet};
use wallet_engine::domain::error::EngineError;
use wallet_engine::domain::notification::{NotificationEvent, NotificationSink};
use wallet_engine::domain::repository::{
    AtomicUnit, AtomicUnitFactory, IdempotencyStore, LockedWallet, TransactionPage,
    TransactionRepository, WalletRepository,
};
use wallet_engine::domain::types::{Currency, TransactionId, TransactionStatus, UserId, WalletId};

#[derive(Default)]
struct Store {
    wallets: HashMap<WalletId, Wallet>,
    transactions: HashMap<TransactionId, Transaction>,
}

/// Shared ledger behind every fake repository and the fake atomic unit factory, so a scenario
/// can build one `Arc<Ledger>`, hand clones of the fakes to `WalletEngine::new`, and then
/// inspect final state directly.
#[derive(Clone, Default)]
pub struct Ledger(Arc<Mutex<Store>>);

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_wallet(&self, wallet: Wallet) {
        self.0.lock().unwrap().wallets.insert(wallet.id(), wallet);
    }

    pub fn wallet(&self, id: WalletId) -> Wallet {
        self.0.lock().unwrap().wallets.get(&id).cloned().unwrap()
    }

    pub fn transaction(&self, id: TransactionId) -> Transaction {
        self.0.lock().unwrap().transactions.get(&id).cloned().unwrap()
    }
}

pub struct FakeWalletRepository(pub Ledger);

#[async_trait]
impl WalletRepository for FakeWalletRepository {
    async fn get_or_create(
        &self,
        owner_user_id: UserId,
        phone_number: &str,
        currency: Currency,
    ) -> Result<Wallet, EngineError> {
        if let Ok(existing) = self.find_by_owner(owner_user_id).await {
            return Ok(existing);
        }
        let wallet = Wallet::builder()
            .owner_user_id(owner_user_id)
            .phone_number(phone_number.to_string())
            .currency(currency)
            .build()?;
        self.0 .0.lock().unwrap().wallets.insert(wallet.id(), wallet.clone());
        Ok(wallet)
    }

    async fn find_by_id(&self, id: WalletId) -> Result<Wallet, EngineError> {
        self.0
             .0
            .lock()
            .unwrap()
            .wallets
            .get(&id)
            .cloned()
            .ok_or(EngineError::NotFound)
    }

    async fn find_by_owner(&self, owner_user_id: UserId) -> Result<Wallet, EngineError> {
        self.0
             .0
            .lock()
            .unwrap()
            .wallets
            .values()
            .find(|w| w.owner_user_id() == owner_user_id)
            .cloned()
            .ok_or(EngineError::NotFound)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Wallet, EngineError> {
        self.0
             .0
            .lock()
            .unwrap()
            .wallets
            .values()
            .find(|w| w.phone_number() == phone_number)
            .cloned()
            .ok_or(EngineError::NotFound)
    }
}

pub struct FakeTransactionRepository(pub Ledger);

#[async_trait]
impl TransactionRepository for FakeTransactionRepository {
    async fn find_by_id(&self, id: TransactionId) -> Result<Transaction, EngineError> {
        self.0
             .0
            .lock()
            .unwrap()
            .transactions
            .get(&id)
            .cloned()
            .ok_or(EngineError::NotFound)
    }

    async fn find_transfer_legs(
        &self,
        reference: &str,
    ) -> Result<(Transaction, Transaction), EngineError> {
        let store = self.0 .0.lock().unwrap();
        let mut in_leg = None;
        let mut out_leg = None;
        for t in store.transactions.values().filter(|t| t.reference() == reference) {
            match t.transaction_type() {
                wallet_engine::domain::types::TransactionType::TransferIn => in_leg = Some(t.clone()),
                wallet_engine::domain::types::TransactionType::TransferOut => out_leg = Some(t.clone()),
                _ => {}
            }
        }
        match (in_leg, out_leg) {
            (Some(i), Some(o)) => Ok((i, o)),
            _ => Err(EngineError::NotFound),
        }
    }

    async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<TransactionPage, EngineError> {
        let store = self.0 .0.lock().unwrap();
        let mut items: Vec<Transaction> = store
            .transactions
            .values()
            .filter(|t| t.wallet_id() == wallet_id)
            .cloned()
            .collect();
        items.sort_by_key(|t| std::cmp::Reverse(t.created_at()));
        let total = items.len() as i64;
        let page = items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(TransactionPage { items: page, total })
    }

    async fn find_pending_past_expiry(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Transaction>, EngineError> {
        let store = self.0 .0.lock().unwrap();
        Ok(store
            .transactions
            .values()
            .filter(|t| {
                t.status() == TransactionStatus::Pending
                    && t.expiry_time().is_some_and(|e| e <= cutoff)
            })
            .cloned()
            .collect())
    }
}

pub struct FakeAtomicUnitFactory(pub Ledger);

#[async_trait]
impl AtomicUnitFactory for FakeAtomicUnitFactory {
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>, EngineError> {
        Ok(Box::new(FakeAtomicUnit {
            ledger: self.0.clone(),
            staged_wallets: HashMap::new(),
            staged_transactions: HashMap::new(),
        }))
    }
}

struct FakeAtomicUnit {
    ledger: Ledger,
    staged_wallets: HashMap<WalletId, Wallet>,
    staged_transactions: HashMap<TransactionId, Transaction>,
}

impl FakeAtomicUnit {
    fn wallet(&mut self, id: WalletId) -> Wallet {
        if let Some(w) = self.staged_wallets.get(&id) {
            return w.clone();
        }
        let w = self.ledger.wallet(id);
        self.staged_wallets.insert(id, w.clone());
        w
    }
}

#[async_trait]
impl AtomicUnit for FakeAtomicUnit {
    async fn lock_wallet(&mut self, id: WalletId) -> Result<LockedWallet, EngineError> {
        Ok(LockedWallet {
            wallet: self.wallet(id),
        })
    }

    async fn apply_delta(&mut self, id: WalletId, delta: Decimal) -> Result<(), EngineError> {
        let mut wallet = self.wallet(id);
        let new_balance = wallet.balance() + delta;
        if new_balance < Decimal::ZERO {
            return Err(EngineError::InsufficientFunds(id));
        }
        wallet = Wallet::reconstitute(
            wallet.id(),
            wallet.owner_user_id(),
            new_balance,
            wallet.currency(),
            wallet.phone_number().to_string(),
            wallet.is_active(),
            wallet.created_at(),
            chrono::Utc::now(),
        );
        self.staged_wallets.insert(id, wallet);
        Ok(())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), EngineError> {
        self.staged_transactions.insert(transaction.id(), transaction.clone());
        Ok(())
    }

    async fn update_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<(), EngineError> {
        let mut transaction = if let Some(t) = self.staged_transactions.get(&id) {
            t.clone()
        } else {
            self.ledger.transaction(id)
        };
        transaction = Transaction::reconstitute(
            transaction.id(),
            transaction.wallet_id(),
            transaction.related_wallet_id(),
            transaction.amount(),
            transaction.transaction_type(),
            transaction.funding_source(),
            transaction.reference().to_string(),
            status,
            transaction.created_at(),
            chrono::Utc::now(),
            transaction.expiry_time(),
        );
        self.staged_transactions.insert(id, transaction);
        Ok(())
    }

    async fn lock_pending_cash_out(
        &mut self,
        phone_number: &str,
        code: &str,
    ) -> Result<Option<(Transaction, LockedWallet)>, EngineError> {
        let candidate = {
            let store = self.ledger.0.lock().unwrap();
            store
                .transactions
                .values()
                .find(|t| {
                    t.status() == TransactionStatus::Pending && t.reference().ends_with(code)
                })
                .cloned()
        };
        let Some(transaction) = candidate else {
            return Ok(None);
        };
        let wallet = self.wallet(transaction.wallet_id());
        if wallet.phone_number() != phone_number {
            return Ok(None);
        }
        self.staged_transactions.insert(transaction.id(), transaction.clone());
        Ok(Some((transaction, LockedWallet { wallet })))
    }

    async fn commit(self: Box<Self>) -> Result<(), EngineError> {
        let mut store = self.ledger.0.lock().unwrap();
        for (id, wallet) in self.staged_wallets {
            store.wallets.insert(id, wallet);
        }
        for (id, transaction) in self.staged_transactions {
            store.transactions.insert(id, transaction);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUserDirectory(Mutex<HashMap<String, UserId>>);

impl FakeUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, username: &str, user_id: UserId) {
        self.0.lock().unwrap().insert(username.to_string(), user_id);
    }
}

#[async_trait]
impl UserDirectory for FakeUserDirectory {
    async fn resolve_username(&self, username: &str) -> Result<UserId, EngineError> {
        self.0
            .lock()
            .unwrap()
            .get(username)
            .copied()
            .ok_or_else(|| EngineError::NoSuchUser(username.to_string()))
    }

    async fn upsert(
        &self,
        user_id: UserId,
        username: &str,
        _phone_number: &str,
        _is_staff: bool,
    ) -> Result<(), EngineError> {
        self.0.lock().unwrap().insert(username.to_string(), user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotificationSink(pub Mutex<Vec<NotificationEvent>>);

impl FakeNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for FakeNotificationSink {
    async fn publish(&self, event: NotificationEvent) {
        self.0.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub struct FakeIdempotencyStore(Mutex<HashMap<(String, String), Option<String>>>);

impl FakeIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for FakeIdempotencyStore {
    async fn try_claim(&self, scope: &str, key: &str) -> Result<bool, EngineError> {
        let mut map = self.0.lock().unwrap();
        let k = (scope.to_string(), key.to_string());
        if map.contains_key(&k) {
            return Ok(false);
        }
        map.insert(k, None);
        Ok(true)
    }

    async fn store_response(&self, scope: &str, key: &str, response: &str) -> Result<(), EngineError> {
        self.0
            .lock()
            .unwrap()
            .insert((scope.to_string(), key.to_string()), Some(response.to_string()));
        Ok(())
    }

    async fn fetch_response(&self, scope: &str, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .get(&(scope.to_string(), key.to_string()))
            .cloned()
            .flatten())
    }
}
