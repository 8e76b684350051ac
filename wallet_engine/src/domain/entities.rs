use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;
use crate::domain::types::{
    Currency, FundingSource, TransactionId, TransactionStatus, TransactionType, UserId, WalletId,
};

/// A user's single money-holding account.
///
/// # Examples
/// ```
/// use wallet_engine::domain::entities::Wallet;
/// use wallet_engine::domain::types::{Currency, UserId};
///
/// let wallet = Wallet::builder()
///     .owner_user_id(UserId::new())
///     .phone_number("96170123456".to_string())
///     .currency(Currency::Usd)
///     .build()
///     .unwrap();
/// assert!(wallet.balance().is_zero());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    id: WalletId,
    owner_user_id: UserId,
    balance: Decimal,
    currency: Currency,
    phone_number: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn builder() -> WalletBuilder {
        WalletBuilder::default()
    }

    /// Reconstructs a wallet loaded from persistence. Skips the construction-time validation
    /// that `builder()` performs since a persisted row was valid when it was written.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: WalletId,
        owner_user_id: UserId,
        balance: Decimal,
        currency: Currency,
        phone_number: String,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_user_id,
            balance,
            currency,
            phone_number,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> WalletId {
        self.id
    }

    pub fn owner_user_id(&self) -> UserId {
        self.owner_user_id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Default)]
pub struct WalletBuilder {
    owner_user_id: Option<UserId>,
    phone_number: Option<String>,
    currency: Option<Currency>,
}

impl WalletBuilder {
    pub fn owner_user_id(mut self, owner_user_id: UserId) -> Self {
        self.owner_user_id = Some(owner_user_id);
        self
    }

    pub fn phone_number(mut self, phone_number: String) -> Self {
        self.phone_number = Some(phone_number);
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn build(self) -> Result<Wallet, EngineError> {
        let owner_user_id = self
            .owner_user_id
            .ok_or_else(|| EngineError::InvalidData("owner_user_id is required".into()))?;
        let phone_number = self
            .phone_number
            .ok_or_else(|| EngineError::InvalidData("phone_number is required".into()))?;
        let currency = self
            .currency
            .ok_or_else(|| EngineError::InvalidData("currency is required".into()))?;

        if phone_number.trim().is_empty() {
            return Err(EngineError::InvalidData(
                "phone_number cannot be blank".into(),
            ));
        }

        let now = Utc::now();
        Ok(Wallet {
            id: WalletId::new(),
            owner_user_id,
            balance: Decimal::ZERO,
            currency,
            phone_number,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

/// One leg of a money movement. Deposits and immediate withdrawals produce a single row;
/// transfers always produce two sharing a `reference` (see [`TransactionType`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    wallet_id: WalletId,
    related_wallet_id: Option<WalletId>,
    amount: Decimal,
    transaction_type: TransactionType,
    funding_source: Option<FundingSource>,
    reference: String,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expiry_time: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Validates the shape every constructor below must satisfy: a positive magnitude, and an
    /// `expiry_time` present exactly when the initial status can transition to EXPIRED.
    fn validate(amount: Decimal, status: TransactionStatus, expiry_time: Option<DateTime<Utc>>) -> Result<(), EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::NonPositiveAmount);
        }
        let expirable = matches!(status, TransactionStatus::Pending);
        if expirable != expiry_time.is_some() {
            return Err(EngineError::InvalidData(
                "expiry_time must be set iff the initial status is PENDING".into(),
            ));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallet_id: WalletId,
        related_wallet_id: Option<WalletId>,
        amount: Decimal,
        transaction_type: TransactionType,
        funding_source: Option<FundingSource>,
        reference: String,
        status: TransactionStatus,
        expiry_time: Option<DateTime<Utc>>,
    ) -> Result<Self, EngineError> {
        Self::validate(amount, status, expiry_time)?;
        let now = Utc::now();
        Ok(Self {
            id: TransactionId::new(),
            wallet_id,
            related_wallet_id,
            amount,
            transaction_type,
            funding_source,
            reference,
            status,
            created_at: now,
            updated_at: now,
            expiry_time,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TransactionId,
        wallet_id: WalletId,
        related_wallet_id: Option<WalletId>,
        amount: Decimal,
        transaction_type: TransactionType,
        funding_source: Option<FundingSource>,
        reference: String,
        status: TransactionStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        expiry_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            wallet_id,
            related_wallet_id,
            amount,
            transaction_type,
            funding_source,
            reference,
            status,
            created_at,
            updated_at,
            expiry_time,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn wallet_id(&self) -> WalletId {
        self.wallet_id
    }

    pub fn related_wallet_id(&self) -> Option<WalletId> {
        self.related_wallet_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn funding_source(&self) -> Option<FundingSource> {
        self.funding_source
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn expiry_time(&self) -> Option<DateTime<Utc>> {
        self.expiry_time
    }

    /// The other participant's user id, if this leg has a counterparty wallet. Resolving the
    /// wallet id to a user id is the caller's job (it needs a wallet lookup); this just tells
    /// the caller whether one exists.
    pub fn has_counterparty(&self) -> bool {
        self.related_wallet_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_builder_rejects_blank_phone_number() {
        let result = Wallet::builder()
            .owner_user_id(UserId::new())
            .phone_number("   ".to_string())
            .currency(Currency::Usd)
            .build();
        assert!(matches!(result, Err(EngineError::InvalidData(_))));
    }

    #[test]
    fn wallet_builder_starts_at_zero_balance_and_active() {
        let wallet = Wallet::builder()
            .owner_user_id(UserId::new())
            .phone_number("96170123456".to_string())
            .currency(Currency::Eur)
            .build()
            .unwrap();
        assert_eq!(wallet.balance(), Decimal::ZERO);
        assert!(wallet.is_active());
    }

    #[test]
    fn transaction_new_rejects_non_positive_amount() {
        let result = Transaction::new(
            WalletId::new(),
            None,
            Decimal::ZERO,
            TransactionType::Deposit,
            Some(FundingSource::Paysend),
            "Paysend: tx1".into(),
            TransactionStatus::Completed,
            None,
        );
        assert!(matches!(result, Err(EngineError::NonPositiveAmount)));
    }

    #[test]
    fn transaction_new_requires_expiry_time_on_pending() {
        let result = Transaction::new(
            WalletId::new(),
            Some(WalletId::new()),
            Decimal::new(10000, 2),
            TransactionType::TransferOut,
            None,
            "TRANSFER-deadbeef".into(),
            TransactionStatus::Pending,
            None,
        );
        assert!(matches!(result, Err(EngineError::InvalidData(_))));
    }
}
