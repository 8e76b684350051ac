//! Value types shared by entities, repositories and the API layer.

pub use common::{Currency, TransactionId, UserId, WalletId};
use serde::{Deserialize, Serialize};

/// Direction/purpose of a ledger row. Credits `wallet_id` (DEPOSIT, TRANSFER_IN) or debits it
/// (WITHDRAWAL, TRANSFER_OUT) — the sign is always derived from this, never from `amount` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl TransactionType {
    /// `true` if this leg credits (adds to) `wallet_id`'s balance.
    pub fn is_credit(self) -> bool {
        matches!(self, TransactionType::Deposit | TransactionType::TransferIn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "funding_source", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundingSource {
    Paysend,
    BlfAtm,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Failed,
    Expired,
}

/// The two actions a recipient may take on a pending transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferAction {
    Accept,
    Reject,
}
