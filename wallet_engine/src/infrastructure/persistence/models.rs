use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::domain::entities::{Transaction, Wallet};
use crate::domain::types::{
    Currency, FundingSource, TransactionId, TransactionStatus, TransactionType, UserId, WalletId,
};

#[derive(Debug, FromRow)]
pub struct WalletModel {
    pub id: WalletId,
    pub owner_user_id: UserId,
    pub balance: Decimal,
    pub currency: Currency,
    pub phone_number: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WalletModel> for Wallet {
    fn from(m: WalletModel) -> Self {
        Wallet::reconstitute(
            m.id,
            m.owner_user_id,
            m.balance,
            m.currency,
            m.phone_number,
            m.is_active,
            m.created_at,
            m.updated_at,
        )
    }
}

#[derive(Debug, FromRow)]
pub struct TransactionModel {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    pub related_wallet_id: Option<WalletId>,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub funding_source: Option<FundingSource>,
    pub reference: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expiry_time: Option<DateTime<Utc>>,
}

impl From<TransactionModel> for Transaction {
    fn from(m: TransactionModel) -> Self {
        Transaction::reconstitute(
            m.id,
            m.wallet_id,
            m.related_wallet_id,
            m.amount,
            m.transaction_type,
            m.funding_source,
            m.reference,
            m.status,
            m.created_at,
            m.updated_at,
            m.expiry_time,
        )
    }
}
