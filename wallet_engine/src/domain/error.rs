use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::types::{TransactionId, UserId, WalletId};

/// Every caller-visible failure mode of the engine. Each variant maps to exactly one HTTP
/// status in `api::error` — this enum, not the HTTP layer, is the source of truth for what
/// went wrong. Derives `Serialize`/`Deserialize` so an idempotency store can persist a
/// terminal failure the same way it persists a success, letting a retry replay the original
/// error instead of finding its key permanently claimed.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum EngineError {
    #[error("wallet {0} has insufficient funds for this operation")]
    InsufficientFunds(WalletId),

    #[error("withdrawal code is not valid")]
    InvalidCode,

    #[error("this transaction has expired")]
    Expired,

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("a wallet cannot transfer to itself")]
    SelfTransfer,

    #[error("no such user: {0}")]
    NoSuchUser(String),

    #[error("a wallet already exists for user {0}")]
    AlreadyExists(UserId),

    #[error("not found")]
    NotFound,

    #[error("caller does not own transaction {0}")]
    NotOwner(TransactionId),

    #[error("unauthorized")]
    Unauthorized,

    #[error("caller is not entitled to view this resource")]
    Forbidden,

    #[error("phone number {0} is already bound to another wallet")]
    DuplicatePhone(String),

    #[error("invalid request: {0}")]
    InvalidData(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => EngineError::NotFound,
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if db_err.constraint() == Some("wallets_phone_number_key") {
                    EngineError::DuplicatePhone(message.to_string())
                } else if db_err.constraint() == Some("wallets_balance_non_negative") {
                    EngineError::Internal(
                        "balance constraint violated outside a held lock".into(),
                    )
                } else {
                    EngineError::Internal(message.to_string())
                }
            }
            other => EngineError::Internal(other.to_string()),
        }
    }
}
