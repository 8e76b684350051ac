use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::types::{TransactionId, TransferAction};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    pub phone_number: String,
    /// ISO-ish currency code (`USD`, `EUR`, `GBP`, `LBP`).
    pub currency: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub recipient_username: String,
    pub amount: Decimal,
    /// Accepted for forward compatibility with a caller-supplied idempotency reference; the
    /// engine always mints its own reference for a transfer, so this is presently unused.
    pub reference: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    pub message: String,
    pub reference: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessActionRequest {
    pub action: TransferAction,
    pub reference: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessActionResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CashOutRequestRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CashOutRequestResponse {
    pub withdrawal_code: String,
    pub amount: Decimal,
    pub phone_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CashOutVerifyRequest {
    pub phone_number: String,
    pub withdrawal_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CashOutVerifyResponse {
    pub status: &'static str,
    pub amount: Decimal,
    pub transaction_id: TransactionId,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListTransactionsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}
