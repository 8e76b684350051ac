use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::types::{TransactionId, TransactionType, UserId, WalletId};

/// Payload published after a transaction-affecting commit. Mirrors the fields the original
/// notification service attached to an outbound email/push message, minus the rendering
/// concerns (subject line, template name) that belong to whatever consumes the sink.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub transaction_id: TransactionId,
    pub wallet_id: WalletId,
    pub related_wallet_id: Option<WalletId>,
    pub user_id: UserId,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DepositCompleted,
    WithdrawalCompleted,
    TransferInitiated,
    TransferAccepted,
    TransferRejected,
    TransferExpired,
    CashOutRequested,
    CashOutVerified,
    CashOutExpired,
}

/// Fire-and-forget delivery port. `publish` must never block or fail the caller's request path —
/// an implementation backed by a channel should treat a full buffer as a drop-and-log condition,
/// not a caller-visible error.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: NotificationEvent);
}
