use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};

use crate::domain::notification::{NotificationEvent, NotificationSink};

/// Fire-and-forget sink over a bounded `tokio::mpsc` channel. `publish` never awaits back
/// pressure from the consumer: a full channel means the consumer is falling behind, and this
/// logs and drops rather than stalling the command path that just committed.
pub struct ChannelNotificationSink {
    sender: Sender<NotificationEvent>,
}

impl ChannelNotificationSink {
    pub fn new(capacity: usize) -> (Self, Receiver<NotificationEvent>) {
        let (sender, receiver) = tokio::sync::mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl NotificationSink for ChannelNotificationSink {
    async fn publish(&self, event: NotificationEvent) {
        if let Err(err) = self.sender.try_send(event) {
            tracing::warn!(error = %err, "dropping notification event, channel full or closed");
        }
    }
}

/// Drains events and logs them. Stands in for the real delivery mechanism (email/push/SMS);
/// swap the body of the loop for an actual transport without touching callers of
/// [`NotificationSink::publish`].
pub async fn run_notification_consumer(mut receiver: Receiver<NotificationEvent>) {
    while let Some(event) = receiver.recv().await {
        tracing::info!(
            kind = ?event.kind,
            transaction_id = %event.transaction_id,
            wallet_id = %event.wallet_id,
            user_id = %event.user_id,
            amount = %event.amount,
            reference = %event.reference,
            "notification event"
        );
    }
}
