use std::net::IpAddr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;
use crate::domain::repository::IdempotencyStore;
use crate::domain::types::FundingSource;
use crate::infrastructure::webhook::signature;
use crate::support::{decode_outcome, encode_outcome};
use crate::use_cases::deposit::DepositUseCase;

const IDEMPOTENCY_SCOPE: &str = "webhook:paysend-deposit";

#[derive(Debug, Deserialize)]
pub struct WebhookRecipient {
    pub phone_number: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    pub status: String,
    pub recipient: WebhookRecipient,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "status")]
pub enum WebhookOutcome {
    #[serde(rename = "processed")]
    Processed { transaction_id: String },
    #[serde(rename = "ignored")]
    Ignored,
}

/// Verifies the HMAC signature and source IP of a deposit notification, wraps the call in
/// idempotency, and invokes [`DepositUseCase`]. Owns none of the money-movement logic itself —
/// it's purely the adapter between an untrusted external caller and the engine.
pub struct IngestDepositWebhookUseCase {
    deposit: Arc<DepositUseCase>,
    idempotency: Arc<dyn IdempotencyStore>,
    webhook_secret: String,
    ip_whitelist: Vec<IpAddr>,
}

impl IngestDepositWebhookUseCase {
    pub fn new(
        deposit: Arc<DepositUseCase>,
        idempotency: Arc<dyn IdempotencyStore>,
        webhook_secret: String,
        ip_whitelist: Vec<IpAddr>,
    ) -> Self {
        Self {
            deposit,
            idempotency,
            webhook_secret,
            ip_whitelist,
        }
    }

    #[tracing::instrument(name = "IngestDepositWebhookUseCase::execute", skip(self, raw_body))]
    pub async fn execute(
        &self,
        source_ip: IpAddr,
        signature_header: &str,
        idempotency_key: &str,
        raw_body: &[u8],
    ) -> Result<WebhookOutcome, EngineError> {
        if !self.ip_whitelist.contains(&source_ip) {
            return Err(EngineError::Unauthorized);
        }
        if !signature::verify(&self.webhook_secret, raw_body, signature_header) {
            return Err(EngineError::Unauthorized);
        }

        if let Some(stored) = self
            .idempotency
            .fetch_response(IDEMPOTENCY_SCOPE, idempotency_key)
            .await?
        {
            return decode_outcome(&stored);
        }

        let claimed = self
            .idempotency
            .try_claim(IDEMPOTENCY_SCOPE, idempotency_key)
            .await?;
        if !claimed {
            // Lost the claim race; the winner is still processing. The caller's retry will
            // eventually observe the stored response once it lands.
            return Err(EngineError::Internal(
                "idempotency key is being processed by a concurrent request".into(),
            ));
        }

        let outcome = self.process(raw_body).await;

        // Persist whichever branch we got, not only success — otherwise a malformed body or a
        // failed deposit (e.g. WalletNotFound) leaves the key claimed forever with no response
        // ever recorded against it, and every retry (even a corrected one) misreports as
        // "in progress" instead of replaying or re-attempting the original failure.
        if let Ok(serialized) = encode_outcome(&outcome) {
            let _ = self
                .idempotency
                .store_response(IDEMPOTENCY_SCOPE, idempotency_key, &serialized)
                .await;
        }

        outcome
    }

    async fn process(&self, raw_body: &[u8]) -> Result<WebhookOutcome, EngineError> {
        let body: WebhookBody = serde_json::from_slice(raw_body)
            .map_err(|e| EngineError::InvalidData(e.to_string()))?;

        if body.status != "COMPLETED" {
            return Ok(WebhookOutcome::Ignored);
        }

        let reference = format!("Paysend: {}", body.transaction_id);
        let transaction = self
            .deposit
            .execute(
                &body.recipient.phone_number,
                body.recipient.amount,
                FundingSource::Paysend,
                reference,
            )
            .await?;

        Ok(WebhookOutcome::Processed {
            transaction_id: transaction.id().to_string(),
        })
    }
}
