//! Small helpers shared by use cases that don't belong to any one domain concept.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;

/// Eight uppercase hex characters, taken from a fresh UUIDv4. Used both for the withdrawal
/// code presented to cash-out users and for the random suffix of a transfer's reference.
pub fn short_hex_code() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    raw[..8].to_uppercase()
}

/// What an idempotency-wrapped use case persists under a claimed key: either the response a
/// caller got, or the terminal error it got instead. Storing the failure too means a retry
/// (even one sent after the underlying problem is fixed) replays the original outcome rather
/// than finding the key claimed forever with no response ever recorded against it.
#[derive(Serialize, Deserialize)]
enum StoredOutcome<T> {
    Ok(T),
    Err(EngineError),
}

/// Serializes either branch of a use case's result for storage under a claimed idempotency key.
pub fn encode_outcome<T: Serialize>(outcome: &Result<T, EngineError>) -> Result<String, EngineError>
where
    T: Clone,
{
    let stored = match outcome {
        Ok(value) => StoredOutcome::Ok(value.clone()),
        Err(err) => StoredOutcome::Err(clone_error(err)),
    };
    serde_json::to_string(&stored).map_err(|e| EngineError::Internal(e.to_string()))
}

/// Replays a previously stored response: the caller gets back exactly what the first request
/// that actually did the work produced, success or failure.
pub fn decode_outcome<T: DeserializeOwned>(stored: &str) -> Result<T, EngineError> {
    let stored: StoredOutcome<T> =
        serde_json::from_str(stored).map_err(|e| EngineError::Internal(e.to_string()))?;
    match stored {
        StoredOutcome::Ok(value) => Ok(value),
        StoredOutcome::Err(err) => Err(err),
    }
}

/// `EngineError` isn't `Clone` (propagating it by value everywhere it's used is the common
/// case); round-tripping it through its own `Serialize`/`Deserialize` impl is how
/// [`encode_outcome`] gets an owned copy to store while still returning the original to the
/// caller.
fn clone_error(err: &EngineError) -> EngineError {
    let encoded = serde_json::to_string(err).expect("EngineError always serializes");
    serde_json::from_str(&encoded).expect("EngineError always round-trips")
}
