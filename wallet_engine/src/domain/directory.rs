use async_trait::async_trait;

use crate::domain::error::EngineError;
use crate::domain::types::UserId;

/// Read-mostly mirror of the external identity system. The engine never owns user accounts;
/// it only needs to resolve a username to the `UserId` it provisions a wallet against, and to
/// learn about new users as they're created there.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserDirectory: Send + Sync {
    /// `NoSuchUser` if `username` is absent from the mirror.
    async fn resolve_username(&self, username: &str) -> Result<UserId, EngineError>;

    /// Upserts a mirrored identity record. Called both by the signal-driven provisioning path
    /// and by the init/backfill path that seeds the mirror from the identity system directly.
    async fn upsert(
        &self,
        user_id: UserId,
        username: &str,
        phone_number: &str,
        is_staff: bool,
    ) -> Result<(), EngineError>;
}
