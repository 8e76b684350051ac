use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::str::FromStr;

use crate::api::error::ApiError;
use crate::domain::error::EngineError;
use crate::domain::types::UserId;

/// The identity system sits outside this crate's scope; in its place, every mutating and
/// owner-scoped route trusts an `X-User-Id` header set by whatever sits in front of it (a
/// gateway or the identity collaborator itself). Every sensitive operation still re-verifies
/// ownership against the wallet/transaction rows it touches — this extractor only establishes
/// who is asking, never what they're allowed to do.
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .ok_or(ApiError(EngineError::Unauthorized))?;

        let raw = header.to_str().map_err(|_| ApiError(EngineError::Unauthorized))?;
        let user_id = UserId::from_str(raw).map_err(|_| ApiError(EngineError::Unauthorized))?;

        Ok(AuthenticatedUser(user_id))
    }
}
