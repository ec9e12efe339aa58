//! Caller identity
//!
//! Authentication happens upstream; the auth middleware forwards the
//! verified user through `x-user-id` / `x-user-role` headers and we
//! trust them. Ownership rule: non-admin callers may only act on their
//! own resources.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;
use perpetua_ledger::Role;

use crate::error::ApiError;

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
pub const USER_ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");

#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn can_act_for(&self, user_id: &str) -> bool {
        self.role == Role::Admin || self.user_id == user_id
    }

    /// Self-or-admin ownership check.
    pub fn require_self_or_admin(&self, user_id: &str) -> Result<(), ApiError> {
        if self.can_act_for(user_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Unauthorized access".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Unauthorized("Missing x-user-id header".to_string()))?;

        let role = match parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some("admin") => Role::Admin,
            _ => Role::Member,
        };

        Ok(Identity { user_id, role })
    }
}

/// Identity for endpoints that work with or without a caller (e.g. the
/// proposal list attaches the viewer's own vote when known).
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(
            Identity::from_request_parts(parts, state).await.ok(),
        ))
    }
}
