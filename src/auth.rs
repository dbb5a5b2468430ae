use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;

pub const ADMIN_ROLE: &str = "admin";

/// Authenticated principal extracted from the upstream auth layer.
///
/// Token issuance and verification happen upstream; this service trusts the
/// `x-user-id` and `x-user-role` headers injected by that layer and only
/// enforces role and ownership checks.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Admin-route guard.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "user {} is not an admin",
                self.user_id
            )))
        }
    }

    /// Ownership guard, repeated on every read/write touching a purchase.
    pub fn require_owner(&self, owner_id: Uuid, resource: &str) -> Result<(), AppError> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "user {} does not own {}",
                self.user_id, resource
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing x-user-id header".to_string()))?;

        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AppError::Unauthorized("x-user-id is not a valid UUID".to_string()))?;

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("user")
            .to_string();

        Ok(AuthUser { user_id, role })
    }
}
