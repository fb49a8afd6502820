//! Bearer-token guard for the admin surface (onboarding, removal, manual
//! rebuild). Competition admin is a single shared token; there are no
//! user accounts to log in.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::errors::AppError;

// Admin token - in production, load from environment
fn admin_token() -> String {
    std::env::var("ADMIN_TOKEN")
        .unwrap_or_else(|_| "zone-leader-dev-admin-token-change-in-production".to_string())
}

/// Extractor that rejects requests without the admin bearer token.
pub struct AdminUser;

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        if bearer.token() != admin_token() {
            return Err(AppError::Unauthorized);
        }

        Ok(AdminUser)
    }
}
