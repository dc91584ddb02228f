//! Bearer-token authentication helpers.
//!
//! Handlers call [`require_user`] once at the top; the resolved
//! [`AuthedUser`] carries the explicit role and profile id, so no handler
//! ever infers a role from which profile rows happen to exist.

use axum::http::{header, HeaderMap};
use odk_db::accounts::{self, AuthedUser};
use odk_db::UserRole;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve `Authorization: Bearer <token>` to a user, or 401.
pub async fn require_user(st: &AppState, headers: &HeaderMap) -> Result<AuthedUser, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    let token = Uuid::parse_str(token).map_err(|_| ApiError::Unauthorized)?;
    accounts::authenticate(&st.db, token)
        .await?
        .ok_or(ApiError::Unauthorized)
}

/// The caller's restaurant profile id, or 403 for customers.
pub fn require_restaurant(user: &AuthedUser) -> Result<Uuid, ApiError> {
    match (user.role, user.restaurant_id) {
        (UserRole::Restaurant, Some(id)) => Ok(id),
        _ => Err(ApiError::Forbidden("a restaurant account is required")),
    }
}

/// The caller's customer profile id, or 403 for restaurants.
pub fn require_customer(user: &AuthedUser) -> Result<Uuid, ApiError> {
    match (user.role, user.customer_id) {
        (UserRole::Customer, Some(id)) => Ok(id),
        _ => Err(ApiError::Forbidden("a customer account is required")),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
