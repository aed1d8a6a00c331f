//! Request owner extraction.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use webcode_core::owner::Owner;

use super::response::ApiError;
use crate::app::AppState;

/// The username a request acts for.
///
/// Read from the configured identity header; a missing, blank or non-UTF-8
/// header falls back to the configured default user.
#[derive(Debug, Clone)]
pub struct RequestOwner(pub Owner);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequestOwner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(state.identity.header.as_str())
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Owner::new(value).ok())
            .unwrap_or_else(|| state.identity.default_owner.clone());
        Ok(Self(owner))
    }
}
