//! Request identity supplied by an authenticating proxy in front of the app.
//!
//! Handlers receive identity explicitly as an extractor argument:
//! [`MaybeUser`] never rejects, [`RequireUser`] rejects with 401.

use crate::{errors::AppError, state::AppState};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderName, request::Parts},
};
use std::convert::Infallible;

/// Namespace prefix the Google identity-aware proxy puts in front of header values.
const GOOGLE_NAMESPACE: &str = "accounts.google.com:";

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub enum IdentityProvider {
    /// Every request is anonymous.
    Disabled,
    /// Identity is read from headers set by a trusted proxy.
    TrustedHeaders {
        id_header: HeaderName,
        name_header: HeaderName,
    },
}

impl IdentityProvider {
    pub fn trusted_headers(id_header: &str, name_header: &str) -> anyhow::Result<Self> {
        Ok(Self::TrustedHeaders {
            id_header: HeaderName::from_bytes(id_header.as_bytes())?,
            name_header: HeaderName::from_bytes(name_header.as_bytes())?,
        })
    }

    /// Resolve the caller from request headers.
    ///
    /// The display name falls back to the id when the name header is absent.
    pub fn identify(&self, headers: &HeaderMap) -> Option<User> {
        let Self::TrustedHeaders {
            id_header,
            name_header,
        } = self
        else {
            return None;
        };

        let id = header_value(headers, id_header)?;
        let display_name = header_value(headers, name_header).unwrap_or_else(|| id.clone());
        Some(User { id, display_name })
    }
}

fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let raw = headers.get(name)?.to_str().ok()?.trim();
    let value = raw.strip_prefix(GOOGLE_NAMESPACE).unwrap_or(raw);
    (!value.is_empty()).then(|| value.to_string())
}

/// Identity if present; anonymous requests extract as `MaybeUser(None)`.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(state.identity.identify(&parts.headers)))
    }
}

/// Gate for handlers that only make sense for a signed-in caller.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .identity
            .identify(&parts.headers)
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("You must be signed in to view this page"))
    }
}
