//! Caller identity forwarded by the authenticating gateway.

use axum::http::HeaderMap;
use serde::Serialize;

use vintage_shop_core::{UserId, UserRole};

/// Header carrying the authenticated user's UUID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the user's role (`admin` or `customer`).
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Why identity headers could not be turned into a [`CurrentUser`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("missing x-user-id header")]
    Missing,
    #[error("malformed identity header: {0}")]
    Malformed(String),
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: UserRole,
}

impl CurrentUser {
    /// Read the caller from gateway headers.
    ///
    /// A missing role header means [`UserRole::Customer`].
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Missing`] without a user ID and
    /// [`IdentityError::Malformed`] when either header cannot be parsed.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, IdentityError> {
        let id = headers
            .get(USER_ID_HEADER)
            .ok_or(IdentityError::Missing)?
            .to_str()
            .map_err(|e| IdentityError::Malformed(e.to_string()))?
            .trim()
            .parse::<UserId>()
            .map_err(|e| IdentityError::Malformed(e.to_string()))?;

        let role = match headers.get(USER_ROLE_HEADER) {
            None => UserRole::Customer,
            Some(value) => value
                .to_str()
                .map_err(|e| IdentityError::Malformed(e.to_string()))?
                .trim()
                .to_ascii_lowercase()
                .parse::<UserRole>()
                .map_err(|e| IdentityError::Malformed(e.to_string()))?,
        };

        Ok(Self { id, role })
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
