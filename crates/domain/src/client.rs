//! Client identification from request transport metadata.
//!
//! The identifier combines the best-known network address with a session
//! token. Requests without a `sessionId` cookie receive a token generated for
//! that request alone, so cookie-less clients are not correlated across
//! requests and effectively get a fresh rate-limit bucket each time. This is
//! accepted behavior.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Address used when no forwarding header is present.
pub const UNKNOWN_CLIENT_ADDRESS: &str = "unknown";

/// Cookie carrying the browser session token.
pub const SESSION_COOKIE_NAME: &str = "sessionId";

/// Opaque identifier of a requesting client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wraps an already-derived identifier.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derives the identifier from request headers.
    ///
    /// `synthetic_session` is only invoked when the cookie header carries no
    /// usable session token.
    pub fn from_request_metadata(
        forwarded_for: Option<&str>,
        real_ip: Option<&str>,
        cookie_header: Option<&str>,
        synthetic_session: impl FnOnce() -> String,
    ) -> Self {
        let address = client_address(forwarded_for, real_ip);
        let session = cookie_header
            .and_then(session_token_from_cookie)
            .map_or_else(synthetic_session, ToOwned::to_owned);

        Self(format!("{address}:{session}"))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ClientId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Resolves the originating address, preferring the first forwarded hop.
#[must_use]
pub fn client_address<'a>(forwarded_for: Option<&'a str>, real_ip: Option<&'a str>) -> &'a str {
    forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|value| !value.is_empty()))
        .unwrap_or(UNKNOWN_CLIENT_ADDRESS)
}

/// Extracts a non-empty `sessionId` value from a `cookie` header.
#[must_use]
pub fn session_token_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
