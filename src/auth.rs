//! API key shape gate.
//!
//! Follows the OAuth2 Bearer Token pattern (RFC 6750). The gateway only
//! checks the key's shape (prefix and length) and defers real validity to
//! the backends the key is forwarded to. Keys are never logged and never
//! outlive the call that carried them.

use crate::error::GatewayError;

/// API key prefix - all Graforest keys start with this.
pub const API_KEY_PREFIX: &str = "gf_sk_";

/// Minimum secret length after the prefix.
const MIN_SECRET_LEN: usize = 20;

const BEARER_PREFIX: &str = "Bearer ";

/// A shape-validated Graforest API key.
///
/// Construction goes through [`ApiKey::parse`], so holding one means the
/// prefix and length checks already passed. The `Debug` impl redacts the
/// secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate the shape of a raw key.
    pub fn parse(raw: Option<&str>) -> Result<Self, GatewayError> {
        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(GatewayError::MissingApiKey),
        };

        if !raw.starts_with(API_KEY_PREFIX) {
            return Err(GatewayError::MalformedApiKey);
        }

        if raw.len() < API_KEY_PREFIX.len() + MIN_SECRET_LEN {
            return Err(GatewayError::ApiKeyTooShort);
        }

        Ok(Self(raw.to_string()))
    }

    /// Extract and shape-check a key from an HTTP Authorization header value.
    ///
    /// Expected format: `Authorization: Bearer gf_sk_...`
    pub fn from_bearer(header: Option<&str>) -> Result<Self, GatewayError> {
        let header = header.ok_or(GatewayError::MissingApiKey)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(GatewayError::MissingApiKey)?;
        Self::parse(Some(token))
    }

    /// The raw key, for forwarding as a bearer token. Do not log.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey({API_KEY_PREFIX}***)")
    }
}
