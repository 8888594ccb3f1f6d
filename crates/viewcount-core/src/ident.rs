//! Request identity: which resource is viewed, and by whom.

use std::fmt;
use std::net::IpAddr;

use crate::error::{Result, ViewError};

/// Default upper bound for slug length in bytes.
pub const DEFAULT_MAX_SLUG_LEN: usize = 256;

/// Sentinel identity used when neither a forwarded address nor a peer
/// address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Validated resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    /// Validate a raw slug: non-empty, at most `max_len` bytes, no control
    /// characters.
    pub fn parse(raw: &str, max_len: usize) -> Result<Self> {
        if raw.is_empty() {
            return Err(ViewError::BadRequest("slug is empty".into()));
        }
        if raw.len() > max_len {
            return Err(ViewError::BadRequest(format!(
                "slug exceeds {max_len} bytes"
            )));
        }
        if raw.chars().any(char::is_control) {
            return Err(ViewError::BadRequest("slug contains control characters".into()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client identity used as rate-limit and dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Derive identity from the `X-Forwarded-For` value (first entry) or the
    /// transport peer, falling back to [`UNKNOWN_CLIENT`].
    pub fn derive(forwarded_for: Option<&str>, peer: Option<IpAddr>) -> Self {
        let forwarded = forwarded_for
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(first) = forwarded {
            return Self(first.to_string());
        }
        match peer {
            Some(ip) => Self(ip.to_string()),
            None => Self(UNKNOWN_CLIENT.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn slug_rejects_empty_long_and_control() {
        assert!(Slug::parse("", 16).is_err());
        assert!(Slug::parse("a-very-long-slug-name", 8).is_err());
        assert!(Slug::parse("bad\nslug", 16).is_err());
        assert_eq!(Slug::parse("hello-world", 16).unwrap().as_str(), "hello-world");
    }

    #[test]
    fn forwarded_first_entry_wins() {
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        let id = ClientId::derive(Some(" 1.2.3.4 , 9.9.9.9"), Some(peer));
        assert_eq!(id.as_str(), "1.2.3.4");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(ClientId::derive(None, Some(peer)).as_str(), "10.0.0.1");
        assert_eq!(ClientId::derive(Some(" ,1.2.3.4"), Some(peer)).as_str(), "10.0.0.1");
        assert_eq!(ClientId::derive(None, None).as_str(), UNKNOWN_CLIENT);
    }
}
