//! Key layout inside the counter store.

use viewcount_core::protocol::reply::OpClass;
use viewcount_core::{ClientId, Slug};

/// Builds store keys under an optional prefix.
#[derive(Debug, Clone, Default)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// `views:{slug}`
    pub fn views(&self, slug: &Slug) -> String {
        format!("{}views:{}", self.prefix, slug)
    }

    /// `viewed:{len}:{client}:{slug}`
    pub fn marker(&self, client: &ClientId, slug: &Slug) -> String {
        format!("{}viewed:{}:{}", self.prefix, client_segment(client), slug)
    }

    /// `ratelimit:{class}:{len}:{client}` (the store appends the bucket index).
    pub fn window(&self, class: OpClass, client: &ClientId) -> String {
        format!(
            "{}ratelimit:{}:{}",
            self.prefix,
            class.as_str(),
            client_segment(client)
        )
    }
}

/// Client ids come from `X-Forwarded-For` and may contain `:` (IPv6 or
/// forged values), as may slugs. The byte-length prefix fixes where the
/// client ends so distinct (client, slug) pairs never share a key.
fn client_segment(client: &ClientId) -> String {
    format!("{}:{}", client.as_str().len(), client)
}
