//! View endpoint replies.
//!
//! `ViewReply` is the transport-agnostic outcome of one request; `ViewBody`
//! is its JSON rendering. Every outcome except validation and method errors
//! answers 200 so page rendering never breaks on a counter problem.

use serde::{Deserialize, Serialize};

pub const MSG_SLUG_REQUIRED: &str = "Slug required";
pub const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const MSG_READ_LIMITED: &str = "Too many requests";
pub const MSG_WRITE_LIMITED: &str = "Too many requests. Please try again later.";
pub const MSG_FAILED: &str = "Failed to process request";

/// Operation class used for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpClass {
    /// GET: loose threshold.
    Read,
    /// POST: strict threshold.
    Write,
}

impl OpClass {
    pub fn as_str(self) -> &'static str {
        match self {
            OpClass::Read => "read",
            OpClass::Write => "write",
        }
    }
}

/// Outcome of a view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewReply {
    /// Read succeeded.
    Current { views: u64 },
    /// Write admitted; `cached` is true when the dedup marker already existed.
    Counted { views: u64, cached: bool },
    /// Admission rejected; carries the best-known count.
    Limited {
        class: OpClass,
        views: u64,
        retry_after_secs: u64,
    },
    InvalidSlug,
    MethodNotAllowed,
    /// Store failure absorbed into a zero-count success.
    Degraded,
}

impl ViewReply {
    /// HTTP status code of this reply.
    pub fn status(&self) -> u16 {
        match self {
            ViewReply::InvalidSlug => 400,
            ViewReply::MethodNotAllowed => 405,
            _ => 200,
        }
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ViewReply::Current { .. } => "current",
            ViewReply::Counted { cached: false, .. } => "counted",
            ViewReply::Counted { cached: true, .. } => "cached",
            ViewReply::Limited { .. } => "limited",
            ViewReply::InvalidSlug => "invalid_slug",
            ViewReply::MethodNotAllowed => "method_not_allowed",
            ViewReply::Degraded => "degraded",
        }
    }

    pub fn body(&self) -> ViewBody {
        match self {
            ViewReply::Current { views } => ViewBody {
                views: Some(*views),
                ..ViewBody::default()
            },
            ViewReply::Counted { views, cached } => ViewBody {
                views: Some(*views),
                cached: Some(*cached),
                error: None,
            },
            ViewReply::Limited { class, views, .. } => {
                let msg = match class {
                    OpClass::Read => MSG_READ_LIMITED,
                    OpClass::Write => MSG_WRITE_LIMITED,
                };
                ViewBody {
                    views: Some(*views),
                    cached: None,
                    error: Some(msg.to_string()),
                }
            }
            ViewReply::InvalidSlug => ViewBody::error(MSG_SLUG_REQUIRED),
            ViewReply::MethodNotAllowed => ViewBody::error(MSG_METHOD_NOT_ALLOWED),
            ViewReply::Degraded => ViewBody {
                views: Some(0),
                cached: None,
                error: Some(MSG_FAILED.to_string()),
            },
        }
    }
}

/// JSON body: `{ views?, cached?, error? }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ViewBody {
    fn error(msg: &str) -> Self {
        Self {
            error: Some(msg.to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn shapes_match_wire_contract() {
        let fresh = serde_json::to_value(ViewReply::Counted { views: 3, cached: false }.body()).unwrap();
        assert_eq!(fresh, serde_json::json!({ "views": 3, "cached": false }));

        let limited = ViewReply::Limited { class: OpClass::Write, views: 7, retry_after_secs: 30 };
        assert_eq!(limited.status(), 200);
        assert_eq!(
            serde_json::to_value(limited.body()).unwrap(),
            serde_json::json!({ "views": 7, "error": MSG_WRITE_LIMITED })
        );

        assert_eq!(ViewReply::InvalidSlug.status(), 400);
        assert_eq!(
            serde_json::to_value(ViewReply::InvalidSlug.body()).unwrap(),
            serde_json::json!({ "error": "Slug required" })
        );
    }

    #[test]
    fn degraded_is_zero_with_error() {
        let r = ViewReply::Degraded;
        assert_eq!(r.status(), 200);
        assert_eq!(
            serde_json::to_value(r.body()).unwrap(),
            serde_json::json!({ "views": 0, "error": "Failed to process request" })
        );
    }
}
