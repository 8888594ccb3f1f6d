//! Transport layer (HTTP).
//!
//! Extracts slug, method and client identity from the request, hands them
//! to the view service, and renders the reply as JSON.

pub mod http;
