//! viewcount core: transport-agnostic identifiers, response bodies, and errors.
//!
//! This crate defines the request identity types (slug, client) and the JSON
//! reply contract shared by the server and its tests. It carries no transport
//! or runtime dependencies so it can be reused by other front ends.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `ViewError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod ident;
pub mod protocol;

/// Shared result type.
pub use error::{Result, ViewError};
pub use ident::{ClientId, Slug};
