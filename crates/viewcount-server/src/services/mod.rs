//! Request orchestration services.
//!
//! `views`: slug validation, admission, dedup and counting for one request.

pub mod views;

pub use views::{ViewMethod, ViewService};
