//! Wire contract of the view endpoint.
//!
//! - `reply`: JSON response bodies and their fixed error messages

pub mod reply;

pub use reply::{OpClass, ViewBody, ViewReply};
