//! Top-level facade crate for viewcount.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use viewcount_core::*;
}

pub mod server {
    pub use viewcount_server::*;
}
