//! # civiclens_core
//!
//! Core domain logic for CivicLens: building upstream conversations,
//! calling the chat-completion API, cleaning its answers, and resolving
//! ZIP codes into civic districts.

pub mod config;
pub mod conversation;
pub mod districts;
pub mod gateway;
pub mod outcome;
pub mod sanitizer;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
