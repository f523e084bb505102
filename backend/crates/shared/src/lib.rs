//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of broker vocabulary:
//! - Common error types and result aliases
//! - Typed identifiers for sessions and orders
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
