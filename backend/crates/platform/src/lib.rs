//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Hashing and encoding helpers (SHA-256, hex, Base64)
//! - Request header extraction
//! - Outbound HTTP client construction

pub mod client;
pub mod crypto;
pub mod http_client;
