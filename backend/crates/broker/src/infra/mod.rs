//! Infrastructure Layer
//!
//! HTTP clients for the payment facilitator and the content backend.

pub mod backend;
pub mod facilitator;

pub use backend::HttpContentBackend;
pub use facilitator::{HttpFacilitator, TestModeFacilitator};
