//! Presentation Layer
//!
//! JSON-RPC envelope, per-session protocol server, HTTP handlers, discovery
//! documents and router.

pub mod discovery;
pub mod dto;
pub mod handlers;
pub mod jsonrpc;
pub mod protocol;
pub mod router;

pub use handlers::{BrokerAppState, SESSION_HEADER};
pub use protocol::McpServer;
pub use router::{broker_router, broker_router_generic};
