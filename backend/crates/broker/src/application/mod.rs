//! Application Layer
//!
//! Use cases and application services.

pub mod broker;
pub mod config;
pub mod dispatch;
pub mod make_purchase;
pub mod sessions;
pub mod verify_payment;

// Re-exports
pub use broker::PurchaseBroker;
pub use config::BrokerConfig;
pub use dispatch::DeliveryDispatcher;
pub use make_purchase::MakePurchaseUseCase;
pub use sessions::SessionRegistry;
pub use verify_payment::{PaymentVerifier, VerificationResult};
