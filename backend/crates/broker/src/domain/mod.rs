//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (PurchasableItem, PurchaseRequest, Order)
//! - Domain value objects (PaymentMethod, Price)
//! - The static catalog and the item-to-backend delivery table
//! - Port traits (facilitator, content backend)

pub mod catalog;
pub mod delivery;
pub mod entities;
pub mod payment;
pub mod ports;
pub mod value_objects;
