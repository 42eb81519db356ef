//! FreshCatch Core - Shared domain library.
//!
//! This crate provides the types and pure logic used by every FreshCatch
//! component:
//! - `storefront` - Customer-facing shop (catalog, cart, checkout, profile)
//! - `admin` - Back-office for users, products and order status
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no HTTP
//! clients and no storage. Cart arithmetic, contact validation and the order
//! status display table live here so both binaries agree on them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, quantities, contacts, statuses and roles
//! - [`cart`] - Cart lines and derived totals
//! - [`catalog`] - Products and admin product drafts
//! - [`order`] - Order records and submission payloads
//! - [`profile`] - User profile and delivery address
//! - [`validation`] - Field-level validation errors
//! - [`endpoint`] - Runtime environment and API URL rules
//! - `identity` - Identity-token verification (feature `identity`)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod endpoint;
#[cfg(feature = "identity")]
pub mod identity;
pub mod order;
pub mod profile;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartItem, ProductSnapshot};
pub use catalog::{Product, ProductDraft};
pub use endpoint::{ApiBaseUrl, EndpointError, Environment};
pub use order::{DeliveryDetails, DeliverySlot, Order, OrderSubmission, PaymentMethod};
pub use profile::{Address, ServiceArea, UserProfile};
pub use types::*;
pub use validation::ValidationErrors;
