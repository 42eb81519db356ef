//! Core types for FreshCatch.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod price;
pub mod quantity;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{Phone, PhoneError, Pincode, PincodeError};
pub use price::Price;
pub use quantity::{Quantity, QuantityError};
pub use role::{AccessError, Capability, Role, SessionContext};
pub use status::{OrderStatus, StatusBadge, StatusDisplay};
