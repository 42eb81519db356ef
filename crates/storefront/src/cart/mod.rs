//! Client-side cart state.
//!
//! - [`CartStore`] - one shopper's cart, mutated only after the backend accepts
//! - [`CartRegistry`] - per-user stores with idle eviction

mod registry;
mod sequencer;
mod store;

pub use registry::CartRegistry;
pub use store::{CartStore, StoreError};

#[cfg(test)]
pub(crate) use store::tests::FakeCartApi;
