//! Cache types for catalogue responses.

use std::sync::Arc;

use freshcatch_core::{Product, ProductId};

/// Cache key for catalogue reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products { category: Option<String> },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}
