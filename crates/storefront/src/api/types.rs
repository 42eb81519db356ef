//! Request and response bodies exchanged with the backend.

use freshcatch_core::{Address, CartItem, Phone, ProductId, Quantity};
use serde::{Deserialize, Serialize};

/// `POST cart/items`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// `PATCH cart/items/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: Quantity,
}

/// `GET cart`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartBody {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// `PUT profile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: Option<Phone>,
    pub address: Option<Address>,
}

/// Error body the backend sends with 4xx/5xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The most useful message in the body, if any.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}
