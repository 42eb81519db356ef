//! Catalogue products.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};
use crate::validation::ValidationErrors;

/// A product as listed in the shop. Prices are per 250 g portion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

const fn in_stock_default() -> bool {
    true
}

/// Fields an admin submits to create or replace a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

impl ProductDraft {
    /// Check the draft and return it with whitespace trimmed.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            errors.add("name", "name is required");
        } else if self.name.chars().count() > 120 {
            errors.add("name", "name must be at most 120 characters");
        }

        if !self.price.is_positive() {
            errors.add("price", "price must be greater than zero");
        }

        self.image_url = self.image_url.map(|u| u.trim().to_owned()).filter(|u| !u.is_empty());
        if let Some(image_url) = &self.image_url
            && url::Url::parse(image_url).is_err()
        {
            errors.add("image_url", "image URL is not valid");
        }

        self.category = self.category.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty());
        self.description = self.description.trim().to_owned();

        errors.into_result(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "  King Fish (Surmai)  ".to_owned(),
            description: "Steaks, cleaned".to_owned(),
            price: Price::from_paise(32_000),
            image_url: Some(String::new()),
            category: Some("fish".to_owned()),
            in_stock: true,
        }
    }

    #[test]
    fn test_valid_draft_is_trimmed() {
        let draft = draft().validate().unwrap();
        assert_eq!(draft.name, "King Fish (Surmai)");
        assert_eq!(draft.image_url, None);
    }

    #[test]
    fn test_invalid_draft_lists_every_field() {
        let bad = ProductDraft {
            name: " ".to_owned(),
            price: Price::ZERO,
            image_url: Some("not a url".to_owned()),
            ..draft()
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["image_url", "name", "price"]
        );
    }

    #[test]
    fn test_product_defaults_in_stock() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Bombil",
            "price": "95.5"
        }))
        .unwrap();
        assert!(product.in_stock);
        assert_eq!(product.price.display(), "₹95.50");
    }
}
