//! Cart lines and derived totals.
//!
//! [`Cart`] is a plain value. The storefront's `CartStore` owns one per
//! session and commits backend responses into it through the operations
//! below. Totals are recomputed on every call and never cached.

use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, Price, ProductId, Quantity, UserId};

/// Product details captured on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub unit_price: Price,
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product: ProductSnapshot,
    pub quantity: Quantity,
}

impl CartItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.unit_price.times(self.quantity)
    }
}

/// A user's cart. Lines keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub owner: UserId,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart for `owner`.
    #[must_use]
    pub const fn empty(owner: UserId) -> Self {
        Self {
            owner,
            items: Vec::new(),
        }
    }

    /// Number of lines (not portions).
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line totals at full precision.
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by id.
    #[must_use]
    pub fn get(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Look up a line by product.
    #[must_use]
    pub fn find_product(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Insert or replace a line.
    ///
    /// A line with the same id, or else the same product, is replaced in
    /// place; otherwise the line is appended.
    pub fn upsert(&mut self, line: CartItem) {
        let slot = self
            .items
            .iter()
            .position(|item| item.id == line.id)
            .or_else(|| {
                self.items
                    .iter()
                    .position(|item| item.product_id == line.product_id)
            });

        match slot.and_then(|index| self.items.get_mut(index)) {
            Some(existing) => *existing = line,
            None => self.items.push(line),
        }
    }

    /// Set the quantity of an existing line. Returns `false` if absent.
    pub fn set_quantity(&mut self, id: &CartItemId, quantity: Quantity) -> bool {
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Delete a line. Returns `false` if it was not there.
    pub fn remove(&mut self, id: &CartItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Delete every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: &str, product: &str, price: i64, qty: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(product),
            product: ProductSnapshot {
                name: product.to_owned(),
                unit_price: Price::new(Decimal::from(price)),
            },
            quantity: Quantity::new(qty).unwrap(),
        }
    }

    #[test]
    fn test_item_count_and_total() {
        let mut cart = Cart::empty(UserId::new("u1"));
        cart.upsert(line("l1", "seer-fish", 200, 2));
        cart.upsert(line("l2", "prawns", 115, 1));

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total_amount().display(), "₹515.00");
    }

    #[test]
    fn test_upsert_replaces_same_product_in_place() {
        let mut cart = Cart::empty(UserId::new("u1"));
        cart.upsert(line("l1", "pomfret", 300, 1));
        cart.upsert(line("l2", "crab", 450, 1));
        cart.upsert(line("l1", "pomfret", 300, 3));

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.items[0].quantity.get(), 3);
        assert_eq!(cart.items[1].product_id.as_str(), "crab");
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::empty(UserId::new("u1"));
        cart.upsert(line("l1", "squid", 180, 2));
        let before = cart.clone();

        assert!(!cart.remove(&CartItemId::new("missing")));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::empty(UserId::new("u1"));
        cart.upsert(line("l1", "mackerel", 90, 1));

        assert!(cart.set_quantity(&CartItemId::new("l1"), Quantity::new(4).unwrap()));
        assert!(!cart.set_quantity(&CartItemId::new("l9"), Quantity::ONE));
        assert_eq!(cart.total_amount().amount(), Decimal::from(360));
    }
}
