use freshcatch_core::{Cart, CartItem, CartItemId, Price, ProductId, ProductSnapshot, Quantity, UserId};
use proptest::prelude::*;
use proptest::test_runner::Config;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Op {
    Upsert { slot: u8, paise: i64, qty: u32 },
    SetQuantity { slot: u8, qty: u32 },
    Remove { slot: u8 },
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0_u8..6, 1_i64..500_000, 1_u32..40).prop_map(|(slot, paise, qty)| Op::Upsert { slot, paise, qty }),
        2 => (0_u8..6, 1_u32..40).prop_map(|(slot, qty)| Op::SetQuantity { slot, qty }),
        2 => (0_u8..8).prop_map(|slot| Op::Remove { slot }),
        1 => Just(Op::Clear),
    ]
}

fn line(slot: u8, paise: i64, qty: u32) -> CartItem {
    CartItem {
        id: CartItemId::new(format!("line-{slot}")),
        product_id: ProductId::new(format!("product-{slot}")),
        product: ProductSnapshot {
            name: format!("Catch {slot}"),
            unit_price: Price::from_paise(paise),
        },
        quantity: Quantity::new(qty).expect("qty strategy starts at 1"),
    }
}

fn expected_total(cart: &Cart) -> Decimal {
    cart.items
        .iter()
        .map(|item| item.product.unit_price.amount() * Decimal::from(item.quantity.get()))
        .sum()
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn total_always_matches_lines(ops in proptest::collection::vec(op(), 0..40)) {
        let mut cart = Cart::empty(UserId::new("prop-user"));
        for op in ops {
            match op {
                Op::Upsert { slot, paise, qty } => cart.upsert(line(slot, paise, qty)),
                Op::SetQuantity { slot, qty } => {
                    let id = CartItemId::new(format!("line-{slot}"));
                    cart.set_quantity(&id, Quantity::new(qty).expect("qty strategy starts at 1"));
                }
                Op::Remove { slot } => {
                    cart.remove(&CartItemId::new(format!("line-{slot}")));
                }
                Op::Clear => cart.clear(),
            }

            prop_assert_eq!(cart.total_amount().amount(), expected_total(&cart));
            prop_assert!(cart.items.iter().all(|item| item.quantity.get() > 0));
        }
    }

    #[test]
    fn lines_stay_unique_per_product(slots in proptest::collection::vec(0_u8..5, 0..30)) {
        let mut cart = Cart::empty(UserId::new("prop-user"));
        for slot in &slots {
            cart.upsert(line(*slot, 10_000, 1));
        }
        let mut distinct = slots.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(cart.item_count(), distinct.len());
    }
}
