use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_core::{CartSettings, CartStore, Decimal, MemoryStorage, ProductSummary};

fn product(id: u8, cents: u32) -> ProductSummary {
    ProductSummary::new(format!("p{}", id), format!("Product {}", id), Decimal::new(cents.into(), 2))
        .unwrap()
}

fn priced(id: u8, price: Decimal) -> ProductSummary {
    ProductSummary::new(format!("p{}", id), format!("Product {}", id), price).unwrap()
}

/// Non-negative prices from whole units down to 20 decimal places
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0..i64::MAX, 0..=20u32).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn new_cart(storage: Arc<MemoryStorage>) -> CartStore {
    CartStore::load(storage, &CartSettings::default()).unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Add(u8, u32, Decimal),
    Remove(u8),
    Increment(u8),
    Decrement(u8),
    Set(u8, u32),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..6u8, 0..5u32, price_strategy()).prop_map(|(id, qty, price)| Op::Add(id, qty, price)),
        (0..6u8).prop_map(Op::Remove),
        (0..6u8).prop_map(Op::Increment),
        (0..6u8).prop_map(Op::Decrement),
        (0..6u8, 0..5u32).prop_map(|(id, qty)| Op::Set(id, qty)),
        Just(Op::Clear),
    ]
}

fn apply(cart: &CartStore, op: &Op) {
    match op {
        Op::Add(id, qty, price) => cart.add_item_with_quantity(&priced(*id, *price), *qty),
        Op::Remove(id) => cart.remove_item(&format!("p{}", id)),
        Op::Increment(id) => cart.increment_quantity(&format!("p{}", id)),
        Op::Decrement(id) => cart.decrement_quantity(&format!("p{}", id)),
        Op::Set(id, qty) => cart.set_quantity(&format!("p{}", id), *qty),
        Op::Clear => cart.clear_cart(),
    }
}

proptest! {
    #[test]
    fn prop_distinct_adds_give_one_line_each(ids in proptest::collection::hash_set(any::<u8>(), 0..20)) {
        let cart = new_cart(Arc::new(MemoryStorage::new()));
        for id in &ids {
            cart.add_item(&product(*id, 100));
        }
        prop_assert_eq!(cart.line_count(), ids.len());
    }

    #[test]
    fn prop_repeated_adds_sum_quantities(
        quantities in proptest::collection::vec(1..10u32, 1..20),
        cents in 0..100_000u32,
    ) {
        let cart = new_cart(Arc::new(MemoryStorage::new()));
        let p = product(1, cents);
        for qty in &quantities {
            cart.add_item_with_quantity(&p, *qty);
        }

        let expected: u32 = quantities.iter().sum();
        prop_assert_eq!(cart.line_count(), 1);
        prop_assert_eq!(cart.get("p1").unwrap().quantity, expected);
        prop_assert_eq!(cart.calculate_subtotal(), p.price * Decimal::from(expected));
    }

    #[test]
    fn prop_invariants_hold_after_any_sequence(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let cart = new_cart(Arc::new(MemoryStorage::new()));
        for op in &ops {
            apply(&cart, op);

            let items = cart.items();
            let mut seen = HashMap::new();
            for line in &items {
                prop_assert!(line.quantity >= 1);
                prop_assert!(seen.insert(line.id.clone(), ()).is_none());
            }
        }
    }

    #[test]
    fn prop_remove_is_idempotent(ops in proptest::collection::vec(op_strategy(), 0..30), id in 0..6u8) {
        let cart = new_cart(Arc::new(MemoryStorage::new()));
        for op in &ops {
            apply(&cart, op);
        }

        let key = format!("p{}", id);
        cart.remove_item(&key);
        let after_first = cart.items();
        cart.remove_item(&key);
        prop_assert_eq!(cart.items(), after_first);
        prop_assert!(!cart.contains(&key));
    }

    #[test]
    fn prop_clear_zeroes_subtotal(ops in proptest::collection::vec(op_strategy(), 0..30)) {
        let cart = new_cart(Arc::new(MemoryStorage::new()));
        for op in &ops {
            apply(&cart, op);
        }
        cart.clear_cart();
        prop_assert_eq!(cart.calculate_subtotal(), Decimal::ZERO);
        prop_assert_eq!(cart.line_count(), 0);
    }

    #[test]
    fn prop_reload_reproduces_list(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let storage = Arc::new(MemoryStorage::new());
        let before = {
            let cart = new_cart(storage.clone());
            for op in &ops {
                apply(&cart, op);
            }
            cart.flush().unwrap();
            cart.items()
        };

        let reloaded = new_cart(storage);
        let after = reloaded.items();
        prop_assert_eq!(&after, &before);
        for (old, new) in before.iter().zip(&after) {
            prop_assert_eq!(old.price.to_string(), new.price.to_string());
        }
    }

    #[test]
    fn prop_reload_keeps_extreme_prices(price in price_strategy(), qty in 1..5u32) {
        let storage = Arc::new(MemoryStorage::new());
        {
            let cart = new_cart(storage.clone());
            cart.add_item_with_quantity(&priced(1, price), qty);
            cart.add_item_with_quantity(&priced(2, Decimal::MAX), 1);
            cart.flush().unwrap();
        }

        let reloaded = new_cart(storage);
        prop_assert_eq!(reloaded.get("p1").unwrap().price, price);
        prop_assert_eq!(reloaded.get("p2").unwrap().price, Decimal::MAX);
    }
}
