//! Order name generator: turns table numbers into readable order labels.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::error::{KitchenError, Result};
use crate::types::{Order, TableNumber};

/// Dishes the kitchen knows how to cook.
pub const DISHES: [&str; 10] = [
    "Spaghetti Carbonara",
    "Pizza Margherita",
    "Risotto",
    "Grilled Steak",
    "Grilled Salmon",
    "Stew",
    "Caesar Salad",
    "Ramen",
    "Lasagna",
    "Shrimp",
];

/// Label for one table, e.g. `Table 07: Ramen`.
pub fn order_label(number: TableNumber, dish: &str) -> String {
    format!("Table {number:02}: {dish}")
}

/// Generate `count` orders for tables `1..=count`, picking a random dish each.
///
/// Fails if `count` does not fit in a table number.
pub fn generate_orders(count: usize, seed: Option<u64>) -> Result<Vec<Order>> {
    let last = TableNumber::try_from(count).map_err(|_| {
        KitchenError::InvalidConfiguration(format!(
            "{count} orders exceed the highest table number {}",
            TableNumber::MAX
        ))
    })?;
    Ok(match seed {
        Some(seed) => generate_with(last, &mut StdRng::seed_from_u64(seed)),
        None => generate_with(last, &mut rand::rng()),
    })
}

fn generate_with<R: Rng + ?Sized>(last: TableNumber, rng: &mut R) -> Vec<Order> {
    (1..=last)
        .map(|number| {
            let dish = DISHES.choose(rng).copied().unwrap_or(DISHES[0]);
            Order::new(number, order_label(number, dish))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_numbered_from_one() {
        let orders = generate_orders(12, None).expect("menu");
        assert_eq!(orders.len(), 12);
        assert!(orders[0].label.starts_with("Table 01: "));
        assert!(orders[11].label.starts_with("Table 12: "));
        for order in &orders {
            let dish = order.label.split(": ").nth(1).expect("dish missing");
            assert!(DISHES.contains(&dish), "unknown dish {dish}");
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        assert_eq!(
            generate_orders(20, Some(7)).expect("menu"),
            generate_orders(20, Some(7)).expect("menu")
        );
    }

    #[test]
    fn zero_orders_is_empty() {
        assert!(generate_orders(0, Some(1)).expect("menu").is_empty());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn counts_beyond_table_numbers_are_rejected() {
        let too_many = TableNumber::MAX as usize + 1;
        let err = generate_orders(too_many, Some(1)).expect_err("count was truncated");
        assert!(matches!(err, KitchenError::InvalidConfiguration(_)));
        assert!(err.to_string().contains(&too_many.to_string()));
    }
}
