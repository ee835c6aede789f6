pub mod pdf;

use crate::db::DbPool;
use crate::error::ApiError;
use sea_orm::ConnectionTrait;
use std::collections::BTreeMap;

/// One aggregated shopping list entry. Entries are grouped by
/// (name, measurement_unit): the same ingredient name under a different
/// unit is a distinct entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Ungrouped ingredient row from one recipe in the cart.
#[derive(Debug, Clone)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Sums the amounts of every cart ingredient row per (name, unit) group.
/// The BTreeMap key order gives the list its deterministic alphabetical
/// ordering by name, then unit.
pub fn merge_rows(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListItem> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

/// Fetches every ingredient row belonging to recipes in the user's
/// shopping cart and folds them into the aggregated list. An empty cart
/// yields an empty list.
pub async fn aggregate_for_user(
    pool: &DbPool,
    user_id: i64,
) -> Result<Vec<ShoppingListItem>, ApiError> {
    let query = r#"
        SELECT
            i.name AS name,
            i.measurement_unit AS measurement_unit,
            ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = ?
    "#;

    let stmt = sea_orm::Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::MySql,
        query,
        [sea_orm::Value::BigInt(Some(user_id))],
    );

    let rows = pool.query_all(stmt).await?;
    let mut cart_rows = Vec::with_capacity(rows.len());
    for row in rows {
        cart_rows.push(CartIngredientRow {
            name: row.try_get::<String>("", "name")?,
            measurement_unit: row.try_get::<String>("", "measurement_unit")?,
            amount: row.try_get::<i32>("", "amount")?,
        });
    }

    Ok(merge_rows(cart_rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn empty_cart_yields_empty_list() {
        assert!(merge_rows(Vec::new()).is_empty());
    }

    #[test]
    fn sums_same_ingredient_across_recipes() {
        let items = merge_rows(vec![row("Salt", "g", 5), row("Salt", "g", 10)]);
        assert_eq!(
            items,
            vec![ShoppingListItem {
                name: "Salt".to_string(),
                measurement_unit: "g".to_string(),
                total_amount: 15,
            }]
        );
    }

    #[test]
    fn same_name_different_unit_stays_distinct() {
        let items = merge_rows(vec![row("Milk", "ml", 200), row("Milk", "g", 50)]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].measurement_unit, "g");
        assert_eq!(items[1].measurement_unit, "ml");
    }

    #[test]
    fn two_recipe_cart_example() {
        // recipeA: Flour 200 g; recipeB: Flour 100 g, Egg 2 pcs
        let items = merge_rows(vec![
            row("Flour", "g", 200),
            row("Flour", "g", 100),
            row("Egg", "pcs", 2),
        ]);
        assert_eq!(
            items,
            vec![
                ShoppingListItem {
                    name: "Egg".to_string(),
                    measurement_unit: "pcs".to_string(),
                    total_amount: 2,
                },
                ShoppingListItem {
                    name: "Flour".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 300,
                },
            ]
        );
    }

    #[test]
    fn order_is_alphabetical_by_name() {
        let items = merge_rows(vec![
            row("Zucchini", "g", 1),
            row("Apple", "pcs", 2),
            row("Milk", "ml", 3),
        ]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Milk", "Zucchini"]);
    }
}
