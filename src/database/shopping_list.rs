use std::collections::BTreeMap;
use std::fmt::{self, Display};

use super::schema::CartIngredientRow;

/// One aggregated line of the downloadable shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

impl Display for ShoppingListLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.name, self.measurement_unit, self.amount)
    }
}

/// Sums amounts per (name, unit) across every cart occurrence. The result is
/// sorted by name, then unit, independent of row order.
pub fn aggregate(rows: impl IntoIterator<Item = CartIngredientRow>) -> Vec<ShoppingListLine> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    rows.into_iter().for_each(|row| {
        *totals.entry((row.name, row.measurement_unit)).or_insert(0) += i64::from(row.amount);
    });

    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListLine {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

/// Renders the export document, one `\n`-terminated line per ingredient.
pub fn render(lines: &[ShoppingListLine]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}
