//! Per-category spending totals

use crate::db::Database;
use crate::error::Result;

use super::round2;
use super::types::CategoryTotal;

/// Sum spending per category, largest first
///
/// Uncategorized rows are excluded. Totals are rounded to cents.
pub fn summarize_by_category(db: &Database) -> Result<Vec<CategoryTotal>> {
    let conn = db.conn()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT category, SUM(amount)
        FROM transactions
        WHERE category IS NOT NULL
        GROUP BY category
        ORDER BY SUM(amount) DESC
        "#,
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|mut ct| {
            ct.total = round2(ct.total);
            ct
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewTransaction};

    #[test]
    fn test_totals_grouped_and_sorted() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            NewTransaction::new("2025-12-01", "Starbucks", 5.75, Category::Dining),
            NewTransaction::new("2025-12-02", "Chipotle", 12.50, Category::Dining),
            NewTransaction::new("2025-12-03", "Safeway", 45.20, Category::Groceries),
        ])
        .unwrap();

        let totals = summarize_by_category(&db).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "Groceries");
        assert!((totals[0].total - 45.20).abs() < 1e-9);
        assert_eq!(totals[1].category, "Dining");
        assert!((totals[1].total - 18.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_database_yields_empty_summary() {
        let db = Database::in_memory().unwrap();
        assert!(summarize_by_category(&db).unwrap().is_empty());
    }
}
