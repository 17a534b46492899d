//! Demo data seeding
//!
//! A fixed month of plausible transactions for trying the tool without a
//! real statement. Seeding is idempotent because the store deduplicates.

use crate::db::Database;
use crate::error::Result;
use crate::models::{Category, NewTransaction};

const DEMO_SOURCE: &str = "mock_statement.pdf";

fn demo_tx(
    date: &str,
    description: &str,
    amount: f64,
    category: Category,
    location: &str,
) -> NewTransaction {
    NewTransaction {
        location: Some(location.to_string()),
        source_file: Some(DEMO_SOURCE.to_string()),
        ..NewTransaction::new(date, description, amount, category)
    }
}

/// The built-in demo statement
pub fn demo_transactions() -> Vec<NewTransaction> {
    vec![
        demo_tx("2025-12-01", "Starbucks", 5.75, Category::Dining, "Seattle, WA"),
        demo_tx("2025-12-05", "McDonald's", 12.50, Category::Dining, "San Francisco, CA"),
        demo_tx("2025-12-15", "Italian Bistro", 85.00, Category::Dining, "New York, NY"),
        demo_tx("2025-12-03", "Whole Foods", 120.45, Category::Groceries, "Austin, TX"),
        demo_tx("2025-12-10", "Safeway", 45.20, Category::Groceries, "San Jose, CA"),
        demo_tx("2025-12-08", "Uber", 24.50, Category::Travel, "SF, CA"),
        demo_tx("2025-12-20", "United Airlines", 450.00, Category::Travel, "Online"),
        demo_tx("2025-12-22", "Hilton Hotels", 180.00, Category::Travel, "Chicago, IL"),
        demo_tx("2025-12-12", "Amazon.com", 65.00, Category::Shopping, "Online"),
        demo_tx("2025-12-24", "Apple Store", 1299.00, Category::Shopping, "Palo Alto, CA"),
        demo_tx("2025-12-02", "PG&E", 145.00, Category::Utilities, "SF, CA"),
        demo_tx("2025-12-18", "Comcast", 89.99, Category::Utilities, "Online"),
        demo_tx(
            "2025-12-28",
            "Netflix",
            19.99,
            Category::Other("Services".to_string()),
            "Online",
        ),
    ]
}

/// Seed the demo statement, returning how many rows were new
pub fn seed_demo_data(db: &Database) -> Result<usize> {
    db.save_transactions(&demo_transactions())
}
