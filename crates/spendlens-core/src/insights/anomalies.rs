//! Unusual transaction detection
//!
//! A single chronological pass over all transactions, maintaining per-
//! category spending windows and the set of merchants seen so far. Both
//! checks for a transaction run against the state *before* that
//! transaction, which is then folded in.

use std::collections::{HashMap, HashSet};

use crate::db::Database;
use crate::error::Result;
use crate::models::Category;

use super::types::{Anomaly, AnomalyKind, AnomalySeverity};

/// How many recent amounts per category feed the spike baseline
const CATEGORY_WINDOW: usize = 10;

/// Spike threshold as a multiple of the category average
const SPIKE_FACTOR: f64 = 2.5;

/// Spikes this many times the average are high severity
const HIGH_SEVERITY_FACTOR: f64 = 5.0;

/// Spikes below this absolute amount are ignored
const SPIKE_FLOOR: f64 = 50.0;

/// A new merchant only registers once this many merchants have been seen
const NEW_MERCHANT_WARMUP: usize = 20;

/// How many of the most recent anomalies to report
const MAX_ANOMALIES: usize = 5;

/// Detect spending spikes and first-time merchants
///
/// Refunds, credits, and balance movements (card payments, internal
/// transfers) are skipped entirely. Returns the last `MAX_ANOMALIES`
/// findings in chronological order.
pub fn detect_anomalies(db: &Database) -> Result<Vec<Anomaly>> {
    let transactions = db.all_transactions()?;

    let mut category_spending: HashMap<String, Vec<f64>> = HashMap::new();
    let mut seen_merchants: HashSet<String> = HashSet::new();
    let mut anomalies = Vec::new();

    for tx in &transactions {
        if tx.amount <= 0.0 {
            continue;
        }
        if let Some(cat) = tx.category.as_deref() {
            if Category::from(cat).is_balance_movement() {
                continue;
            }
        }

        let category_key = tx.category.clone().unwrap_or_default();
        let merchant = tx
            .merchant
            .clone()
            .unwrap_or_else(|| tx.description.clone());

        // Spike check against the recent window for this category
        if let Some(history) = category_spending.get(&category_key) {
            let recent = &history[history.len().saturating_sub(CATEGORY_WINDOW)..];
            if !recent.is_empty() {
                let avg = recent.iter().sum::<f64>() / recent.len() as f64;
                if tx.amount > avg * SPIKE_FACTOR && tx.amount > SPIKE_FLOOR {
                    let severity = if tx.amount > avg * HIGH_SEVERITY_FACTOR {
                        AnomalySeverity::High
                    } else {
                        AnomalySeverity::Medium
                    };
                    anomalies.push(Anomaly {
                        kind: AnomalyKind::Spike,
                        severity,
                        description: format!(
                            "Unusually high {} expense",
                            tx.category.as_deref().unwrap_or("Uncategorized")
                        ),
                        amount: tx.amount,
                        date: tx.date.clone(),
                        merchant: merchant.clone(),
                    });
                }
            }
        }

        // New merchant check, gated until enough history has accumulated
        let merchant_key = merchant.to_lowercase();
        if !seen_merchants.contains(&merchant_key) && seen_merchants.len() >= NEW_MERCHANT_WARMUP {
            anomalies.push(Anomaly {
                kind: AnomalyKind::NewMerchant,
                severity: AnomalySeverity::Low,
                description: format!("First time spending at {}", merchant),
                amount: tx.amount,
                date: tx.date.clone(),
                merchant: merchant.clone(),
            });
        }

        category_spending
            .entry(category_key)
            .or_default()
            .push(tx.amount);
        seen_merchants.insert(merchant_key);
    }

    // Keep only the most recent findings
    if anomalies.len() > MAX_ANOMALIES {
        anomalies.drain(..anomalies.len() - MAX_ANOMALIES);
    }
    Ok(anomalies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTransaction;

    fn tx(date: &str, description: &str, amount: f64, category: Category) -> NewTransaction {
        NewTransaction::new(date, description, amount, category)
    }

    #[test]
    fn test_cold_start_yields_no_spike() {
        let db = Database::in_memory().unwrap();
        // First transaction in a category has no baseline.
        db.save_transactions(&[tx("2025-12-01", "Apple Store", 1299.0, Category::Shopping)])
            .unwrap();

        assert!(detect_anomalies(&db).unwrap().is_empty());
    }

    #[test]
    fn test_spike_detected_against_category_average() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-12-01", "Starbucks", 6.0, Category::Dining),
            tx("2025-12-02", "Cafe Luna", 10.0, Category::Dining),
            // avg is 8.0; 85.0 > 20.0 and > 50.0, and > 40.0 makes it high
            tx("2025-12-05", "Italian Bistro", 85.0, Category::Dining),
        ])
        .unwrap();

        let anomalies = detect_anomalies(&db).unwrap();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::Spike);
        assert_eq!(anomalies[0].severity, AnomalySeverity::High);
        assert_eq!(anomalies[0].merchant, "Italian Bistro");
    }

    #[test]
    fn test_small_spike_below_floor_is_ignored() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-12-01", "Starbucks", 4.0, Category::Dining),
            tx("2025-12-02", "Cafe Luna", 6.0, Category::Dining),
            // 30.0 is 6x the 5.0 average but under the 50.0 floor
            tx("2025-12-05", "Bistro", 30.0, Category::Dining),
        ])
        .unwrap();

        assert!(detect_anomalies(&db).unwrap().is_empty());
    }

    #[test]
    fn test_refunds_and_balance_movements_are_skipped() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-12-01", "Starbucks", 6.0, Category::Dining),
            tx("2025-12-02", "Refund", -80.0, Category::Dining),
            tx("2025-12-03", "Card payment", 900.0, Category::CreditCardPayment),
        ])
        .unwrap();

        assert!(detect_anomalies(&db).unwrap().is_empty());
    }

    #[test]
    fn test_new_merchant_requires_warmup() {
        let db = Database::in_memory().unwrap();

        // 20 distinct merchants, all cheap and spread across categories so
        // no spike fires.
        let mut batch: Vec<NewTransaction> = (0..20)
            .map(|i| {
                tx(
                    &format!("2025-12-{:02}", i + 1),
                    &format!("Merchant {}", i),
                    5.0,
                    Category::Miscellaneous,
                )
            })
            .collect();
        batch.push(tx("2025-12-28", "Brand New Shop", 5.0, Category::Miscellaneous));
        db.save_transactions(&batch).unwrap();

        let anomalies = detect_anomalies(&db).unwrap();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::NewMerchant);
        assert_eq!(anomalies[0].severity, AnomalySeverity::Low);
        assert_eq!(anomalies[0].description, "First time spending at Brand New Shop");
    }

    #[test]
    fn test_merchant_key_is_case_insensitive() {
        let db = Database::in_memory().unwrap();

        let mut batch: Vec<NewTransaction> = (0..20)
            .map(|i| {
                tx(
                    &format!("2025-12-{:02}", i + 1),
                    &format!("Merchant {}", i),
                    5.0,
                    Category::Miscellaneous,
                )
            })
            .collect();
        // Same merchant as "Merchant 3", different casing: not new.
        batch.push(tx("2025-12-28", "MERCHANT 3", 5.0, Category::Miscellaneous));
        db.save_transactions(&batch).unwrap();

        assert!(detect_anomalies(&db).unwrap().is_empty());
    }

    #[test]
    fn test_only_last_five_are_reported() {
        let db = Database::in_memory().unwrap();

        let mut batch = vec![
            tx("2025-01-01", "Base A", 6.0, Category::Dining),
            tx("2025-01-02", "Base B", 8.0, Category::Dining),
        ];
        // Seven spikes, each an order of magnitude above the last so the
        // growing window average never catches up. Only the last five
        // should be reported.
        for i in 0..7 {
            batch.push(tx(
                &format!("2025-02-{:02}", i + 1),
                &format!("Blowout {}", i),
                500.0 * 10f64.powi(i),
                Category::Dining,
            ));
        }
        db.save_transactions(&batch).unwrap();

        let anomalies = detect_anomalies(&db).unwrap();
        assert_eq!(anomalies.len(), 5);
        assert_eq!(anomalies[0].merchant, "Blowout 2");
        assert_eq!(anomalies[4].merchant, "Blowout 6");
    }
}
