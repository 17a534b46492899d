//! End-to-end tests over the demo data set

use serde_json::json;

use spendlens_core::demo::seed_demo_data;
use spendlens_core::insights::{AnomalyKind, AnomalySeverity, TrendDirection};
use spendlens_core::{Category, Database, InsightPipeline, NewTransaction};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_demo_end_to_end() {
    let db = Database::in_memory().unwrap();
    assert_eq!(seed_demo_data(&db).unwrap(), 13);

    let pipeline = InsightPipeline::new(&db);
    let report = pipeline.run(false).unwrap();

    // Category totals
    assert!(close(report.category_summary["Dining"], 103.25));
    assert!(close(report.category_summary["Groceries"], 165.65));
    assert!(close(report.category_summary["Travel"], 654.50));
    assert!(close(report.category_summary["Shopping"], 1364.00));
    assert!(close(report.category_summary["Utilities"], 234.99));
    assert!(close(report.category_summary["Services"], 19.99));

    // No repeated identical charges in the demo month
    assert!(report.subscriptions.is_empty());

    // One month of data: stable, no previous month
    assert_eq!(report.trends.trend, TrendDirection::Stable);
    assert!(close(report.trends.current_month_total, 2542.38));
    assert!(close(report.trends.previous_month_total, 0.0));
    assert_eq!(report.trends.monthly.len(), 1);
    assert_eq!(report.trends.monthly[0].month, "2025-12");

    // Three big-ticket purchases stand out against their category baselines
    let merchants: Vec<&str> = report.anomalies.iter().map(|a| a.merchant.as_str()).collect();
    assert_eq!(merchants, vec!["Italian Bistro", "United Airlines", "Apple Store"]);
    assert!(report
        .anomalies
        .iter()
        .all(|a| a.kind == AnomalyKind::Spike && a.severity == AnomalySeverity::High));

    assert!(report.computed_at.is_some());
}

#[test]
fn test_demo_seed_then_repipeline_is_stable() {
    let db = Database::in_memory().unwrap();
    seed_demo_data(&db).unwrap();

    let pipeline = InsightPipeline::new(&db);
    let first = pipeline.run(false).unwrap();

    // Re-seeding inserts nothing, and the cached report matches the fresh one
    // where it matters.
    assert_eq!(seed_demo_data(&db).unwrap(), 0);
    let second = pipeline.run(false).unwrap();

    assert_eq!(second.category_summary, first.category_summary);
    assert_eq!(second.anomalies, first.anomalies);
    assert_eq!(second.trends, first.trends);
}

#[test]
fn test_any_cached_insight_short_circuits_everything() {
    let db = Database::in_memory().unwrap();

    // Data that would produce a subscription candidate on a fresh compute.
    db.save_transactions(&[
        NewTransaction::new("2025-11-15", "Netflix", 19.99, Category::Subscriptions),
        NewTransaction::new("2025-12-15", "Netflix", 19.99, Category::Subscriptions),
    ])
    .unwrap();

    // Only one insight type is cached.
    db.save_insight("category_summary", "all", &json!({"Subscriptions": 39.98}), None, 1.0)
        .unwrap();

    // The cached report wins outright: subscriptions stay empty because the
    // detector never runs.
    let pipeline = InsightPipeline::new(&db);
    let report = pipeline.run(false).unwrap();
    assert!(report.subscriptions.is_empty());
    assert!(close(report.category_summary["Subscriptions"], 39.98));

    // A forced refresh computes them.
    let refreshed = pipeline.run(true).unwrap();
    assert_eq!(refreshed.subscriptions.len(), 1);
    assert_eq!(refreshed.subscriptions[0].description, "Netflix");
}

#[test]
fn test_refresh_overwrites_rather_than_duplicates_cache() {
    let db = Database::in_memory().unwrap();
    seed_demo_data(&db).unwrap();

    let pipeline = InsightPipeline::new(&db);
    pipeline.run(false).unwrap();
    pipeline.run(true).unwrap();
    pipeline.run(true).unwrap();

    // Still exactly one row per insight type.
    let cached = db.valid_insights().unwrap();
    assert_eq!(cached.len(), 4);
}
