//! CLI command implementations

use std::path::Path;

use anyhow::{Context, Result};
use spendlens_core::demo::seed_demo_data;
use spendlens_core::insights::{
    analyze_trends, detect_anomalies, detect_subscriptions, enrich_merchant,
    summarize_by_category, InsightPipeline,
};
use spendlens_core::Database;

/// Open the database, running migrations as needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::open(path_str).context("Failed to open database")
}

/// Truncate a string to a maximum length, adding "..." if truncated
///
/// The cut point backs up to a char boundary so multibyte descriptions
/// never split mid-character.
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());
    open_db(db_path)?;
    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Seed demo data: spendlens seed");
    println!("  2. Compute insights: spendlens insights");
    Ok(())
}

pub fn cmd_seed(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let inserted = seed_demo_data(&db).context("Failed to seed demo data")?;
    if inserted == 0 {
        println!("Demo data already present, nothing to do.");
    } else {
        println!("✅ Seeded {} demo transactions.", inserted);
    }
    Ok(())
}

pub fn cmd_status(db_path: &Path) -> Result<()> {
    println!();
    println!("📊 Spendlens Status");
    println!("   ─────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = std::fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
        let db = open_db(db_path)?;
        println!("   Transactions: {}", db.count_transactions()?);
        println!("   Statements: {}", db.list_statements(None)?.len());
        println!("   Cached insights: {}", db.valid_insights()?.len());
    } else {
        println!("   (database not initialized, run 'spendlens init')");
    }

    println!();
    Ok(())
}

pub fn cmd_transactions(db: &Database, limit: i64) -> Result<()> {
    let transactions = db.recent_transactions(limit)?;
    if transactions.is_empty() {
        println!("No transactions. Ingest a statement or run 'spendlens seed'.");
        return Ok(());
    }

    println!();
    println!(
        "{:<6} {:<12} {:<32} {:>10}  {:<16}",
        "ID", "Date", "Description", "Amount", "Category"
    );
    println!("{}", "─".repeat(80));
    for tx in &transactions {
        println!(
            "{:<6} {:<12} {:<32} {:>10.2}  {:<16}",
            tx.id,
            truncate(&tx.date, 12),
            truncate(&tx.description, 32),
            tx.amount,
            tx.category.as_deref().unwrap_or("-"),
        );
    }
    println!();
    Ok(())
}

pub fn cmd_statements(db: &Database) -> Result<()> {
    let statements = db.list_statements(None)?;
    if statements.is_empty() {
        println!("No statements ingested yet.");
        return Ok(());
    }

    println!();
    for s in &statements {
        println!("📄 {}", s.source_file);
        if let Some(provider) = &s.provider_name {
            println!("   Provider: {}", provider);
        }
        if let Some(last4) = &s.account_last_4 {
            println!("   Account: ****{}", last4);
        }
        if let (Some(start), Some(end)) = (&s.period_start, &s.period_end) {
            println!("   Period: {} to {}", start, end);
        }
        if let Some(balance) = s.closing_balance {
            println!("   Closing balance: ${:.2}", balance);
        }
    }
    println!();
    Ok(())
}

pub fn cmd_insights(db: &Database, refresh: bool, json: bool) -> Result<()> {
    let pipeline = InsightPipeline::new(db);
    let report = pipeline.run(refresh).context("Insight pipeline failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("💡 Insights");
    if let Some(computed_at) = &report.computed_at {
        println!("   Computed: {}", computed_at);
    }
    println!();

    println!("  Spending by category:");
    let mut totals: Vec<_> = report.category_summary.iter().collect();
    totals.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (category, total) in totals {
        println!("    {:<24} ${:>10.2}", category, total);
    }

    println!();
    println!("  Trend: {:?} ({:+.1}% month over month)", report.trends.trend, report.trends.change_percentage);
    println!("  Subscriptions detected: {}", report.subscriptions.len());
    println!("  Anomalies: {}", report.anomalies.len());
    for anomaly in &report.anomalies {
        println!(
            "    [{:?}] {} (${:.2} on {})",
            anomaly.severity, anomaly.description, anomaly.amount, anomaly.date
        );
    }
    println!();
    if !refresh {
        println!("  (served from cache when valid; use --refresh to recompute)");
    }
    Ok(())
}

pub fn cmd_summary(db: &Database) -> Result<()> {
    let totals = summarize_by_category(db)?;
    if totals.is_empty() {
        println!("No categorized transactions yet.");
        return Ok(());
    }

    println!();
    println!("  {:<24} {:>12}", "Category", "Total");
    println!("  {}", "─".repeat(38));
    for ct in &totals {
        println!("  {:<24} ${:>11.2}", ct.category, ct.total);
    }
    println!();
    Ok(())
}

pub fn cmd_subscriptions(db: &Database) -> Result<()> {
    let subscriptions = detect_subscriptions(db)?;
    if subscriptions.is_empty() {
        println!("No recurring charges detected.");
        return Ok(());
    }

    println!();
    for sub in &subscriptions {
        let marker = if sub.is_likely_subscription { "📋" } else { "🔁" };
        println!(
            "{} {} - ${:.2}/mo ({} occurrences)",
            marker, sub.description, sub.estimated_monthly_cost, sub.occurrences
        );
        if let Some(provider) = &sub.provider {
            println!("   via {}", provider);
        }
    }
    println!();
    Ok(())
}

pub fn cmd_trends(db: &Database) -> Result<()> {
    let report = analyze_trends(db)?;

    println!();
    println!("📈 Spending Trends");
    println!(
        "   {:?}: {:+.1}% (${:.2} this month vs ${:.2} last month)",
        report.trend, report.change_percentage, report.current_month_total, report.previous_month_total
    );
    println!();
    println!("   Monthly:");
    for point in &report.monthly {
        println!("     {:<10} ${:>10.2}", point.month, point.amount);
    }
    if !report.weekly.is_empty() {
        println!("   Weekly (last 12 weeks):");
        for point in &report.weekly {
            println!("     {:<10} ${:>10.2}", point.week, point.amount);
        }
    }
    println!();
    Ok(())
}

pub fn cmd_anomalies(db: &Database) -> Result<()> {
    let anomalies = detect_anomalies(db)?;
    if anomalies.is_empty() {
        println!("Nothing unusual found.");
        return Ok(());
    }

    println!();
    for anomaly in &anomalies {
        println!(
            "⚠️  [{:?}] {} - ${:.2} at {} on {}",
            anomaly.severity, anomaly.description, anomaly.amount, anomaly.merchant, anomaly.date
        );
    }
    println!();
    Ok(())
}

pub fn cmd_enrich(db: &Database, merchant: &str) -> Result<()> {
    // Pipeline path keeps the per-merchant cache warm.
    let pipeline = InsightPipeline::new(db);
    let enrichment = pipeline
        .enrich_merchant_cached(merchant)
        .context("Merchant enrichment failed")?;

    println!();
    println!("🏷️  {}", merchant);
    println!("   Type: {}", enrichment.business_type);
    println!("   Category: {}", enrichment.inferred_category);
    match &enrichment.matched_keyword {
        Some(keyword) => println!("   Matched keyword: {}", keyword),
        None => println!("   No rule matched."),
    }
    println!();

    // Show what the raw matcher says too when it disagrees with a stale
    // cache entry.
    let fresh = enrich_merchant(merchant);
    if fresh != enrichment {
        println!("   (cached; current rules would say {})", fresh.inferred_category);
    }
    Ok(())
}
