//! Insight pipeline orchestration
//!
//! `run` serves from the cache when possible and otherwise recomputes
//! everything. The cache check is all-or-nothing: the presence of ANY
//! valid cached insight serves a cached report, even when other insight
//! types are missing from it (those come back as empty defaults until the
//! next forced refresh or expiry).

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::db::{Database, InsightRecord};
use crate::error::{Error, Result};
use crate::retry::{with_retry, BackoffPolicy};

use super::anomalies::detect_anomalies;
use super::merchant::enrich_merchant;
use super::subscriptions::detect_subscriptions;
use super::summary::summarize_by_category;
use super::trends::analyze_trends;
use super::types::{InsightReport, InsightType, MerchantEnrichment};

/// Runs the insight tools and manages their cache
pub struct InsightPipeline<'a> {
    db: &'a Database,
    backoff: BackoffPolicy,
}

impl<'a> InsightPipeline<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Produce a full insight report, from cache when permitted
    ///
    /// With `force_refresh` every tool runs and the cache is rewritten.
    /// A cache write failure aborts the run after retries; partial results
    /// are not returned.
    pub fn run(&self, force_refresh: bool) -> Result<InsightReport> {
        if !force_refresh {
            if let Some(cached) = self.cached_report()? {
                info!("Serving insights from cache");
                return Ok(cached);
            }
        }

        info!("Computing category summary");
        let summary = summarize_by_category(self.db)?;
        let category_summary: BTreeMap<String, f64> = summary
            .into_iter()
            .map(|ct| (ct.category, ct.total))
            .collect();
        self.save(InsightType::CategorySummary, &serde_json::to_value(&category_summary)?)?;

        info!("Detecting subscriptions");
        let subscriptions = detect_subscriptions(self.db)?;
        self.save(InsightType::Subscriptions, &serde_json::to_value(&subscriptions)?)?;

        info!("Analyzing trends");
        let trends = analyze_trends(self.db)?;
        self.save(InsightType::Trends, &serde_json::to_value(&trends)?)?;

        info!("Detecting anomalies");
        let anomalies = detect_anomalies(self.db)?;
        self.save(InsightType::Anomalies, &serde_json::to_value(&anomalies)?)?;

        info!("Insight pipeline complete");
        Ok(InsightReport {
            category_summary,
            subscriptions,
            trends,
            anomalies,
            merchants: BTreeMap::new(),
            computed_at: Some(format_timestamp(Utc::now())),
        })
    }

    /// Look up a merchant, serving and maintaining the per-merchant cache
    pub fn enrich_merchant_cached(&self, merchant_name: &str) -> Result<MerchantEnrichment> {
        let cached = self
            .db
            .valid_insights()?
            .into_iter()
            .find(|r| {
                r.insight_type == InsightType::MerchantEnrichment.as_str() && r.key == merchant_name
            });
        if let Some(record) = cached {
            match serde_json::from_str(&record.value) {
                Ok(enrichment) => return Ok(enrichment),
                Err(e) => {
                    warn!(merchant = merchant_name, error = %e, "Discarding malformed cached enrichment");
                }
            }
        }

        let enrichment = enrich_merchant(merchant_name);
        let value = serde_json::to_value(&enrichment)?;
        with_retry(&self.backoff, Error::is_transient, || {
            self.db.save_insight(
                InsightType::MerchantEnrichment.as_str(),
                merchant_name,
                &value,
                None,
                1.0,
            )
        })?;
        Ok(enrichment)
    }

    /// Assemble a report from valid cached rows, if there are any
    ///
    /// Unknown insight types and rows whose payload fails to parse are
    /// skipped individually; they don't invalidate the rest of the cache.
    fn cached_report(&self) -> Result<Option<InsightReport>> {
        let records = self.db.valid_insights()?;
        if records.is_empty() {
            return Ok(None);
        }

        let mut report = InsightReport::default();
        for record in records {
            let Ok(insight_type) = record.insight_type.parse::<InsightType>() else {
                warn!(insight_type = %record.insight_type, "Skipping unknown cached insight type");
                continue;
            };
            match insight_type {
                InsightType::CategorySummary => {
                    if let Some(value) = parse_cached(&record) {
                        report.category_summary = value;
                        report.computed_at = Some(format_timestamp(record.computed_at));
                    }
                }
                InsightType::Subscriptions => {
                    if let Some(value) = parse_cached(&record) {
                        report.subscriptions = value;
                    }
                }
                InsightType::Trends => {
                    if let Some(value) = parse_cached(&record) {
                        report.trends = value;
                    }
                }
                InsightType::Anomalies => {
                    if let Some(value) = parse_cached(&record) {
                        report.anomalies = value;
                    }
                }
                InsightType::MerchantEnrichment => {
                    if let Some(value) = parse_cached(&record) {
                        report.merchants.insert(record.key.clone(), value);
                    }
                }
            }
        }

        Ok(Some(report))
    }

    fn save(&self, insight_type: InsightType, value: &serde_json::Value) -> Result<()> {
        with_retry(&self.backoff, Error::is_transient, || {
            self.db
                .save_insight(insight_type.as_str(), "all", value, None, 1.0)
        })
    }
}

fn parse_cached<T: serde::de::DeserializeOwned>(record: &InsightRecord) -> Option<T> {
    match serde_json::from_str(&record.value) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                insight_type = %record.insight_type,
                key = %record.key,
                error = %e,
                "Skipping malformed cached insight"
            );
            None
        }
    }
}

fn format_timestamp(dt: chrono::DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewTransaction};

    fn seeded_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            NewTransaction::new("2025-11-15", "Netflix", 19.99, Category::Subscriptions),
            NewTransaction::new("2025-12-15", "Netflix", 19.99, Category::Subscriptions),
            NewTransaction::new("2025-12-01", "Starbucks", 5.75, Category::Dining),
            NewTransaction::new("2025-12-02", "Safeway", 45.20, Category::Groceries),
        ])
        .unwrap();
        db
    }

    #[test]
    fn test_fresh_run_computes_and_caches() {
        let db = seeded_db();
        let pipeline = InsightPipeline::new(&db);

        let report = pipeline.run(false).unwrap();
        assert_eq!(report.subscriptions.len(), 1);
        assert!((report.category_summary["Dining"] - 5.75).abs() < 1e-9);
        assert!(report.computed_at.is_some());

        // All four singleton insights are now cached.
        let cached = db.valid_insights().unwrap();
        assert_eq!(cached.len(), 4);
    }

    #[test]
    fn test_second_run_is_served_from_cache() {
        let db = seeded_db();
        let pipeline = InsightPipeline::new(&db);
        let first = pipeline.run(false).unwrap();

        // New data arrives, but the cache is still valid.
        db.save_transactions(&[NewTransaction::new(
            "2025-12-20",
            "Target",
            300.0,
            Category::Shopping,
        )])
        .unwrap();

        let second = pipeline.run(false).unwrap();
        assert_eq!(second.category_summary, first.category_summary);
        assert!(!second.category_summary.contains_key("Shopping"));
    }

    #[test]
    fn test_force_refresh_recomputes() {
        let db = seeded_db();
        let pipeline = InsightPipeline::new(&db);
        pipeline.run(false).unwrap();

        db.save_transactions(&[NewTransaction::new(
            "2025-12-20",
            "Target",
            300.0,
            Category::Shopping,
        )])
        .unwrap();

        let refreshed = pipeline.run(true).unwrap();
        assert!((refreshed.category_summary["Shopping"] - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_any_valid_insight_suppresses_recompute() {
        let db = seeded_db();
        let pipeline = InsightPipeline::new(&db);

        // Only one insight type is cached; the report is still served from
        // cache with everything else defaulted, subscriptions included.
        db.save_insight(
            "category_summary",
            "all",
            &serde_json::json!({"Dining": 5.75}),
            None,
            1.0,
        )
        .unwrap();

        let report = pipeline.run(false).unwrap();
        assert_eq!(report.category_summary.len(), 1);
        assert!(report.subscriptions.is_empty());
        assert!(report.anomalies.is_empty());
        assert!(report.computed_at.is_some());
    }

    #[test]
    fn test_malformed_cached_row_is_skipped() {
        let db = seeded_db();
        let pipeline = InsightPipeline::new(&db);

        db.save_insight("subscriptions", "all", &serde_json::json!("not-a-list"), None, 1.0)
            .unwrap();
        db.save_insight(
            "category_summary",
            "all",
            &serde_json::json!({"Dining": 5.75}),
            None,
            1.0,
        )
        .unwrap();

        let report = pipeline.run(false).unwrap();
        assert!(report.subscriptions.is_empty());
        assert_eq!(report.category_summary.len(), 1);
    }

    #[test]
    fn test_merchant_enrichment_is_cached_per_merchant() {
        let db = Database::in_memory().unwrap();
        let pipeline = InsightPipeline::new(&db);

        let first = pipeline.enrich_merchant_cached("Starbucks Reserve").unwrap();
        assert_eq!(first.inferred_category, Category::Dining);

        let cached = db.valid_insights().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].key, "Starbucks Reserve");

        let second = pipeline.enrich_merchant_cached("Starbucks Reserve").unwrap();
        assert_eq!(second, first);
        assert_eq!(db.valid_insights().unwrap().len(), 1);
    }

    #[test]
    fn test_cached_merchants_appear_in_report() {
        let db = seeded_db();
        let pipeline = InsightPipeline::new(&db);
        pipeline.enrich_merchant_cached("Netflix").unwrap();

        let report = pipeline.run(false).unwrap();
        assert_eq!(
            report.merchants["Netflix"].inferred_category,
            Category::Subscriptions
        );
    }
}
