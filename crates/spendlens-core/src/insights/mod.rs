//! Insight tools and their orchestration
//!
//! Each tool is a pure read over the transaction store; the pipeline runs
//! them, caches their output, and assembles the combined report.

mod anomalies;
mod merchant;
mod pipeline;
mod subscriptions;
mod summary;
mod trends;
mod types;

pub use anomalies::detect_anomalies;
pub use merchant::enrich_merchant;
pub use pipeline::InsightPipeline;
pub use subscriptions::detect_subscriptions;
pub use summary::summarize_by_category;
pub use trends::analyze_trends;
pub use types::{
    Anomaly, AnomalyKind, AnomalySeverity, CategoryTotal, DailyPoint, InsightReport, InsightType,
    MerchantEnrichment, MonthlyPoint, SubscriptionCandidate, TrendDirection, TrendReport,
    WeeklyPoint,
};

/// Round to cents
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Round to one decimal (percentages)
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
