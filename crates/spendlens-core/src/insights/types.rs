//! Shared types for the insight tools

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Cache namespace for each kind of insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsightType {
    CategorySummary,
    Subscriptions,
    Trends,
    Anomalies,
    MerchantEnrichment,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategorySummary => "category_summary",
            Self::Subscriptions => "subscriptions",
            Self::Trends => "trends",
            Self::Anomalies => "anomalies",
            Self::MerchantEnrichment => "merchant_enrichment",
        }
    }
}

impl std::str::FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category_summary" => Ok(Self::CategorySummary),
            "subscriptions" => Ok(Self::Subscriptions),
            "trends" => Ok(Self::Trends),
            "anomalies" => Ok(Self::Anomalies),
            "merchant_enrichment" => Ok(Self::MerchantEnrichment),
            other => Err(format!("unknown insight type: {}", other)),
        }
    }
}

impl std::fmt::Display for InsightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Total spend for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// A recurring charge the subscription detector surfaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionCandidate {
    pub description: String,
    pub amount: f64,
    pub occurrences: i64,
    pub provider: Option<String>,
    pub account: Option<String>,
    /// True when the description matches a known subscription keyword
    pub is_likely_subscription: bool,
    pub estimated_monthly_cost: f64,
}

/// What kind of anomaly was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Spike,
    NewMerchant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

/// A single unusual transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub severity: AnomalySeverity,
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub merchant: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPoint {
    /// Week key in `%Y-W%W` form
    pub week: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// Month key in `%Y-%m` form
    pub month: String,
    pub amount: f64,
}

/// Month-over-month spending direction plus the series behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub trend: TrendDirection,
    /// Percent change vs the previous month, rounded to one decimal
    pub change_percentage: f64,
    pub current_month_total: f64,
    pub previous_month_total: f64,
    pub daily: Vec<DailyPoint>,
    pub weekly: Vec<WeeklyPoint>,
    pub monthly: Vec<MonthlyPoint>,
}

impl Default for TrendReport {
    fn default() -> Self {
        Self {
            trend: TrendDirection::Stable,
            change_percentage: 0.0,
            current_month_total: 0.0,
            previous_month_total: 0.0,
            daily: Vec::new(),
            weekly: Vec::new(),
            monthly: Vec::new(),
        }
    }
}

/// What the rule matcher knows about a merchant name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantEnrichment {
    /// Business type implied by the matched rule
    #[serde(rename = "type")]
    pub business_type: Category,
    /// Spending category the merchant maps to
    pub inferred_category: Category,
    /// The keyword that matched, absent when no rule fired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
}

impl MerchantEnrichment {
    /// Result for a merchant no rule recognizes
    pub fn unknown() -> Self {
        Self {
            business_type: Category::Other("Unknown".to_string()),
            inferred_category: Category::Miscellaneous,
            matched_keyword: None,
        }
    }
}

/// Everything the pipeline produces in one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightReport {
    pub category_summary: BTreeMap<String, f64>,
    pub subscriptions: Vec<SubscriptionCandidate>,
    pub trends: TrendReport,
    pub anomalies: Vec<Anomaly>,
    pub merchants: BTreeMap<String, MerchantEnrichment>,
    /// When the category summary was computed (from cache when served cached)
    pub computed_at: Option<String>,
}
