//! Domain models for Spendlens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Spending categories produced and consumed by the insight tools
///
/// The storage layer keeps category as free text; this enum is the typed
/// boundary. Values read from legacy rows that don't match a known category
/// fall back to `Other` rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Transportation,
    Groceries,
    Dining,
    Travel,
    Subscriptions,
    Insurance,
    Utilities,
    Shopping,
    Miscellaneous,
    /// Payment toward a card balance; excluded from spending analytics
    CreditCardPayment,
    /// Movement between own accounts; excluded from spending analytics
    InternalTransfer,
    /// Unrecognized label carried through verbatim
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Transportation => "Transportation",
            Self::Groceries => "Groceries",
            Self::Dining => "Dining",
            Self::Travel => "Travel",
            Self::Subscriptions => "Subscriptions",
            Self::Insurance => "Insurance",
            Self::Utilities => "Utilities",
            Self::Shopping => "Shopping",
            Self::Miscellaneous => "Miscellaneous",
            Self::CreditCardPayment => "Credit Card Payment",
            Self::InternalTransfer => "Internal Transfer",
            Self::Other(s) => s,
        }
    }

    /// Whether this category is a balance movement rather than spending
    pub fn is_balance_movement(&self) -> bool {
        matches!(self, Self::CreditCardPayment | Self::InternalTransfer)
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Miscellaneous
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s.trim() {
            "Transportation" => Self::Transportation,
            "Groceries" => Self::Groceries,
            "Dining" => Self::Dining,
            "Travel" => Self::Travel,
            "Subscriptions" => Self::Subscriptions,
            "Insurance" => Self::Insurance,
            "Utilities" => Self::Utilities,
            "Shopping" => Self::Shopping,
            "Miscellaneous" => Self::Miscellaneous,
            "Credit Card Payment" => Self::CreditCardPayment,
            "Internal Transfer" => Self::InternalTransfer,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Kind of ledger entry, as reported by the extraction agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionType {
    Debit,
    Credit,
    Transfer,
    Payment,
    /// Unrecognized label carried through verbatim
    Other(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Debit => "Debit",
            Self::Credit => "Credit",
            Self::Transfer => "Transfer",
            Self::Payment => "Payment",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for TransactionType {
    fn from(s: &str) -> Self {
        match s.trim() {
            "Debit" => Self::Debit,
            "Credit" => Self::Credit,
            "Transfer" => Self::Transfer,
            "Payment" => Self::Payment,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TransactionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// A stored transaction row
///
/// `date` is kept as the raw string the extraction agent produced
/// (ISO-8601 by convention, but not validated at write time); the trend
/// analyzer parses it defensively on the read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: String,
    pub description: String,
    /// Positive = expense, negative = refund/credit/payment
    pub amount: f64,
    pub category: Option<String>,
    pub location: Option<String>,
    pub source_file: String,
    /// Cleaned merchant name, when the extractor produced one
    pub merchant: Option<String>,
    pub is_subscription: bool,
    pub payment_method: Option<String>,
    /// Comma-joined tag list
    pub tags: Option<String>,
    pub currency: String,
    pub raw_description: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub reference_number: Option<String>,
    pub account_last_4: Option<String>,
    pub provider_name: Option<String>,
    pub is_essential: Option<bool>,
    pub tax_category: Option<String>,
    /// Extraction confidence, 0.0-1.0
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A transaction to be saved (before DB insertion)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub category: Category,
    pub location: Option<String>,
    /// Defaults to "unknown" at save time when absent
    pub source_file: Option<String>,
    pub merchant: Option<String>,
    pub is_subscription: bool,
    pub payment_method: Option<String>,
    pub tags: Option<String>,
    /// Defaults to "USD" at save time when absent
    pub currency: Option<String>,
    pub raw_description: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub reference_number: Option<String>,
    pub account_last_4: Option<String>,
    pub provider_name: Option<String>,
    pub is_essential: Option<bool>,
    pub tax_category: Option<String>,
    pub confidence: Option<f64>,
}

impl NewTransaction {
    /// Convenience constructor for the required fields
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
        category: Category,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount,
            category,
            ..Default::default()
        }
    }
}

/// Statement-level metadata extracted alongside transactions
///
/// Upserted wholesale: re-processing a statement replaces every field,
/// including replacing previous values with NULL when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementMetadata {
    pub provider_name: Option<String>,
    pub account_last_4: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    pub total_credits: Option<f64>,
    pub total_debits: Option<f64>,
}

/// A stored statement row (one per source file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: i64,
    pub source_file: String,
    pub provider_name: Option<String>,
    pub account_last_4: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    pub total_credits: Option<f64>,
    pub total_debits: Option<f64>,
    pub created_at: DateTime<Utc>,
}
