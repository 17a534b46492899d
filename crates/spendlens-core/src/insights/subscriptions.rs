//! Recurring charge detection
//!
//! Groups charges by the exact (description, amount, provider, account)
//! tuple; a price change therefore starts a new group. Two occurrences get
//! a candidate considered only if the description carries a subscription
//! keyword; three or more qualify regardless.

use rusqlite::params;

use crate::db::Database;
use crate::error::Result;

use super::types::SubscriptionCandidate;

/// Description keywords that mark a charge as subscription-like
const SUBSCRIPTION_KEYWORDS: &[&str] = &[
    "SUBSCRIPTION",
    "MONTHLY",
    "NETFLIX",
    "SPOTIFY",
    "APPLE",
    "AMAZON PRIME",
    "HULU",
    "HBO",
    "DISNEY",
    "YOUTUBE",
    "INSURANCE",
];

fn has_subscription_keyword(description: &str) -> bool {
    let upper = description.to_uppercase();
    SUBSCRIPTION_KEYWORDS.iter().any(|k| upper.contains(k))
}

/// Detect likely subscriptions from repeated identical charges
pub fn detect_subscriptions(db: &Database) -> Result<Vec<SubscriptionCandidate>> {
    let conn = db.conn()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT description, amount, provider_name, account_last_4, COUNT(*) as occurrences
        FROM transactions
        GROUP BY description, amount, provider_name, account_last_4
        HAVING COUNT(*) >= ?
        ORDER BY COUNT(*) DESC
        "#,
    )?;

    let groups = stmt
        .query_map(params![2], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut candidates = Vec::new();
    for (description, amount, provider, account, occurrences) in groups {
        let flagged = has_subscription_keyword(&description);
        if !flagged && occurrences < 3 {
            continue;
        }
        candidates.push(SubscriptionCandidate {
            estimated_monthly_cost: amount,
            description,
            amount,
            occurrences,
            provider,
            account,
            is_likely_subscription: flagged,
        });
    }

    Ok(candidates)
}
