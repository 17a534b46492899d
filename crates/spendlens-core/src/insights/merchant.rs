//! Keyword rule matcher for merchant names
//!
//! A fixed, ordered rule table maps substrings of the uppercased merchant
//! name to a business type and spending category. The first rule whose
//! keyword appears in the name wins, so rule order is part of the contract:
//! "APPLE STORE" resolves to Subscriptions via the earlier "APPLE" keyword,
//! not to Shopping.

use crate::models::Category;

use super::types::MerchantEnrichment;

struct MerchantRule {
    business_type: &'static str,
    category: Category,
    keywords: &'static [&'static str],
}

const MERCHANT_RULES: &[MerchantRule] = &[
    MerchantRule {
        business_type: "Transportation",
        category: Category::Transportation,
        keywords: &[
            "UBER", "LYFT", "TAXI", "METRO", "TRANSIT", "PARKING", "GAS", "SHELL", "CHEVRON",
            "EXXON",
        ],
    },
    MerchantRule {
        business_type: "Groceries",
        category: Category::Groceries,
        keywords: &[
            "WALMART", "COSTCO", "SAFEWAY", "KROGER", "TRADER JOE", "WHOLE FOODS", "ALDI",
            "PUBLIX", "HEB",
        ],
    },
    MerchantRule {
        business_type: "Dining",
        category: Category::Dining,
        keywords: &[
            "RESTAURANT", "CAFE", "COFFEE", "STARBUCKS", "MCDONALDS", "CHIPOTLE", "PIZZA",
            "SUSHI", "GRUBHUB", "DOORDASH",
        ],
    },
    MerchantRule {
        business_type: "Travel",
        category: Category::Travel,
        keywords: &[
            "AIRLINE", "HOTEL", "MARRIOTT", "HILTON", "HERTZ", "AVIS", "AIRBNB", "BOOKING",
            "EXPEDIA", "SOUTHWEST", "DELTA", "UNITED",
        ],
    },
    MerchantRule {
        business_type: "Subscriptions",
        category: Category::Subscriptions,
        keywords: &[
            "NETFLIX", "SPOTIFY", "APPLE", "AMAZON PRIME", "HULU", "HBO", "DISNEY", "YOUTUBE",
        ],
    },
    MerchantRule {
        business_type: "Insurance",
        category: Category::Insurance,
        keywords: &["INSURANCE", "GEICO", "STATE FARM", "ALLSTATE", "PROGRESSIVE"],
    },
    MerchantRule {
        business_type: "Utilities",
        category: Category::Utilities,
        keywords: &[
            "ELECTRIC", "WATER", "GAS BILL", "INTERNET", "COMCAST", "ATT", "VERIZON", "TMOBILE",
        ],
    },
    MerchantRule {
        business_type: "Shopping",
        category: Category::Shopping,
        keywords: &["AMAZON", "TARGET", "BEST BUY", "APPLE STORE", "NORDSTROM", "MACYS"],
    },
];

/// Look up a merchant name against the rule table
///
/// Matching is case-insensitive substring containment; the first rule (in
/// table order) with a matching keyword wins. Unrecognized names get the
/// `unknown()` enrichment rather than an error.
pub fn enrich_merchant(merchant_name: &str) -> MerchantEnrichment {
    let upper = merchant_name.to_uppercase();

    for rule in MERCHANT_RULES {
        for keyword in rule.keywords {
            if upper.contains(keyword) {
                return MerchantEnrichment {
                    business_type: Category::from(rule.business_type),
                    inferred_category: rule.category.clone(),
                    matched_keyword: Some((*keyword).to_string()),
                };
            }
        }
    }

    MerchantEnrichment::unknown()
}
