//! Spending trend analysis
//!
//! Aggregation happens in process rather than in SQL because stored dates
//! are free text and arrive in more than one format. Rows whose date can't
//! be parsed are skipped, never fatal. All windows are anchored to the
//! latest parseable transaction date, not the wall clock, so historical
//! data sets produce stable output.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::db::Database;
use crate::error::Result;
use crate::models::Category;

use super::types::{DailyPoint, MonthlyPoint, TrendDirection, TrendReport, WeeklyPoint};
use super::{round1, round2};

/// Month-over-month change beyond this percentage counts as a trend
const TREND_BAND_PCT: f64 = 5.0;

/// Parse the date formats seen in practice
///
/// Accepts `YYYY-MM-DD` (and `YYYY-M-D`), plus slash dates with a 4-digit
/// year. Slash dates are tried month-first (`MM/DD/YYYY`); when that yields
/// an impossible date, day-first is tried instead.
fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    if s.contains('-') {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() == 3 && parts[0].len() == 4 {
            let y: i32 = parts[0].trim().parse().ok()?;
            let m: u32 = parts[1].trim().parse().ok()?;
            let d: u32 = parts[2].trim().parse().ok()?;
            return NaiveDate::from_ymd_opt(y, m, d);
        }
        return None;
    }
    if s.contains('/') {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() == 3 && parts[2].len() == 4 {
            let y: i32 = parts[2].trim().parse().ok()?;
            let a: u32 = parts[0].trim().parse().ok()?;
            let b: u32 = parts[1].trim().parse().ok()?;
            return NaiveDate::from_ymd_opt(y, a, b).or_else(|| NaiveDate::from_ymd_opt(y, b, a));
        }
        return None;
    }
    None
}

/// Analyze spending over time: daily, weekly, and monthly series plus a
/// month-over-month direction
///
/// Balance movements (card payments, internal transfers) are excluded so a
/// payment doesn't double-count against the spending it covers. Refunds
/// (negative amounts) do count, as reductions.
pub fn analyze_trends(db: &Database) -> Result<TrendReport> {
    let transactions = db.all_transactions()?;

    let mut parsed: Vec<(NaiveDate, f64)> = transactions
        .iter()
        .filter(|tx| {
            tx.category
                .as_deref()
                .map(|c| !Category::from(c).is_balance_movement())
                .unwrap_or(true)
        })
        .filter_map(|tx| parse_flexible_date(&tx.date).map(|d| (d, tx.amount)))
        .collect();

    if parsed.is_empty() {
        return Ok(TrendReport::default());
    }

    parsed.sort_by_key(|(date, _)| *date);
    let anchor = parsed[parsed.len() - 1].0;

    // Daily: last 30 days of data
    let thirty_days_ago = anchor - Duration::days(30);
    let mut daily_map: BTreeMap<String, f64> = BTreeMap::new();
    for (date, amount) in &parsed {
        if *date >= thirty_days_ago {
            *daily_map.entry(date.format("%Y-%m-%d").to_string()).or_default() += amount;
        }
    }
    let daily = daily_map
        .into_iter()
        .map(|(date, amount)| DailyPoint { date, amount: round2(amount) })
        .collect();

    // Weekly: last 12 weeks of data
    let twelve_weeks_ago = anchor - Duration::weeks(12);
    let mut weekly_map: BTreeMap<String, f64> = BTreeMap::new();
    for (date, amount) in &parsed {
        if *date >= twelve_weeks_ago {
            *weekly_map.entry(date.format("%Y-W%W").to_string()).or_default() += amount;
        }
    }
    let weekly = weekly_map
        .into_iter()
        .map(|(week, amount)| WeeklyPoint { week, amount: round2(amount) })
        .collect();

    // Monthly: all history, reported as the last 12
    let mut monthly_map: BTreeMap<String, f64> = BTreeMap::new();
    for (date, amount) in &parsed {
        *monthly_map.entry(date.format("%Y-%m").to_string()).or_default() += amount;
    }
    let monthly: Vec<MonthlyPoint> = monthly_map
        .into_iter()
        .map(|(month, amount)| MonthlyPoint { month, amount: round2(amount) })
        .collect();

    let mut change_pct = 0.0;
    let mut current = 0.0;
    let mut previous = 0.0;
    if monthly.len() >= 2 {
        current = monthly[monthly.len() - 1].amount;
        previous = monthly[monthly.len() - 2].amount;
        if previous != 0.0 {
            change_pct = (current - previous) / previous.abs() * 100.0;
        }
    } else if let Some(only) = monthly.first() {
        current = only.amount;
    }

    // Direction uses the raw change; the band is strict on both sides.
    let trend = if change_pct > TREND_BAND_PCT {
        TrendDirection::Increasing
    } else if change_pct < -TREND_BAND_PCT {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    let monthly_tail = if monthly.len() > 12 {
        monthly[monthly.len() - 12..].to_vec()
    } else {
        monthly
    };

    Ok(TrendReport {
        trend,
        change_percentage: round1(change_pct),
        current_month_total: round2(current),
        previous_month_total: round2(previous),
        daily,
        weekly,
        monthly: monthly_tail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTransaction;

    fn tx(date: &str, description: &str, amount: f64) -> NewTransaction {
        NewTransaction::new(date, description, amount, Category::Miscellaneous)
    }

    #[test]
    fn test_parse_flexible_date() {
        let iso = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        assert_eq!(parse_flexible_date("2025-12-15"), Some(iso));
        assert_eq!(parse_flexible_date("2025-2-3"), NaiveDate::from_ymd_opt(2025, 2, 3));
        assert_eq!(parse_flexible_date("12/15/2025"), Some(iso));
        // Month-first fails for 25/12, so day-first kicks in
        assert_eq!(
            parse_flexible_date("25/12/2025"),
            NaiveDate::from_ymd_opt(2025, 12, 25)
        );
        assert_eq!(parse_flexible_date("notadate"), None);
        assert_eq!(parse_flexible_date("2025-13-45"), None);
        assert_eq!(parse_flexible_date("15-12-2025"), None);
    }

    #[test]
    fn test_empty_database_is_stable() {
        let db = Database::in_memory().unwrap();
        let report = analyze_trends(&db).unwrap();
        assert_eq!(report, TrendReport::default());
    }

    #[test]
    fn test_unparseable_dates_are_skipped() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("sometime in december", "Mystery", 999.0),
            tx("2025-12-01", "Starbucks", 10.0),
        ])
        .unwrap();

        let report = analyze_trends(&db).unwrap();
        assert_eq!(report.daily.len(), 1);
        assert!((report.current_month_total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_change_is_stable() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-11-10", "Rent Nov", 100.0),
            tx("2025-12-10", "Rent Dec", 104.0),
        ])
        .unwrap();

        let report = analyze_trends(&db).unwrap();
        assert_eq!(report.trend, TrendDirection::Stable);
        assert!((report.change_percentage - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_exactly_five_percent_is_stable() {
        // The band is strict on both sides: exactly +5% and exactly -5%
        // both classify as stable.
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-11-10", "Rent Nov", 100.0),
            tx("2025-12-10", "Rent Dec", 105.0),
        ])
        .unwrap();
        let report = analyze_trends(&db).unwrap();
        assert_eq!(report.trend, TrendDirection::Stable);
        assert!((report.change_percentage - 5.0).abs() < 1e-9);

        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-11-10", "Rent Nov", 100.0),
            tx("2025-12-10", "Rent Dec", 95.0),
        ])
        .unwrap();
        let report = analyze_trends(&db).unwrap();
        assert_eq!(report.trend, TrendDirection::Stable);
        assert!((report.change_percentage + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_increase_and_decrease_directions() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-11-10", "Nov spend", 100.0),
            tx("2025-12-10", "Dec spend", 120.0),
        ])
        .unwrap();
        let report = analyze_trends(&db).unwrap();
        assert_eq!(report.trend, TrendDirection::Increasing);
        assert!((report.change_percentage - 20.0).abs() < 1e-9);
        assert!((report.current_month_total - 120.0).abs() < 1e-9);
        assert!((report.previous_month_total - 100.0).abs() < 1e-9);

        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-11-10", "Nov spend", 100.0),
            tx("2025-12-10", "Dec spend", 80.0),
        ])
        .unwrap();
        assert_eq!(analyze_trends(&db).unwrap().trend, TrendDirection::Decreasing);
    }

    #[test]
    fn test_single_month_has_no_previous() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[tx("2025-12-10", "Only spend", 75.0)]).unwrap();

        let report = analyze_trends(&db).unwrap();
        assert_eq!(report.trend, TrendDirection::Stable);
        assert!((report.change_percentage).abs() < 1e-9);
        assert!((report.current_month_total - 75.0).abs() < 1e-9);
        assert!((report.previous_month_total).abs() < 1e-9);
    }

    #[test]
    fn test_windows_anchor_to_latest_data_not_today() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2020-01-05", "Ancient", 40.0),
            tx("2020-03-01", "Within month", 25.0),
            tx("2020-03-20", "Anchor", 60.0),
        ])
        .unwrap();

        let report = analyze_trends(&db).unwrap();
        // Daily window is the 30 days before 2020-03-20; January falls out.
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily[0].date, "2020-03-01");
        // Monthly keeps all history.
        assert_eq!(report.monthly.len(), 2);
        assert_eq!(report.monthly[0].month, "2020-01");
    }

    #[test]
    fn test_balance_movements_excluded() {
        let db = Database::in_memory().unwrap();
        db.save_transactions(&[
            tx("2025-12-01", "Groceries", 50.0),
            NewTransaction::new(
                "2025-12-05",
                "Card payment",
                500.0,
                Category::CreditCardPayment,
            ),
        ])
        .unwrap();

        let report = analyze_trends(&db).unwrap();
        assert!((report.current_month_total - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_series_capped_at_twelve() {
        let db = Database::in_memory().unwrap();
        let mut batch = Vec::new();
        for year in [2024, 2025] {
            for month in 1..=12 {
                batch.push(tx(
                    &format!("{}-{:02}-15", year, month),
                    &format!("Spend {} {}", year, month),
                    100.0,
                ));
            }
        }
        db.save_transactions(&batch).unwrap();

        let report = analyze_trends(&db).unwrap();
        assert_eq!(report.monthly.len(), 12);
        assert_eq!(report.monthly[0].month, "2025-01");
        assert_eq!(report.monthly[11].month, "2025-12");
    }
}
