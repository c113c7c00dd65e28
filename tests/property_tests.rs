/// Property-based tests using proptest
/// Tests invariants that should hold for all sales, ranges and totals
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use sales_analytics::config::AnalyticsSettings;
use sales_analytics::filter::filter_sales;
use sales_analytics::journey::{score_progress, TierTable};
use sales_analytics::models::{LooseValue, RawSale};
use sales_analytics::normalization::{normalize_sales, parse_amount, parse_sale_date};
use sales_analytics::range::DateRange;
use sales_analytics::series::build_series;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn instant(days: i64, seconds: i64) -> NaiveDateTime {
    base() + Duration::days(days) + Duration::seconds(seconds)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
}

fn tier_threshold(table: &TierTable, id: &str) -> f64 {
    table
        .tiers()
        .iter()
        .find(|tier| tier.id == id)
        .map(|tier| tier.threshold)
        .unwrap_or(0.0)
}

prop_compose! {
    fn arb_sale()(
        day in 0i64..1200,
        amount in 0u32..100_000,
        approved in proptest::bool::ANY,
    ) -> RawSale {
        let date = (base() + Duration::days(day)).format("%Y-%m-%d %H:%M:%S").to_string();
        RawSale::new(
            &format!("sale-{}", day),
            f64::from(amount),
            if approved { "approved" } else { "pending" },
            Some(&date),
        )
    }
}

// Property: range normalization is idempotent and order-insensitive
proptest! {
    #[test]
    fn normalization_is_idempotent(
        a_day in -3000i64..3000, a_sec in 0i64..86_400,
        b_day in -3000i64..3000, b_sec in 0i64..86_400,
    ) {
        let once = DateRange::new(instant(a_day, a_sec), instant(b_day, b_sec)).normalized();
        prop_assert_eq!(once.normalized(), once);
        prop_assert!(once.start <= once.end);
    }

    #[test]
    fn inverted_ranges_are_swapped(
        a_day in -3000i64..3000, a_sec in 0i64..86_400,
        b_day in -3000i64..3000, b_sec in 0i64..86_400,
    ) {
        let a = instant(a_day, a_sec);
        let b = instant(b_day, b_sec);
        prop_assert_eq!(DateRange::new(a, b).normalized(), DateRange::new(b, a).normalized());
    }
}

// Property: every period of the span gets exactly one bucket
proptest! {
    #[test]
    fn series_have_no_gaps(start_day in 0i64..2000, length in 0i64..800) {
        let start = base().date() + Duration::days(start_day);
        let end = start + Duration::days(length);
        let range = DateRange::from_dates(start, end);

        let series = build_series(&[], Some(&range), today(), &AnalyticsSettings::default());

        let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32 + 1;
        prop_assert_eq!(series.daily.len() as i64, length + 1);
        prop_assert_eq!(series.monthly.len() as i32, months);
        prop_assert_eq!(series.yearly.len() as i32, end.year() - start.year() + 1);
    }
}

// Property: bucketing conserves revenue and keeps average ticket exact
proptest! {
    #[test]
    fn daily_revenue_sums_to_filtered_total(
        sales in proptest::collection::vec(arb_sale(), 0..60),
        start_day in 0i64..1200,
        length in 0i64..400,
    ) {
        let settings = AnalyticsSettings::default();
        let start = base().date() + Duration::days(start_day);
        let range = DateRange::from_dates(start, start + Duration::days(length));

        let normalized = normalize_sales(&sales, settings.timezone);
        let filtered = filter_sales(&normalized, Some(&range));
        let series = build_series(&filtered, Some(&range), today(), &settings);

        let expected: f64 = filtered.iter().map(|s| s.amount).sum();
        let bucketed: f64 = series.daily.iter().map(|b| b.revenue).sum();
        prop_assert!((expected - bucketed).abs() < 1e-6);

        let counted: u64 = series.daily.iter().map(|b| b.count).sum();
        prop_assert_eq!(counted, filtered.len() as u64);
    }

    #[test]
    fn average_ticket_is_exact(sales in proptest::collection::vec(arb_sale(), 0..60)) {
        let settings = AnalyticsSettings::default();
        let normalized = normalize_sales(&sales, settings.timezone);
        let filtered = filter_sales(&normalized, None);
        let series = build_series(&filtered, None, today(), &settings);

        for bucket in series.daily.iter().chain(&series.monthly).chain(&series.yearly) {
            if bucket.count == 0 {
                prop_assert_eq!(bucket.average_ticket, 0.0);
            } else {
                prop_assert_eq!(bucket.average_ticket, bucket.revenue / bucket.count as f64);
            }
        }
    }
}

// Property: journey tiers are monotonic and progress stays in bounds
proptest! {
    #[test]
    fn tiers_are_monotonic(a in 0.0f64..10_000_000.0, b in 0.0f64..10_000_000.0) {
        let table = TierTable::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        let low_tier = score_progress(low, &table).current_tier_id;
        let high_tier = score_progress(high, &table).current_tier_id;
        prop_assert!(tier_threshold(&table, &low_tier) <= tier_threshold(&table, &high_tier));
    }

    #[test]
    fn progress_is_bounded(total in proptest::num::f64::ANY) {
        let progress = score_progress(total, &TierTable::default());
        prop_assert!((0.0..=100.0).contains(&progress.progress_percentage));
    }

    #[test]
    fn unlocked_flags_are_monotonic(total in 0.0f64..10_000_000.0) {
        let progress = score_progress(total, &TierTable::default());
        let flags: Vec<bool> = progress.tiers.iter().map(|t| t.unlocked).collect();
        prop_assert!(flags.windows(2).all(|pair| pair[0] || !pair[1]));
    }
}

// Property: tolerant parsers never panic
proptest! {
    #[test]
    fn amount_parsing_never_panics(text in "\\PC*") {
        let value = parse_amount(&LooseValue::Text(text));
        prop_assert!(value.is_finite());
    }

    #[test]
    fn date_parsing_never_panics(text in "\\PC*") {
        let _ = parse_sale_date(&text, AnalyticsSettings::default().timezone);
    }
}
