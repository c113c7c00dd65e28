/// Calendar-complete revenue series
///
/// Filtered sales are bucketed by day, month and year. Every period of the
/// covered span gets a bucket, zero-filled when nothing sold, so the chart
/// never shows gaps. The span is, in order of preference:
/// 1. the normalized range, when one was given
/// 2. the observed min/max sale dates
/// 3. the last `fallback_days` days ending today
///
/// Spans longer than `max_range_days` keep only their most recent days.
use crate::config::AnalyticsSettings;
use crate::models::{Bucket, SalesSeries};
use crate::normalization::NormalizedSale;
use crate::range::DateRange;
use chrono::{Datelike, Days, Duration, Months, NaiveDate};
use std::collections::HashMap;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Month,
    Year,
}

impl Granularity {
    /// Canonical accumulator key of the period containing `date`.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Day => date.format("%Y-%m-%d").to_string(),
            Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
            Granularity::Year => format!("{:04}", date.year()),
        }
    }
}

/// Inclusive first and last calendar day the series must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Span {
    /// Span for a set of sales: the range if given, else the observed
    /// dates, else the fallback window ending `today`.
    pub fn resolve(
        sales: &[NormalizedSale],
        range: Option<&DateRange>,
        today: NaiveDate,
        settings: &AnalyticsSettings,
    ) -> Self {
        Self::covering(sales, range, today, settings.fallback_days)
            .capped(settings.max_range_days)
    }

    fn covering(
        sales: &[NormalizedSale],
        range: Option<&DateRange>,
        today: NaiveDate,
        fallback_days: u32,
    ) -> Self {
        if let Some(range) = range {
            return Self {
                start: range.start_date(),
                end: range.end_date(),
            };
        }

        let mut dates = sales.iter().filter_map(|s| s.occurred_at.map(|at| at.date()));
        if let Some(first) = dates.next() {
            let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
            return Self { start, end };
        }

        let back = u64::from(fallback_days.max(1)) - 1;
        Self {
            start: today.checked_sub_days(Days::new(back)).unwrap_or(today),
            end: today,
        }
    }

    /// Keep at most the last `max_days` days of the span.
    fn capped(self, max_days: u32) -> Self {
        let back = u64::from(max_days.max(1)) - 1;
        match self.end.checked_sub_days(Days::new(back)) {
            Some(earliest) if earliest > self.start => {
                tracing::warn!(
                    "Series span {} .. {} exceeds {} days, starting at {}",
                    self.start,
                    self.end,
                    max_days,
                    earliest
                );
                Self {
                    start: earliest,
                    end: self.end,
                }
            }
            _ => self,
        }
    }

    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn crosses_year(&self) -> bool {
        self.start.year() != self.end.year()
    }
}

/// Month label: `jan`, or `jan/24` when the span covers several years.
pub fn month_label(date: NaiveDate, with_year: bool) -> String {
    let abbreviation = MONTH_ABBREVIATIONS[date.month0() as usize];
    if with_year {
        format!("{}/{:02}", abbreviation, date.year().rem_euclid(100))
    } else {
        abbreviation.to_string()
    }
}

fn make_bucket(key: String, period_label: String, total: Option<&(f64, u64)>, fee_rate: f64) -> Bucket {
    let (revenue, count) = total.copied().unwrap_or((0.0, 0));
    Bucket {
        key,
        period_label,
        revenue,
        net_revenue: revenue * (1.0 - fee_rate),
        count,
        average_ticket: if count > 0 { revenue / count as f64 } else { 0.0 },
    }
}

/// Sum amounts and counts per period key. Undated sales are skipped.
fn accumulate(sales: &[NormalizedSale], granularity: Granularity) -> HashMap<String, (f64, u64)> {
    let mut totals: HashMap<String, (f64, u64)> = HashMap::new();
    let mut skipped = 0usize;

    for sale in sales {
        let Some(at) = sale.occurred_at else {
            skipped += 1;
            continue;
        };
        let entry = totals.entry(granularity.key(at.date())).or_insert((0.0, 0));
        entry.0 += sale.amount;
        entry.1 += 1;
    }

    if skipped > 0 {
        tracing::debug!("{:?} series skipped {} undated sale(s)", granularity, skipped);
    }

    totals
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn daily_buckets(sales: &[NormalizedSale], span: Span, fee_rate: f64) -> Vec<Bucket> {
    let totals = accumulate(sales, Granularity::Day);

    span.start
        .iter_days()
        .take_while(|day| *day <= span.end)
        .map(|day| {
            let key = Granularity::Day.key(day);
            let total = totals.get(&key);
            make_bucket(key, day.format("%d/%m").to_string(), total, fee_rate)
        })
        .collect()
}

pub fn monthly_buckets(sales: &[NormalizedSale], span: Span, fee_rate: f64) -> Vec<Bucket> {
    let totals = accumulate(sales, Granularity::Month);
    let with_year = span.crosses_year();
    let last = first_of_month(span.end);

    let mut buckets = Vec::new();
    let mut cursor = first_of_month(span.start);
    while cursor <= last {
        let key = Granularity::Month.key(cursor);
        let total = totals.get(&key);
        buckets.push(make_bucket(key, month_label(cursor, with_year), total, fee_rate));

        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    buckets
}

pub fn yearly_buckets(sales: &[NormalizedSale], span: Span, fee_rate: f64) -> Vec<Bucket> {
    let totals = accumulate(sales, Granularity::Year);

    (span.start.year()..=span.end.year())
        .map(|year| {
            let key = format!("{:04}", year);
            let total = totals.get(&key);
            make_bucket(key, year.to_string(), total, fee_rate)
        })
        .collect()
}

pub fn build_daily_series(
    sales: &[NormalizedSale],
    range: Option<&DateRange>,
    today: NaiveDate,
    settings: &AnalyticsSettings,
) -> Vec<Bucket> {
    let span = Span::resolve(sales, range, today, settings);
    daily_buckets(sales, span, settings.fee_rate)
}

pub fn build_monthly_series(
    sales: &[NormalizedSale],
    range: Option<&DateRange>,
    today: NaiveDate,
    settings: &AnalyticsSettings,
) -> Vec<Bucket> {
    let span = Span::resolve(sales, range, today, settings);
    monthly_buckets(sales, span, settings.fee_rate)
}

pub fn build_yearly_series(
    sales: &[NormalizedSale],
    range: Option<&DateRange>,
    today: NaiveDate,
    settings: &AnalyticsSettings,
) -> Vec<Bucket> {
    let span = Span::resolve(sales, range, today, settings);
    yearly_buckets(sales, span, settings.fee_rate)
}

/// All three series over one shared span.
pub fn build_series(
    sales: &[NormalizedSale],
    range: Option<&DateRange>,
    today: NaiveDate,
    settings: &AnalyticsSettings,
) -> SalesSeries {
    let span = Span::resolve(sales, range, today, settings);
    tracing::debug!("Building series over {} .. {}", span.start, span.end);

    SalesSeries {
        daily: daily_buckets(sales, span, settings.fee_rate),
        monthly: monthly_buckets(sales, span, settings.fee_rate),
        yearly: yearly_buckets(sales, span, settings.fee_rate),
    }
}
