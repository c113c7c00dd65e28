/// Dashboard aggregation pipeline
///
/// Raw records flow one way through the stages:
/// 1. Normalize the range (swap + clamp)
/// 2. Normalize every record at the input boundary
/// 3. Filter to approved sales inside the range
/// 4. Build the daily/monthly/yearly series
/// 5. Derive scalar metrics and journey progress
///
/// Nothing here is cached between calls; every invocation works only on its
/// own arguments.
use crate::config::AnalyticsSettings;
use crate::filter::{filter_sales, in_range};
use crate::journey::{score_progress, TierTable};
use crate::metrics::{
    account_health, average_ticket, gross_revenue, growth_percentage, payment_method_breakdown,
};
use crate::models::{BalanceSummary, Dashboard, DashboardRequest, RawSale, SalesSeries};
use crate::normalization::{normalize_sales, parse_amount, parse_percentage, NormalizedSale};
use crate::range::{normalize_range, parse_range_request, DateRange};
use crate::series::build_series;
use chrono::NaiveDate;

/// Typed pipeline input. The range may still be un-normalized.
#[derive(Debug, Clone, Default)]
pub struct DashboardInput<'a> {
    pub sales: &'a [RawSale],
    pub range: Option<DateRange>,
    pub lifetime_revenue: Option<f64>,
    pub health_percentage: Option<f64>,
    pub balances: BalanceSummary,
}

impl<'a> DashboardInput<'a> {
    pub fn new(sales: &'a [RawSale], range: Option<DateRange>) -> Self {
        Self {
            sales,
            range,
            ..Default::default()
        }
    }

    /// Resolve the loose request fields. Malformed ranges become "no range"
    /// and an unparsable health percentage is left to be derived.
    pub fn from_request(request: &'a DashboardRequest, settings: &AnalyticsSettings) -> Self {
        Self {
            sales: &request.sales,
            range: request
                .range
                .as_ref()
                .and_then(|range| parse_range_request(range, settings)),
            lifetime_revenue: request.lifetime_revenue.as_ref().map(parse_amount),
            health_percentage: request.health_percentage.as_ref().and_then(parse_percentage),
            balances: request
                .balances
                .as_ref()
                .map(|b| BalanceSummary {
                    available: parse_amount(&b.available),
                    pending: parse_amount(&b.pending),
                })
                .unwrap_or_default(),
        }
    }
}

/// Growth of the range against the window just before it, or of the last
/// month against the one before when there is no range. A range with no
/// representable previous window has no growth.
fn period_growth(
    all: &[NormalizedSale],
    range: Option<&DateRange>,
    current_revenue: f64,
    series: &SalesSeries,
) -> f64 {
    match range {
        Some(range) => match range.previous_window() {
            Some(window) => {
                let previous = filter_sales(all, Some(&window));
                growth_percentage(current_revenue, gross_revenue(&previous))
            }
            None => 0.0,
        },
        None => match series.monthly.as_slice() {
            [.., previous, current] => growth_percentage(current.revenue, previous.revenue),
            [current] => growth_percentage(current.revenue, 0.0),
            [] => 0.0,
        },
    }
}

pub fn build_dashboard(
    input: &DashboardInput<'_>,
    settings: &AnalyticsSettings,
    tiers: &TierTable,
    today: NaiveDate,
) -> Dashboard {
    let range = normalize_range(input.range);
    let all = normalize_sales(input.sales, settings.timezone);
    let approved = filter_sales(&all, range.as_ref());

    let series = build_series(&approved, range.as_ref(), today, settings);

    let gross = gross_revenue(&approved);
    let sales_count = approved.len() as u64;
    let growth = period_growth(&all, range.as_ref(), gross, &series);

    let in_scope: Vec<NormalizedSale> = all
        .iter()
        .filter(|sale| in_range(sale, range.as_ref()))
        .cloned()
        .collect();
    let health = account_health(&in_scope, input.health_percentage);

    let lifetime = input
        .lifetime_revenue
        .unwrap_or_else(|| gross_revenue(&filter_sales(&all, None)));
    let journey = score_progress(lifetime, tiers);

    tracing::info!(
        "Dashboard built: {} approved of {} sale(s), gross {:.2}, {} daily bucket(s), tier {}",
        sales_count,
        all.len(),
        gross,
        series.daily.len(),
        journey.current_tier_id
    );

    Dashboard {
        range: range.map(|r| r.to_summary()),
        gross_revenue: gross,
        net_revenue: gross * (1.0 - settings.fee_rate),
        sales_count,
        average_ticket: average_ticket(gross, sales_count),
        growth_percentage: growth,
        payment_methods: payment_method_breakdown(&approved),
        health,
        balances: input.balances.clone(),
        journey,
        series,
    }
}
