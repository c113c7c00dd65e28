use crate::models::{AccountHealth, HealthLevel, PaymentMethodStat};
use crate::normalization::{NormalizedSale, PaymentMethod, SaleStatus};

/// Round to two decimal places for percentage outputs.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round2(part / whole * 100.0)
    } else {
        0.0
    }
}

pub fn gross_revenue(sales: &[NormalizedSale]) -> f64 {
    sales.iter().map(|sale| sale.amount).sum()
}

pub fn average_ticket(revenue: f64, count: u64) -> f64 {
    if count > 0 {
        revenue / count as f64
    } else {
        0.0
    }
}

/// Period-over-period growth in percent.
///
/// With no previous revenue, any current revenue counts as 100% growth.
pub fn growth_percentage(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    round2((current - previous) / previous.abs() * 100.0)
}

/// Revenue per payment method, always listing the whole closed set.
///
/// Shares are relative to the revenue of sales with a mapped method;
/// unmapped sales still count toward the overall totals elsewhere.
pub fn payment_method_breakdown(sales: &[NormalizedSale]) -> Vec<PaymentMethodStat> {
    let totals: Vec<(PaymentMethod, u64, f64)> = PaymentMethod::ALL
        .iter()
        .map(|method| {
            sales
                .iter()
                .filter(|sale| sale.method == Some(*method))
                .fold((*method, 0u64, 0.0f64), |(m, count, revenue), sale| {
                    (m, count + 1, revenue + sale.amount)
                })
        })
        .collect();

    let mapped_revenue: f64 = totals.iter().map(|(_, _, revenue)| revenue).sum();

    totals
        .into_iter()
        .map(|(method, count, revenue)| PaymentMethodStat {
            method: method.as_str().to_string(),
            count,
            revenue,
            share_percentage: percentage(revenue, mapped_revenue),
        })
        .collect()
}

/// Band of a 0-100 health score.
pub fn health_level(score: f64) -> HealthLevel {
    if score >= 90.0 {
        HealthLevel::Excellent
    } else if score >= 70.0 {
        HealthLevel::Good
    } else if score >= 50.0 {
        HealthLevel::Attention
    } else {
        HealthLevel::Critical
    }
}

/// Account health over every sale in scope, whatever its status.
///
/// Rates are taken over sales with a recognized status. A caller-supplied
/// percentage replaces the derived score but not the rates.
pub fn account_health(sales: &[NormalizedSale], reported_score: Option<f64>) -> AccountHealth {
    let count_of = |status: SaleStatus| sales.iter().filter(|s| s.status == status).count() as f64;

    let classified = sales
        .iter()
        .filter(|s| s.status != SaleStatus::Unknown)
        .count() as f64;
    let approval_rate = percentage(count_of(SaleStatus::Approved), classified);
    let refund_rate = percentage(count_of(SaleStatus::Refunded), classified);
    let chargeback_rate = percentage(count_of(SaleStatus::Chargeback), classified);

    let score = match reported_score {
        Some(score) => score.clamp(0.0, 100.0),
        None if classified == 0.0 => 100.0,
        None => round2((approval_rate - 2.0 * chargeback_rate - refund_rate).clamp(0.0, 100.0)),
    };

    AccountHealth {
        score,
        level: health_level(score),
        approval_rate,
        refund_rate,
        chargeback_rate,
    }
}
