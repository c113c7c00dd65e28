/// Tolerant parsing of upstream sale records
///
/// Upstream data arrives with string-typed amounts, status spellings that
/// vary by locale and backend version, and optional date fields. All of that
/// is absorbed here so the aggregation stages only ever see `NormalizedSale`:
/// 1. `parse_amount` for money values
/// 2. `SaleStatus::classify` for status text
/// 3. `PaymentMethod::from_raw` for payment method text
/// 4. `resolve_date_field` + `parse_sale_date` for the sale timestamp
use crate::models::{LooseValue, RawSale};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// pt-BR money format: thousands with dots, decimals with a comma.
static PT_BR_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(\d{1,3}(\.\d{3})+|\d+)(,\d+)?$").expect("pt-BR amount regex is valid")
});

/// Parse a money value defensively.
///
/// Finite numbers pass through. Strings are trimmed, stripped of an `R$`
/// prefix, and parsed either as plain decimals (`"150.5"`) or as pt-BR
/// amounts (`"1.234,56"`). Everything else is `0.0`.
pub fn parse_amount(value: &LooseValue) -> f64 {
    match value {
        LooseValue::Number(n) if n.is_finite() => *n,
        LooseValue::Text(text) => parse_amount_str(text),
        _ => 0.0,
    }
}

fn parse_amount_str(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }
    parse_decimal(text).unwrap_or_else(|| {
        tracing::debug!("Non-numeric amount treated as zero: {:?}", text);
        0.0
    })
}

/// Plain or pt-BR decimal, with an optional `R$` prefix. `None` unless the
/// whole string is a finite number.
fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let cleaned = trimmed
        .strip_prefix("R$")
        .map(str::trim)
        .unwrap_or(trimmed);

    let parsed = match cleaned.parse::<f64>() {
        Ok(n) => Some(n),
        Err(_) if PT_BR_AMOUNT.is_match(cleaned) => {
            cleaned.replace('.', "").replace(',', ".").parse::<f64>().ok()
        }
        Err(_) => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Parse a percentage such as `88`, `"88.5"`, `"88,5%"`.
///
/// Unlike amounts, an unparsable value is `None` so callers can fall back to
/// a derived figure instead of reading it as zero.
pub fn parse_percentage(value: &LooseValue) -> Option<f64> {
    match value {
        LooseValue::Number(n) if n.is_finite() => Some(*n),
        LooseValue::Text(text) => {
            let trimmed = text.trim();
            let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
            let parsed = parse_decimal(number);
            if parsed.is_none() && !trimmed.is_empty() {
                tracing::debug!("Unparsable percentage ignored: {:?}", text);
            }
            parsed
        }
        _ => None,
    }
}

/// Lowercases, trims and folds separators so `"Credit Card"`,
/// `"credit-card"` and `"CREDIT_CARD"` compare equal.
fn fold(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

// ============ Status ============

const APPROVED_STATUSES: &[&str] = &[
    "approved", "aprovado", "aprovada", "paid", "pago", "paga", "completed", "complete",
    "concluido", "concluído", "concluida", "concluída", "success", "successful", "succeeded",
    "sucesso", "confirmed", "confirmado", "confirmada", "settled", "liquidado", "captured",
];

const PENDING_STATUSES: &[&str] = &[
    "pending", "pendente", "processing", "processando", "waiting_payment",
    "aguardando_pagamento", "aguardando", "in_analysis", "em_analise", "em_análise",
];

const REFUSED_STATUSES: &[&str] = &[
    "refused", "recusado", "recusada", "declined", "failed", "falhou", "canceled", "cancelled",
    "cancelado", "cancelada", "expired", "expirado", "rejected", "rejeitado",
];

const REFUNDED_STATUSES: &[&str] = &[
    "refunded", "partially_refunded", "reembolsado", "reembolsada", "estornado", "estornada",
];

const CHARGEBACK_STATUSES: &[&str] = &[
    "chargeback", "chargedback", "charged_back", "contestado", "contestada", "disputed",
    "em_disputa",
];

/// Status class of a sale after synonym resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Approved,
    Pending,
    Refused,
    Refunded,
    Chargeback,
    Unknown,
}

impl SaleStatus {
    /// Case-insensitive classification against the synonym sets.
    pub fn classify(raw: &str) -> Self {
        let folded = fold(raw);
        let status = folded.as_str();

        if APPROVED_STATUSES.contains(&status) {
            SaleStatus::Approved
        } else if PENDING_STATUSES.contains(&status) {
            SaleStatus::Pending
        } else if REFUSED_STATUSES.contains(&status) {
            SaleStatus::Refused
        } else if REFUNDED_STATUSES.contains(&status) {
            SaleStatus::Refunded
        } else if CHARGEBACK_STATUSES.contains(&status) {
            SaleStatus::Chargeback
        } else {
            SaleStatus::Unknown
        }
    }
}

// ============ Payment method ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Pix,
    Boleto,
}

impl PaymentMethod {
    /// Every method of the closed set, in display order.
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::CreditCard,
        PaymentMethod::Pix,
        PaymentMethod::Boleto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Boleto => "boleto",
        }
    }

    /// Map free text onto the closed set. Unmapped values yield `None`.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match fold(raw).as_str() {
            "credit_card" | "creditcard" | "credit" | "card" | "cc" | "cartao" | "cartão"
            | "cartao_credito" | "cartao_de_credito" | "cartão_de_crédito" | "credito"
            | "crédito" => Some(PaymentMethod::CreditCard),
            "pix" => Some(PaymentMethod::Pix),
            "boleto" | "boleto_bancario" | "boleto_bancário" | "bank_slip" | "bankslip"
            | "billet" => Some(PaymentMethod::Boleto),
            _ => None,
        }
    }
}

// ============ Dates ============

type DateAccessor = fn(&RawSale) -> Option<&str>;

fn sale_date_field(sale: &RawSale) -> Option<&str> {
    sale.sale_date.as_deref()
}

fn created_at_field(sale: &RawSale) -> Option<&str> {
    sale.created_at.as_deref()
}

/// Date fields in priority order: the business sale date, then the record
/// creation time. The first non-blank one is the sale's date.
const DATE_FIELDS: [DateAccessor; 2] = [sale_date_field, created_at_field];

/// First non-blank date field of the sale, per `DATE_FIELDS` order.
pub fn resolve_date_field(sale: &RawSale) -> Option<&str> {
    DATE_FIELDS
        .iter()
        .find_map(|field| field(sale).map(str::trim).filter(|s| !s.is_empty()))
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Years a sale date may carry. Anything outside is a typo or a sentinel.
const SALE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Parse a date-like string into business-local wall time.
///
/// Offset-bearing timestamps are converted into `timezone`; naive values
/// are taken as already local. Returns `None` for anything unparsable or
/// outside years 1..=9999.
pub fn parse_sale_date(raw: &str, timezone: FixedOffset) -> Option<NaiveDateTime> {
    parse_date_like(raw, timezone).filter(|at| SALE_YEARS.contains(&at.year()))
}

fn parse_date_like(raw: &str, timezone: FixedOffset) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&timezone).naive_local());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

// ============ Normalized record ============

/// A sale after the tolerance layer: every field has a definite type.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSale {
    pub id: String,
    pub amount: f64,
    pub status: SaleStatus,
    pub method: Option<PaymentMethod>,
    /// `None` when no date field was present or parsable.
    pub occurred_at: Option<NaiveDateTime>,
}

impl NormalizedSale {
    pub fn from_raw(raw: &RawSale, timezone: FixedOffset) -> Self {
        let id = raw.id.as_id();

        let occurred_at = resolve_date_field(raw).and_then(|value| {
            let parsed = parse_sale_date(value, timezone);
            if parsed.is_none() {
                tracing::debug!("Sale {}: unparsable date {:?}", id, value);
            }
            parsed
        });

        let method = raw.payment_method.as_deref().and_then(|value| {
            let mapped = PaymentMethod::from_raw(value);
            if mapped.is_none() {
                tracing::debug!("Sale {}: unmapped payment method {:?}", id, value);
            }
            mapped
        });

        Self {
            amount: parse_amount(&raw.amount),
            status: raw
                .status
                .as_deref()
                .map(SaleStatus::classify)
                .unwrap_or(SaleStatus::Unknown),
            method,
            occurred_at,
            id,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == SaleStatus::Approved
    }
}

/// Normalize a whole batch, preserving order.
pub fn normalize_sales(sales: &[RawSale], timezone: FixedOffset) -> Vec<NormalizedSale> {
    sales
        .iter()
        .map(|sale| NormalizedSale::from_raw(sale, timezone))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_amount_numbers_and_strings() {
        assert_eq!(parse_amount(&LooseValue::Number(99.9)), 99.9);
        assert_eq!(parse_amount(&"150.50".into()), 150.5);
        assert_eq!(parse_amount(&"  42 ".into()), 42.0);
        assert_eq!(parse_amount(&"1.234,56".into()), 1234.56);
        assert_eq!(parse_amount(&"R$ 99,90".into()), 99.9);
        assert_eq!(parse_amount(&"-10,5".into()), -10.5);
    }

    #[test]
    fn test_parse_amount_garbage_is_zero() {
        assert_eq!(parse_amount(&"abc".into()), 0.0);
        assert_eq!(parse_amount(&"".into()), 0.0);
        assert_eq!(parse_amount(&"NaN".into()), 0.0);
        assert_eq!(parse_amount(&"inf".into()), 0.0);
        assert_eq!(parse_amount(&"1,2,3".into()), 0.0);
        assert_eq!(parse_amount(&LooseValue::Flag(true)), 0.0);
        assert_eq!(parse_amount(&LooseValue::default()), 0.0);
        assert_eq!(parse_amount(&LooseValue::Number(f64::NAN)), 0.0);
    }

    #[test]
    fn test_status_synonyms() {
        for status in ["approved", "PAID", " Pago ", "completed", "Success", "aprovada", "concluído"] {
            assert_eq!(SaleStatus::classify(status), SaleStatus::Approved, "{}", status);
        }
        assert_eq!(SaleStatus::classify("pending"), SaleStatus::Pending);
        assert_eq!(SaleStatus::classify("Waiting Payment"), SaleStatus::Pending);
        assert_eq!(SaleStatus::classify("cancelado"), SaleStatus::Refused);
        assert_eq!(SaleStatus::classify("estornado"), SaleStatus::Refunded);
        assert_eq!(SaleStatus::classify("chargeback"), SaleStatus::Chargeback);
        assert_eq!(SaleStatus::classify("approved-ish"), SaleStatus::Unknown);
        assert_eq!(SaleStatus::classify(""), SaleStatus::Unknown);
    }

    #[test]
    fn test_payment_method_mapping() {
        assert_eq!(PaymentMethod::from_raw("credit_card"), Some(PaymentMethod::CreditCard));
        assert_eq!(PaymentMethod::from_raw("Credit Card"), Some(PaymentMethod::CreditCard));
        assert_eq!(PaymentMethod::from_raw("cartão de crédito"), Some(PaymentMethod::CreditCard));
        assert_eq!(PaymentMethod::from_raw("PIX"), Some(PaymentMethod::Pix));
        assert_eq!(PaymentMethod::from_raw("bank-slip"), Some(PaymentMethod::Boleto));
        assert_eq!(PaymentMethod::from_raw("paypal"), None);
        assert_eq!(PaymentMethod::CreditCard.as_str(), "credit_card");
    }

    #[test]
    fn test_parse_sale_date_formats() {
        let tz = brt();
        assert_eq!(parse_sale_date("2024-01-01", tz), Some(at(2024, 1, 1, 0, 0)));
        assert_eq!(parse_sale_date("15/02/2024", tz), Some(at(2024, 2, 15, 0, 0)));
        assert_eq!(
            parse_sale_date("2024-01-01 10:30:00", tz),
            Some(at(2024, 1, 1, 10, 30))
        );
        assert_eq!(
            parse_sale_date("2024-01-01T10:30:00.123", tz).map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(parse_sale_date("15/02/2024 08:05", tz), Some(at(2024, 2, 15, 8, 5)));
    }

    #[test]
    fn test_parse_sale_date_converts_offsets() {
        // 01:00 UTC is still the previous evening in UTC-03:00
        assert_eq!(
            parse_sale_date("2024-01-02T01:00:00Z", brt()),
            Some(at(2024, 1, 1, 22, 0))
        );
        assert_eq!(
            parse_sale_date("2024-01-02T01:00:00-03:00", brt()),
            Some(at(2024, 1, 2, 1, 0))
        );
    }

    #[test]
    fn test_parse_sale_date_rejects_garbage() {
        let tz = brt();
        assert_eq!(parse_sale_date("", tz), None);
        assert_eq!(parse_sale_date("yesterday", tz), None);
        assert_eq!(parse_sale_date("2024-13-45", tz), None);
        assert_eq!(parse_sale_date("31/02/2024", tz), None);
    }

    #[test]
    fn test_parse_sale_date_rejects_extreme_years() {
        let tz = brt();
        assert_eq!(parse_sale_date("-262143-01-01", tz), None);
        assert_eq!(parse_sale_date("+200000-01-01", tz), None);
        assert_eq!(parse_sale_date("0000-12-31", tz), None);
        assert_eq!(parse_sale_date("0001-01-01", tz), Some(at(1, 1, 1, 0, 0)));
        assert_eq!(parse_sale_date("9999-12-31", tz), Some(at(9999, 12, 31, 0, 0)));
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage(&LooseValue::Number(88.0)), Some(88.0));
        assert_eq!(parse_percentage(&LooseValue::from("88%")), Some(88.0));
        assert_eq!(parse_percentage(&LooseValue::from(" 88,5 % ")), Some(88.5));
        assert_eq!(parse_percentage(&LooseValue::from("high")), None);
        assert_eq!(parse_percentage(&LooseValue::from("")), None);
        assert_eq!(parse_percentage(&LooseValue::Number(f64::NAN)), None);
        assert_eq!(parse_percentage(&LooseValue::default()), None);
    }

    #[test]
    fn test_sale_date_preferred_over_created_at() {
        let sale = RawSale::new("1", 10.0, "paid", Some("2024-05-05"))
            .with_created_at("2024-05-01T00:00:00Z");
        assert_eq!(resolve_date_field(&sale), Some("2024-05-05"));

        let blank = RawSale::new("2", 10.0, "paid", Some("  "))
            .with_created_at("2024-05-01");
        assert_eq!(resolve_date_field(&blank), Some("2024-05-01"));

        let none = RawSale::new("3", 10.0, "paid", None);
        assert_eq!(resolve_date_field(&none), None);
    }

    #[test]
    fn test_normalized_sale_tolerates_bad_fields() {
        let raw = RawSale::new("7", "not money", "APPROVED", Some("garbage"))
            .with_method("cheque");
        let sale = NormalizedSale::from_raw(&raw, brt());

        assert_eq!(sale.id, "7");
        assert_eq!(sale.amount, 0.0);
        assert!(sale.is_approved());
        assert_eq!(sale.method, None);
        assert_eq!(sale.occurred_at, None);
    }
}
