use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============ Input Models ============

/// A scalar as upstream sends it: number, string, bool or null.
///
/// Amounts and ids arrive with whatever JSON type the backend version
/// happened to use, so they are kept loose until the normalization layer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LooseValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Other(Value),
}

impl Default for LooseValue {
    fn default() -> Self {
        LooseValue::Other(Value::Null)
    }
}

impl LooseValue {
    /// String view used for opaque identifiers.
    pub fn as_id(&self) -> String {
        match self {
            LooseValue::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
            LooseValue::Number(n) => n.to_string(),
            LooseValue::Text(s) => s.clone(),
            LooseValue::Flag(b) => b.to_string(),
            LooseValue::Other(Value::Null) => String::new(),
            LooseValue::Other(v) => v.to_string(),
        }
    }
}

/// Deserialize a free-text field that upstream may send with any JSON type.
///
/// Strings pass through; numbers, bools, arrays and objects keep their JSON
/// text so they classify as unknown or unparsable downstream instead of
/// failing the whole batch. `null` is `None`.
pub fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Text(text) => Some(text),
        LooseValue::Other(Value::Null) => None,
        LooseValue::Other(value) => Some(value.to_string()),
        other => Some(other.as_id()),
    })
}

fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    loose_text(deserializer).map(Option::unwrap_or_default)
}

impl From<f64> for LooseValue {
    fn from(value: f64) -> Self {
        LooseValue::Number(value)
    }
}

impl From<&str> for LooseValue {
    fn from(value: &str) -> Self {
        LooseValue::Text(value.to_string())
    }
}

/// One transactional record as received from the sales source.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSale {
    /// Opaque identifier.
    #[serde(default)]
    pub id: LooseValue,
    /// Sale amount, possibly string-typed.
    #[serde(default)]
    pub amount: LooseValue,
    /// Free-text status (e.g. "approved", "pago", "PENDING").
    #[serde(default, deserialize_with = "loose_text")]
    pub status: Option<String>,
    /// Free-text payment method.
    #[serde(
        default,
        deserialize_with = "loose_text",
        alias = "paymentMethod",
        alias = "method"
    )]
    pub payment_method: Option<String>,
    /// Business date of the sale, preferred over `created_at`.
    #[serde(default, deserialize_with = "loose_text", alias = "saleDate")]
    pub sale_date: Option<String>,
    /// Record creation timestamp.
    #[serde(default, deserialize_with = "loose_text", alias = "createdAt")]
    pub created_at: Option<String>,
}

impl RawSale {
    /// Convenience constructor used by tests and the replay tool.
    pub fn new(
        id: &str,
        amount: impl Into<LooseValue>,
        status: &str,
        sale_date: Option<&str>,
    ) -> Self {
        Self {
            id: LooseValue::Text(id.to_string()),
            amount: amount.into(),
            status: Some(status.to_string()),
            payment_method: None,
            sale_date: sale_date.map(str::to_string),
            created_at: None,
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.payment_method = Some(method.to_string());
        self
    }

    pub fn with_created_at(mut self, created_at: &str) -> Self {
        self.created_at = Some(created_at.to_string());
        self
    }
}

/// Date range as the range picker sends it (unparsed strings).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RangeRequest {
    #[serde(default, deserialize_with = "loose_string")]
    pub start: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub end: String,
}

/// Account balances as reported upstream.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Balances {
    #[serde(default)]
    pub available: LooseValue,
    #[serde(default)]
    pub pending: LooseValue,
}

/// Request body for the dashboard endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequest {
    #[serde(default)]
    pub sales: Vec<RawSale>,
    #[serde(default)]
    pub range: Option<RangeRequest>,
    /// Cumulative lifetime revenue; summed from approved sales when absent.
    #[serde(default, alias = "lifetime_revenue")]
    pub lifetime_revenue: Option<LooseValue>,
    #[serde(default)]
    pub balances: Option<Balances>,
    /// Health percentage computed upstream; overrides the derived score.
    #[serde(default, alias = "health_percentage")]
    pub health_percentage: Option<LooseValue>,
}

/// Request body for the journey endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyRequest {
    #[serde(default, alias = "lifetime_revenue")]
    pub lifetime_revenue: LooseValue,
}

// ============ Output Models ============

/// One calendar period of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Canonical period key: `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
    pub key: String,
    /// Display label: `dd/mm`, `jan` / `jan/24`, or `2024`.
    pub period_label: String,
    pub revenue: f64,
    pub net_revenue: f64,
    pub count: u64,
    pub average_ticket: f64,
}

/// The three calendar-complete series backing the revenue chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSeries {
    pub daily: Vec<Bucket>,
    pub monthly: Vec<Bucket>,
    pub yearly: Vec<Bucket>,
}

/// Revenue attributed to one payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodStat {
    pub method: String,
    pub count: u64,
    pub revenue: f64,
    pub share_percentage: f64,
}

/// Health band shown next to the account-health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Excellent,
    Good,
    Attention,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHealth {
    pub score: f64,
    pub level: HealthLevel,
    pub approval_rate: f64,
    pub refund_rate: f64,
    pub chargeback_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStatus {
    pub id: String,
    pub name: String,
    pub threshold: f64,
    pub unlocked: bool,
}

/// Gamified journey progress for the lifetime revenue total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyProgress {
    pub current_tier_id: String,
    pub current_tier_name: String,
    pub next_tier_id: Option<String>,
    pub next_tier_name: Option<String>,
    pub progress_percentage: f64,
    pub remaining_to_next: f64,
    pub tiers: Vec<TierStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub available: f64,
    pub pending: f64,
}

/// Normalized range echoed back to the caller, as ISO strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub start: String,
    pub end: String,
}

/// Everything the dashboard renders for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub range: Option<RangeSummary>,
    pub series: SalesSeries,
    pub gross_revenue: f64,
    pub net_revenue: f64,
    pub sales_count: u64,
    pub average_ticket: f64,
    pub growth_percentage: f64,
    pub payment_methods: Vec<PaymentMethodStat>,
    pub health: AccountHealth,
    pub balances: BalanceSummary,
    pub journey: JourneyProgress,
}
