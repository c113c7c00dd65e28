use crate::errors::ResultExt;
use crate::journey::TierTable;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};

const DEFAULT_FEE_RATE: f64 = 0.10;
const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;
const DEFAULT_FALLBACK_DAYS: u32 = 7;
const DEFAULT_MAX_RANGE_DAYS: u32 = 3660;
const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_PORT: u16 = 3000;

/// Engine-facing settings, passed explicitly into every computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticsSettings {
    /// Platform fee deducted from revenue; net revenue is `revenue * (1 - fee_rate)`.
    pub fee_rate: f64,
    /// Business timezone used for day boundaries.
    pub timezone: FixedOffset,
    /// Days in the daily series when there is neither a range nor any data.
    pub fallback_days: u32,
    /// Longest span, in days, a range or a series may cover.
    pub max_range_days: u32,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
            timezone: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
            fallback_days: DEFAULT_FALLBACK_DAYS,
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
        }
    }
}

impl AnalyticsSettings {
    /// Current calendar date in the business timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_body_bytes: usize,
    pub analytics: AnalyticsSettings,
    pub tiers: TierTable,
}

/// Unset and blank variables both mean "use the default".
fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_port(raw: Option<String>) -> anyhow::Result<u16> {
    match non_blank(raw) {
        None => Ok(DEFAULT_PORT),
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535")),
    }
}

fn parse_fee_rate(raw: Option<String>) -> anyhow::Result<f64> {
    let Some(value) = non_blank(raw) else {
        return Ok(DEFAULT_FEE_RATE);
    };
    let rate: f64 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("FEE_RATE must be a number"))?;
    if !(0.0..1.0).contains(&rate) {
        anyhow::bail!("FEE_RATE must be in [0, 1), got {}", rate);
    }
    Ok(rate)
}

fn parse_utc_offset(raw: Option<String>) -> anyhow::Result<FixedOffset> {
    let minutes: i32 = match non_blank(raw) {
        None => DEFAULT_UTC_OFFSET_MINUTES,
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("BUSINESS_UTC_OFFSET_MINUTES must be an integer"))?,
    };
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow::anyhow!("BUSINESS_UTC_OFFSET_MINUTES out of range: {}", minutes))
}

fn parse_fallback_days(raw: Option<String>) -> anyhow::Result<u32> {
    let Some(value) = non_blank(raw) else {
        return Ok(DEFAULT_FALLBACK_DAYS);
    };
    let days: u32 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("EMPTY_SERIES_FALLBACK_DAYS must be a positive integer"))?;
    if !(1..=366).contains(&days) {
        anyhow::bail!("EMPTY_SERIES_FALLBACK_DAYS must be between 1 and 366");
    }
    Ok(days)
}

fn parse_max_range_days(raw: Option<String>) -> anyhow::Result<u32> {
    let Some(value) = non_blank(raw) else {
        return Ok(DEFAULT_MAX_RANGE_DAYS);
    };
    let days: u32 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("MAX_RANGE_DAYS must be a positive integer"))?;
    if !(1..=36_600).contains(&days) {
        anyhow::bail!("MAX_RANGE_DAYS must be between 1 and 36600");
    }
    Ok(days)
}

fn parse_max_body_bytes(raw: Option<String>) -> anyhow::Result<usize> {
    let Some(value) = non_blank(raw) else {
        return Ok(DEFAULT_MAX_BODY_BYTES);
    };
    let bytes: usize = value
        .parse()
        .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a positive integer"))?;
    if bytes == 0 {
        anyhow::bail!("MAX_BODY_BYTES cannot be zero");
    }
    Ok(bytes)
}

fn parse_tiers(raw: Option<String>) -> anyhow::Result<TierTable> {
    match non_blank(raw) {
        None => Ok(TierTable::default()),
        Some(spec) => Ok(TierTable::parse(&spec).context("JOURNEY_TIERS")?),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let var = |name: &str| std::env::var(name).ok();

        let config = Self {
            port: parse_port(var("PORT"))?,
            max_body_bytes: parse_max_body_bytes(var("MAX_BODY_BYTES"))?,
            analytics: AnalyticsSettings {
                fee_rate: parse_fee_rate(var("FEE_RATE"))?,
                timezone: parse_utc_offset(var("BUSINESS_UTC_OFFSET_MINUTES"))?,
                fallback_days: parse_fallback_days(var("EMPTY_SERIES_FALLBACK_DAYS"))?,
                max_range_days: parse_max_range_days(var("MAX_RANGE_DAYS"))?,
            },
            tiers: parse_tiers(var("JOURNEY_TIERS"))?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Fee rate: {}", config.analytics.fee_rate);
        tracing::debug!("Business timezone: {}", config.analytics.timezone);
        tracing::debug!("Fallback days: {}", config.analytics.fallback_days);
        tracing::debug!("Max range days: {}", config.analytics.max_range_days);
        tracing::debug!("Journey tiers: {}", config.tiers.tiers().len());
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
