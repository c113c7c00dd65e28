use crate::errors::AppError;
use crate::metrics::round2;
use crate::models::{JourneyProgress, TierStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const STARTER_TIER_ID: &str = "iniciante";
pub const STARTER_TIER_NAME: &str = "Iniciante";

/// One level of the revenue journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub id: String,
    pub name: String,
    pub threshold: f64,
}

impl Tier {
    pub fn new(id: &str, name: &str, threshold: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            threshold,
        }
    }
}

/// Tier table with strictly ascending, positive thresholds.
///
/// Construction is the only place the ordering is checked; everything
/// downstream relies on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(tiers: Vec<Tier>) -> Result<Self, AppError> {
        if tiers.is_empty() {
            return Err(AppError::InvalidTierTable(
                "at least one tier is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut previous: Option<&Tier> = None;
        for tier in &tiers {
            if tier.id.trim().is_empty() {
                return Err(AppError::InvalidTierTable("tier id cannot be empty".to_string()));
            }
            if !seen.insert(tier.id.as_str()) {
                return Err(AppError::InvalidTierTable(format!(
                    "duplicate tier id '{}'",
                    tier.id
                )));
            }
            if !tier.threshold.is_finite() || tier.threshold <= 0.0 {
                return Err(AppError::InvalidTierTable(format!(
                    "tier '{}' must have a positive threshold, got {}",
                    tier.id, tier.threshold
                )));
            }
            if let Some(prev) = previous {
                if tier.threshold <= prev.threshold {
                    return Err(AppError::InvalidTierTable(format!(
                        "thresholds must strictly increase: '{}' ({}) after '{}' ({})",
                        tier.id, tier.threshold, prev.id, prev.threshold
                    )));
                }
            }
            previous = Some(tier);
        }

        Ok(Self { tiers })
    }

    /// Parse `id:Name:threshold` entries separated by commas.
    pub fn parse(spec: &str) -> Result<Self, AppError> {
        let tiers = spec
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
                match parts.as_slice() {
                    [id, name, threshold] => threshold
                        .parse::<f64>()
                        .map(|value| Tier::new(id, name, value))
                        .map_err(|_| {
                            AppError::InvalidTierTable(format!(
                                "threshold '{}' of tier '{}' is not a number",
                                threshold, id
                            ))
                        }),
                    _ => Err(AppError::InvalidTierTable(format!(
                        "expected id:Name:threshold, got '{}'",
                        entry
                    ))),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(tiers)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier::new("avancado", "Avançado", 10_000.0),
                Tier::new("expert", "Expert", 100_000.0),
                Tier::new("prata", "Prata", 500_000.0),
                Tier::new("ouro", "Ouro", 1_000_000.0),
                Tier::new("diamante", "Diamante", 5_000_000.0),
            ],
        }
    }
}

/// Score a lifetime revenue total against the tier table.
///
/// The current tier is the highest one whose threshold the total reached
/// (the starter tier below the first); the next tier is the first one
/// above the total. Negative or NaN totals score as zero.
pub fn score_progress(total: f64, table: &TierTable) -> JourneyProgress {
    let total = if total.is_nan() || total < 0.0 { 0.0 } else { total };
    let tiers = table.tiers();

    let current = tiers.iter().rev().find(|tier| tier.threshold <= total);
    let next = tiers.iter().find(|tier| tier.threshold > total);

    let progress_percentage = match next {
        Some(next) => round2(((total / next.threshold) * 100.0).clamp(0.0, 100.0)),
        None => 100.0,
    };

    let (current_tier_id, current_tier_name) = match current {
        Some(tier) => (tier.id.clone(), tier.name.clone()),
        None => (STARTER_TIER_ID.to_string(), STARTER_TIER_NAME.to_string()),
    };

    JourneyProgress {
        current_tier_id,
        current_tier_name,
        next_tier_id: next.map(|tier| tier.id.clone()),
        next_tier_name: next.map(|tier| tier.name.clone()),
        progress_percentage,
        remaining_to_next: next.map(|tier| tier.threshold - total).unwrap_or(0.0),
        tiers: tiers
            .iter()
            .map(|tier| TierStatus {
                id: tier.id.clone(),
                name: tier.name.clone(),
                threshold: tier.threshold,
                unlocked: total >= tier.threshold,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TierTable {
        TierTable::new(vec![
            Tier::new("avancado", "Avançado", 10_000.0),
            Tier::new("expert", "Expert", 100_000.0),
            Tier::new("prata", "Prata", 500_000.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_below_first_threshold_is_starter() {
        let progress = score_progress(5_000.0, &table());
        assert_eq!(progress.current_tier_id, STARTER_TIER_ID);
        assert_eq!(progress.next_tier_id.as_deref(), Some("avancado"));
        assert_eq!(progress.progress_percentage, 50.0);
        assert_eq!(progress.remaining_to_next, 5_000.0);
        assert!(progress.tiers.iter().all(|t| !t.unlocked));
    }

    #[test]
    fn test_exact_threshold_unlocks_tier() {
        let progress = score_progress(10_000.0, &table());
        assert_eq!(progress.current_tier_id, "avancado");
        assert_eq!(progress.current_tier_name, "Avançado");
        assert_eq!(progress.next_tier_name.as_deref(), Some("Expert"));
        assert_eq!(progress.progress_percentage, 10.0);
        assert!(progress.tiers[0].unlocked);
        assert!(!progress.tiers[1].unlocked);
    }

    #[test]
    fn test_zero_total() {
        let progress = score_progress(0.0, &table());
        assert_eq!(progress.current_tier_id, STARTER_TIER_ID);
        assert_eq!(progress.progress_percentage, 0.0);
    }

    #[test]
    fn test_max_level_reached() {
        for total in [500_000.0, 9_000_000.0, f64::INFINITY] {
            let progress = score_progress(total, &table());
            assert_eq!(progress.current_tier_id, "prata");
            assert_eq!(progress.next_tier_id, None);
            assert_eq!(progress.next_tier_name, None);
            assert_eq!(progress.progress_percentage, 100.0);
            assert_eq!(progress.remaining_to_next, 0.0);
            assert!(progress.tiers.iter().all(|t| t.unlocked));
        }
    }

    #[test]
    fn test_negative_and_nan_score_as_zero() {
        assert_eq!(score_progress(-50.0, &table()), score_progress(0.0, &table()));
        assert_eq!(score_progress(f64::NAN, &table()), score_progress(0.0, &table()));
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(TierTable::new(vec![]).is_err());
        assert!(TierTable::new(vec![Tier::new("a", "A", 0.0)]).is_err());
        assert!(TierTable::new(vec![Tier::new("a", "A", f64::NAN)]).is_err());
        assert!(TierTable::new(vec![
            Tier::new("a", "A", 100.0),
            Tier::new("b", "B", 100.0),
        ])
        .is_err());
        assert!(TierTable::new(vec![
            Tier::new("a", "A", 200.0),
            Tier::new("b", "B", 100.0),
        ])
        .is_err());
        assert!(TierTable::new(vec![
            Tier::new("a", "A", 100.0),
            Tier::new("a", "Again", 200.0),
        ])
        .is_err());
    }

    #[test]
    fn test_default_table_is_valid() {
        let default = TierTable::default();
        assert_eq!(TierTable::new(default.tiers().to_vec()).unwrap(), default);
    }

    #[test]
    fn test_parse_table_spec() {
        let table = TierTable::parse("bronze:Bronze:1000, silver:Prata:5000,").unwrap();
        assert_eq!(table.tiers().len(), 2);
        assert_eq!(table.tiers()[1], Tier::new("silver", "Prata", 5_000.0));

        assert!(TierTable::parse("bronze:Bronze").is_err());
        assert!(TierTable::parse("bronze:Bronze:lots").is_err());
        assert!(TierTable::parse("").is_err());
        assert!(TierTable::parse("b:B:500,a:A:100").is_err());
    }
}
