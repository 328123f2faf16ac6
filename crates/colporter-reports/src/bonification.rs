//! Silver/Gold bonification tiers
//!
//! A tier is achieved only when both the hours and the net amount clear
//! their thresholds on their own; progress on one axis never makes up for
//! the other.

use serde::Serialize;

use crate::constants;
use crate::model::BonificationTotals;

/// Fixed tier thresholds and reward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub name: &'static str,
    pub hours: f64,
    pub net_amount: f64,
    pub reward: f64,
}

pub const SILVER: Tier = Tier {
    name: "Silver",
    hours: constants::SILVER_HOURS,
    net_amount: constants::SILVER_NET_AMOUNT,
    reward: constants::SILVER_REWARD,
};

pub const GOLD: Tier = Tier {
    name: "Gold",
    hours: constants::GOLD_HOURS,
    net_amount: constants::GOLD_NET_AMOUNT,
    reward: constants::GOLD_REWARD,
};

/// Highest tier reached (monotonic within one evaluation)
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TierLevel {
    None,
    SilverAchieved,
    GoldAchieved,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextTarget {
    Silver,
    Gold,
    Completed,
}

impl std::fmt::Display for NextTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextTarget::Silver => write!(f, "SILVER"),
            NextTarget::Gold => write!(f, "GOLD"),
            NextTarget::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Progress towards one tier
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    pub achieved: bool,
    /// Clamped to [0, 100]
    pub hours_progress: f64,
    /// Clamped to [0, 100]
    pub amount_progress: f64,
    pub hours_remaining: f64,
    pub amount_remaining: f64,
    pub reward: f64,
}

impl TierProgress {
    fn evaluate(tier: &Tier, hours: f64, net_amount: f64) -> Self {
        Self {
            achieved: hours >= tier.hours && net_amount >= tier.net_amount,
            hours_progress: clamp_percent(hours / tier.hours * 100.0),
            amount_progress: clamp_percent(net_amount / tier.net_amount * 100.0),
            hours_remaining: (tier.hours - hours).max(0.0),
            amount_remaining: (tier.net_amount - net_amount).max(0.0),
            reward: tier.reward,
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BonificationStatus {
    pub current_hours: f64,
    pub current_net_amount: f64,
    pub silver_status: TierProgress,
    pub gold_status: TierProgress,
    pub level: TierLevel,
    pub next_target: NextTarget,
}

impl BonificationStatus {
    /// Reward of the highest tier reached
    pub fn reward_earned(&self) -> f64 {
        match self.level {
            TierLevel::GoldAchieved => self.gold_status.reward,
            TierLevel::SilverAchieved => self.silver_status.reward,
            TierLevel::None => 0.0,
        }
    }

    /// Progress towards the next target tier, if any
    pub fn target_progress(&self) -> Option<&TierProgress> {
        match self.next_target {
            NextTarget::Silver => Some(&self.silver_status),
            NextTarget::Gold => Some(&self.gold_status),
            NextTarget::Completed => None,
        }
    }
}

/// Evaluate tier progress from worked hours and net deposited amount
pub fn evaluate(hours: f64, net_amount: f64) -> BonificationStatus {
    let silver_status = TierProgress::evaluate(&SILVER, hours, net_amount);
    let gold_status = TierProgress::evaluate(&GOLD, hours, net_amount);

    let level = if gold_status.achieved {
        TierLevel::GoldAchieved
    } else if silver_status.achieved {
        TierLevel::SilverAchieved
    } else {
        TierLevel::None
    };

    let next_target = match level {
        TierLevel::GoldAchieved => NextTarget::Completed,
        TierLevel::SilverAchieved => NextTarget::Gold,
        TierLevel::None => NextTarget::Silver,
    };

    BonificationStatus {
        current_hours: hours,
        current_net_amount: net_amount,
        silver_status,
        gold_status,
        level,
        next_target,
    }
}

/// One colporter's evaluated status
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColporterBonification {
    pub colporter_id: String,
    pub name: String,
    pub status: BonificationStatus,
}

/// Evaluate server-aggregated totals, highest net amount first
pub fn evaluate_all(totals: &[BonificationTotals]) -> Vec<ColporterBonification> {
    let mut results: Vec<ColporterBonification> = totals
        .iter()
        .map(|t| ColporterBonification {
            colporter_id: t.colporter_id.clone(),
            name: t.display_name(),
            status: evaluate(t.total_hours, t.total_net_amount),
        })
        .collect();

    results.sort_by(|a, b| {
        b.status
            .current_net_amount
            .total_cmp(&a.status.current_net_amount)
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silver_threshold_exactly() {
        let status = evaluate(280.0, 3480.0);
        assert!(status.silver_status.achieved);
        assert!(!status.gold_status.achieved);
        assert_eq!(status.level, TierLevel::SilverAchieved);
        assert_eq!(status.next_target, NextTarget::Gold);
        assert_eq!(status.next_target.to_string(), "GOLD");
        assert_eq!(status.reward_earned(), 1496.0);
    }

    #[test]
    fn test_gold_threshold_exactly() {
        let status = evaluate(320.0, 4800.0);
        assert!(status.silver_status.achieved);
        assert!(status.gold_status.achieved);
        assert_eq!(status.next_target, NextTarget::Completed);
        assert_eq!(status.reward_earned(), 2160.0);
        assert!(status.target_progress().is_none());
    }

    #[test]
    fn test_both_axes_must_clear() {
        // Plenty of hours, not enough money
        let status = evaluate(400.0, 3000.0);
        assert!(!status.silver_status.achieved);
        assert_eq!(status.silver_status.hours_progress, 100.0);
        assert!(status.silver_status.amount_progress < 100.0);
        assert_eq!(status.next_target, NextTarget::Silver);

        // Plenty of money, not enough hours
        let status = evaluate(279.0, 10_000.0);
        assert!(!status.silver_status.achieved);
        assert_eq!(status.level, TierLevel::None);
    }

    #[test]
    fn test_progress_is_clamped() {
        let status = evaluate(-10.0, 100_000.0);
        assert_eq!(status.silver_status.hours_progress, 0.0);
        assert_eq!(status.gold_status.amount_progress, 100.0);
        assert_eq!(status.gold_status.amount_remaining, 0.0);
        assert_eq!(status.gold_status.hours_remaining, 330.0);
    }

    #[test]
    fn test_partial_progress() {
        let status = evaluate(140.0, 1740.0);
        assert_eq!(status.silver_status.hours_progress, 50.0);
        assert_eq!(status.silver_status.amount_progress, 50.0);
        assert_eq!(status.silver_status.hours_remaining, 140.0);
        assert_eq!(status.silver_status.amount_remaining, 1740.0);
        assert_eq!(status.reward_earned(), 0.0);
    }

    #[test]
    fn test_evaluate_all_sorts_by_net_amount() {
        let totals = vec![
            BonificationTotals {
                colporter_id: "c1".to_string(),
                name: Some("Ana".to_string()),
                apellido: Some("Lopez".to_string()),
                total_hours: 100.0,
                total_net_amount: 1000.0,
            },
            BonificationTotals {
                colporter_id: "c2".to_string(),
                name: None,
                apellido: None,
                total_hours: 330.0,
                total_net_amount: 5000.0,
            },
        ];

        let results = evaluate_all(&totals);

        assert_eq!(results[0].colporter_id, "c2");
        assert_eq!(results[0].name, "c2");
        assert_eq!(results[0].status.level, TierLevel::GoldAchieved);
        assert_eq!(results[1].name, "Ana Lopez");
    }
}
