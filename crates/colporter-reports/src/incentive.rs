//! Proportional distribution of an incentive amount across leaders
//!
//! Each leader receives a share proportional to their team's fraction of
//! total team sales.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::{Person, Transaction};

/// A leader and the sales weight used for allocation
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderWeight {
    pub leader_id: String,
    pub name: String,
    pub team_sales: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderAllocation {
    pub leader_id: String,
    pub name: String,
    pub team_sales: f64,
    /// Fraction of total team sales, in percent
    pub share_percentage: f64,
    pub amount: f64,
}

/// Approved sales of each leader's team, in the order leaders are given.
///
/// Leaders with no sales get a zero weight.
pub fn team_sales(transactions: &[Transaction], leaders: &[Person]) -> Vec<LeaderWeight> {
    let mut sales: HashMap<&str, f64> = HashMap::new();
    for tx in transactions.iter().filter(|t| t.is_approved()) {
        if let Some(leader_id) = tx.leader_id.as_deref() {
            *sales.entry(leader_id).or_insert(0.0) += tx.total;
        }
    }

    leaders
        .iter()
        .filter(|p| p.is_leader())
        .map(|leader| LeaderWeight {
            leader_id: leader.id.clone(),
            name: leader.full_name(),
            team_sales: sales.get(leader.id.as_str()).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Split `total_amount` across leaders proportionally to their team sales.
///
/// When no leader has sales the amount is split equally. Allocations always
/// sum to `total_amount` (up to floating point rounding).
pub fn distribute(total_amount: f64, weights: &[LeaderWeight]) -> Vec<LeaderAllocation> {
    if weights.is_empty() {
        return Vec::new();
    }

    let total_sales: f64 = weights.iter().map(|w| w.team_sales.max(0.0)).sum();
    let equal_share = 1.0 / weights.len() as f64;

    weights
        .iter()
        .map(|w| {
            let fraction = if total_sales > 0.0 {
                w.team_sales.max(0.0) / total_sales
            } else {
                equal_share
            };
            LeaderAllocation {
                leader_id: w.leader_id.clone(),
                name: w.name.clone(),
                team_sales: w.team_sales,
                share_percentage: fraction * 100.0,
                amount: total_amount * fraction,
            }
        })
        .collect()
}

/// Total allocated; the amount checked against the category budget
pub fn allocated_total(allocations: &[LeaderAllocation]) -> f64 {
    allocations.iter().map(|a| a.amount).sum()
}
