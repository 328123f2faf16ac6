//! Revenue distribution between colporters, leaders and the program
//!
//! Leaders with an active percentage override are "custom" leaders: each
//! override adds its own share to the leader pool. Leaders without one share
//! the program's global leader percentage, which is counted once no matter
//! how many global leaders there are.

use serde::Serialize;

use crate::model::{
    CashAdvance, Expense, LeaderPercentage, PercentageConfig, Person, Transaction, active_override,
};

/// One leader's part of the leader pool
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderShare {
    pub leader_id: String,
    pub name: String,
    /// Effective percentage of total revenue
    pub percentage: f64,
    pub amount: f64,
    /// True when the share comes from an active override
    pub custom: bool,
}

/// Split of gross revenue into colporter, leader and program shares
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueDistribution {
    pub total_revenue: f64,

    pub colporter_percentage: f64,
    pub custom_leader_percentage: f64,
    pub global_leader_percentage: f64,
    pub global_leaders_total_percentage: f64,
    pub total_leader_percentage: f64,
    /// Not clamped: negative when overrides push the split past 100%
    pub program_percentage: f64,

    pub colporter_amount: f64,
    pub custom_leader_amount: f64,
    pub global_leader_amount: f64,
    pub total_leader_amount: f64,
    pub program_gross_amount: f64,

    pub custom_leader_count: usize,
    pub global_leader_count: usize,
    pub leader_shares: Vec<LeaderShare>,
}

impl RevenueDistribution {
    /// Sum of the three top-level percentages
    pub fn percentage_sum(&self) -> f64 {
        self.colporter_percentage + self.total_leader_percentage + self.program_percentage
    }

    /// Whether leader overrides push the program share below zero
    pub fn is_misconfigured(&self) -> bool {
        self.program_percentage < 0.0
    }
}

/// Program gross share minus approved advances and approved program expenses
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NetProfit {
    pub program_gross_amount: f64,
    pub approved_advances: f64,
    pub approved_program_expenses: f64,
    pub net_profit: f64,
}

/// Gross revenue from approved transactions
pub fn total_revenue(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|t| t.is_approved())
        .map(|t| t.total)
        .sum()
}

/// Split approved revenue according to the program percentages and leader overrides.
///
/// `people` may contain colporters too; only leaders take part in the split.
pub fn calculate_distribution(
    transactions: &[Transaction],
    percentages: PercentageConfig,
    people: &[Person],
    overrides: &[LeaderPercentage],
) -> RevenueDistribution {
    let total_revenue = total_revenue(transactions);
    let amount_of = |pct: f64| total_revenue * (pct / 100.0);

    let leaders: Vec<&Person> = people.iter().filter(|p| p.is_leader()).collect();

    // Partition leaders into custom (active override) and global
    let mut custom: Vec<(&Person, f64)> = Vec::new();
    let mut global: Vec<&Person> = Vec::new();
    for &leader in &leaders {
        match active_override(overrides, &leader.id) {
            Some(o) => custom.push((leader, o.percentage)),
            None => global.push(leader),
        }
    }

    // Each override is additive to the pool
    let custom_leader_percentage: f64 = custom.iter().map(|(_, pct)| pct).sum();

    // The global percentage is one shared pool
    let global_leaders_total_percentage = if global.is_empty() {
        0.0
    } else {
        percentages.leader_percentage
    };

    let total_leader_percentage = custom_leader_percentage + global_leaders_total_percentage;
    let program_percentage =
        100.0 - percentages.colporter_percentage - total_leader_percentage;

    let mut leader_shares: Vec<LeaderShare> = custom
        .iter()
        .map(|(leader, pct)| LeaderShare {
            leader_id: leader.id.clone(),
            name: leader.full_name(),
            percentage: *pct,
            amount: amount_of(*pct),
            custom: true,
        })
        .collect();

    if !global.is_empty() {
        let per_leader = global_leaders_total_percentage / global.len() as f64;
        leader_shares.extend(global.iter().map(|leader| LeaderShare {
            leader_id: leader.id.clone(),
            name: leader.full_name(),
            percentage: per_leader,
            amount: amount_of(per_leader),
            custom: false,
        }));
    }

    RevenueDistribution {
        total_revenue,
        colporter_percentage: percentages.colporter_percentage,
        custom_leader_percentage,
        global_leader_percentage: percentages.leader_percentage,
        global_leaders_total_percentage,
        total_leader_percentage,
        program_percentage,
        colporter_amount: amount_of(percentages.colporter_percentage),
        custom_leader_amount: amount_of(custom_leader_percentage),
        global_leader_amount: amount_of(global_leaders_total_percentage),
        total_leader_amount: amount_of(total_leader_percentage),
        program_gross_amount: amount_of(program_percentage),
        custom_leader_count: custom.len(),
        global_leader_count: global.len(),
        leader_shares,
    }
}

/// Program net profit after approved advances and approved program expenses
pub fn calculate_net_profit(
    distribution: &RevenueDistribution,
    advances: &[CashAdvance],
    expenses: &[Expense],
) -> NetProfit {
    let approved_advances: f64 = advances
        .iter()
        .filter(|a| a.is_approved())
        .map(|a| a.advance_amount)
        .sum();
    let approved_program_expenses: f64 = expenses
        .iter()
        .filter(|e| e.is_approved() && e.is_program_expense())
        .map(|e| e.amount)
        .sum();

    NetProfit {
        program_gross_amount: distribution.program_gross_amount,
        approved_advances,
        approved_program_expenses,
        net_profit: distribution.program_gross_amount
            - (approved_advances + approved_program_expenses),
    }
}
