//! Program goal projection
//!
//! Extrapolates the daily average of approved revenue over the days left in
//! the program and applies the current distribution percentages to the
//! projected total.

use chrono::NaiveDate;
use serde::Serialize;

use crate::distribution::RevenueDistribution;
use crate::model::ProgramConfig;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgramProjection {
    pub program_id: String,
    pub as_of: NaiveDate,

    /// Inclusive of both program dates
    pub total_days: i64,
    pub days_elapsed: i64,
    pub days_remaining: i64,

    pub current_revenue: f64,
    pub daily_average: f64,
    pub projected_revenue: f64,

    pub financial_goal: f64,
    /// Percent of goal reached so far (not clamped)
    pub goal_progress: f64,
    pub projected_goal_progress: f64,
    pub amount_needed: f64,
    /// Daily revenue still required to hit the goal, `None` once the program is over
    pub required_daily_average: Option<f64>,

    pub projected_colporter_amount: f64,
    pub projected_leader_amount: f64,
    pub projected_program_amount: f64,
}

impl ProgramProjection {
    pub fn on_track(&self) -> bool {
        self.financial_goal <= 0.0 || self.projected_revenue >= self.financial_goal
    }

    pub fn is_finished(&self) -> bool {
        self.days_remaining == 0
    }
}

fn percent_of(value: f64, goal: f64) -> f64 {
    if goal > 0.0 { value / goal * 100.0 } else { 0.0 }
}

/// Project program revenue as of `as_of`
pub fn project(
    program: &ProgramConfig,
    distribution: &RevenueDistribution,
    as_of: NaiveDate,
) -> ProgramProjection {
    let total_days = ((program.end_date - program.start_date).num_days() + 1).max(0);
    let days_elapsed = ((as_of - program.start_date).num_days() + 1).clamp(0, total_days);
    let days_remaining = total_days - days_elapsed;

    let current_revenue = distribution.total_revenue;
    let daily_average = if days_elapsed > 0 {
        current_revenue / days_elapsed as f64
    } else {
        0.0
    };
    let projected_revenue = current_revenue + daily_average * days_remaining as f64;

    let goal = program.financial_goal;
    let amount_needed = (goal - current_revenue).max(0.0);
    let required_daily_average = if days_remaining > 0 {
        Some(amount_needed / days_remaining as f64)
    } else {
        None
    };

    let share = |pct: f64| projected_revenue * (pct / 100.0);

    ProgramProjection {
        program_id: program.id.clone(),
        as_of,
        total_days,
        days_elapsed,
        days_remaining,
        current_revenue,
        daily_average,
        projected_revenue,
        financial_goal: goal,
        goal_progress: percent_of(current_revenue, goal),
        projected_goal_progress: percent_of(projected_revenue, goal),
        amount_needed,
        required_daily_average,
        projected_colporter_amount: share(distribution.colporter_percentage),
        projected_leader_amount: share(distribution.total_leader_percentage),
        projected_program_amount: share(distribution.program_percentage),
    }
}
