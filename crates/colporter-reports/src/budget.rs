//! Budget constraint check for new program expenses
//!
//! Only expenses paid by the program are tracked against category budgets.
//! Expenses assigned to an individual leader are exempt.

use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::model::{Expense, FinancialConfig};

/// Who pays for a new expense
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsibleParty {
    Program,
    Leader(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BudgetLimit {
    /// No cap configured, or a cap of zero or less
    Unlimited { current_spending: f64 },
    Limited {
        budget_amount: f64,
        current_spending: f64,
        remaining: f64,
    },
}

impl BudgetLimit {
    pub fn current_spending(&self) -> f64 {
        match self {
            BudgetLimit::Unlimited { current_spending } => *current_spending,
            BudgetLimit::Limited {
                current_spending, ..
            } => *current_spending,
        }
    }

    /// Remaining budget, `None` when unlimited
    pub fn remaining(&self) -> Option<f64> {
        match self {
            BudgetLimit::Unlimited { .. } => None,
            BudgetLimit::Limited { remaining, .. } => Some(*remaining),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetCheck {
    pub category: String,
    pub requested_amount: f64,
    pub limit: BudgetLimit,
    pub would_exceed: bool,
    /// Exceeding blocks submission only when overrides are not allowed
    pub blocking: bool,
}

impl BudgetCheck {
    /// Fail when the expense would exceed a budget that may not be overridden
    pub fn ensure_allowed(&self) -> Result<()> {
        if self.blocking {
            return Err(ReportError::BudgetExceeded {
                category: self.category.clone(),
                requested: self.requested_amount,
                remaining: self.limit.remaining().unwrap_or(0.0),
            });
        }
        Ok(())
    }

    /// Exceeds, but the program allows overriding the budget
    pub fn is_warning(&self) -> bool {
        self.would_exceed && !self.blocking
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum BudgetOutcome {
    /// Leader expenses are not tracked against budgets
    Exempt,
    Checked(BudgetCheck),
}

impl BudgetOutcome {
    pub fn ensure_allowed(&self) -> Result<()> {
        match self {
            BudgetOutcome::Exempt => Ok(()),
            BudgetOutcome::Checked(check) => check.ensure_allowed(),
        }
    }
}

/// Cumulative approved program spending in a category (case-insensitive).
///
/// Expenses paid by a leader are not tracked against program budgets.
pub fn current_spending(expenses: &[Expense], category: &str) -> f64 {
    expenses
        .iter()
        .filter(|e| {
            e.is_approved()
                && e.is_program_expense()
                && e.category.eq_ignore_ascii_case(category)
        })
        .map(|e| e.amount)
        .sum()
}

/// Check a requested expense against the category budget.
///
/// `expenses` should be a fresh fetch of the category's expenses.
pub fn check_budget(
    party: &ResponsibleParty,
    category: &str,
    requested_amount: f64,
    expenses: &[Expense],
    config: &FinancialConfig,
) -> BudgetOutcome {
    if let ResponsibleParty::Leader(_) = party {
        return BudgetOutcome::Exempt;
    }

    let current_spending = current_spending(expenses, category);

    let limit = match config.budget_for(category) {
        Some(budget) if budget.budget_amount > 0.0 => BudgetLimit::Limited {
            budget_amount: budget.budget_amount,
            current_spending,
            remaining: budget.budget_amount - current_spending,
        },
        _ => BudgetLimit::Unlimited { current_spending },
    };

    let would_exceed = match &limit {
        BudgetLimit::Unlimited { .. } => false,
        BudgetLimit::Limited { remaining, .. } => requested_amount > *remaining,
    };

    BudgetOutcome::Checked(BudgetCheck {
        category: category.to_string(),
        requested_amount,
        limit,
        would_exceed,
        blocking: would_exceed && !config.allow_budget_override,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpenseBudget, ReviewStatus};
    use chrono::NaiveDate;

    fn expense(category: &str, amount: f64, status: ReviewStatus) -> Expense {
        Expense {
            id: "e".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            category: category.to_string(),
            amount,
            status,
            leader_id: None,
            motivo: None,
        }
    }

    fn config(budget: f64, allow_override: bool) -> FinancialConfig {
        FinancialConfig {
            colporter_percentage: None,
            leader_percentage: None,
            expense_budgets: vec![ExpenseBudget {
                category: "food".to_string(),
                budget_amount: budget,
            }],
            allow_budget_override: allow_override,
        }
    }

    fn checked(outcome: BudgetOutcome) -> BudgetCheck {
        match outcome {
            BudgetOutcome::Checked(check) => check,
            BudgetOutcome::Exempt => panic!("expected a budget check"),
        }
    }

    #[test]
    fn test_remaining_and_would_exceed() {
        let expenses = vec![
            expense("food", 300.0, ReviewStatus::Approved),
            expense("Food", 200.0, ReviewStatus::Approved),
            expense("food", 900.0, ReviewStatus::Pending),
            expense("transport", 50.0, ReviewStatus::Approved),
        ];

        let check = checked(check_budget(
            &ResponsibleParty::Program,
            "food",
            600.0,
            &expenses,
            &config(1000.0, true),
        ));

        assert_eq!(check.limit.current_spending(), 500.0);
        assert_eq!(check.limit.remaining(), Some(500.0));
        assert!(check.would_exceed);
        assert!(!check.blocking);
        assert!(check.is_warning());
        assert!(check.ensure_allowed().is_ok());
    }

    #[test]
    fn test_within_budget() {
        let expenses = vec![expense("food", 300.0, ReviewStatus::Approved)];
        let check = checked(check_budget(
            &ResponsibleParty::Program,
            "food",
            700.0,
            &expenses,
            &config(1000.0, false),
        ));
        assert!(!check.would_exceed);
        assert!(check.ensure_allowed().is_ok());
    }

    #[test]
    fn test_blocking_when_override_disallowed() {
        let expenses = vec![expense("food", 900.0, ReviewStatus::Approved)];
        let outcome = check_budget(
            &ResponsibleParty::Program,
            "food",
            150.0,
            &expenses,
            &config(1000.0, false),
        );

        let err = outcome.ensure_allowed().unwrap_err();
        assert!(matches!(err, ReportError::BudgetExceeded { .. }));
        assert!(err.to_string().contains("food"));
    }

    #[test]
    fn test_zero_budget_is_unlimited() {
        let expenses = vec![expense("food", 5_000.0, ReviewStatus::Approved)];
        let check = checked(check_budget(
            &ResponsibleParty::Program,
            "food",
            1_000_000.0,
            &expenses,
            &config(0.0, false),
        ));

        assert_eq!(check.limit.remaining(), None);
        assert!(!check.would_exceed);
        assert!(!check.blocking);
    }

    #[test]
    fn test_unconfigured_category_is_unlimited() {
        let check = checked(check_budget(
            &ResponsibleParty::Program,
            "lodging",
            10.0,
            &[],
            &config(100.0, false),
        ));
        assert!(matches!(check.limit, BudgetLimit::Unlimited { .. }));
    }

    #[test]
    fn test_leader_expense_is_exempt() {
        let expenses = vec![expense("food", 990.0, ReviewStatus::Approved)];
        let outcome = check_budget(
            &ResponsibleParty::Leader("l1".to_string()),
            "food",
            500.0,
            &expenses,
            &config(1000.0, false),
        );
        assert_eq!(outcome, BudgetOutcome::Exempt);
        assert!(outcome.ensure_allowed().is_ok());
    }

    #[test]
    fn test_leader_paid_spending_does_not_count_against_program_budget() {
        let mut leader_paid = expense("food", 990.0, ReviewStatus::Approved);
        leader_paid.leader_id = Some("l1".to_string());
        let expenses = vec![leader_paid, expense("food", 100.0, ReviewStatus::Approved)];

        let outcome = check_budget(
            &ResponsibleParty::Program,
            "food",
            20.0,
            &expenses,
            &config(1000.0, false),
        );
        assert!(outcome.ensure_allowed().is_ok());

        let check = checked(outcome);
        assert_eq!(check.limit.current_spending(), 100.0);
        assert_eq!(check.limit.remaining(), Some(900.0));
        assert!(!check.would_exceed);
        assert!(!check.blocking);
    }
}
