//! Dashboard summary and program/colporter reports

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::bucketing::{self, MonthBucket, Totals, WeekBucket};
use crate::distribution::{self, NetProfit, RevenueDistribution};
use crate::model::{
    BookSize, CashAdvance, Charge, Expense, LeaderPercentage, PercentageConfig, Person,
    PersonType, ProgramConfig, ReviewStatus, Transaction,
};

/// Bundled program resources to reduce function argument counts
#[derive(Debug, Clone, Copy)]
pub struct ProgramSnapshot<'a> {
    pub program: &'a ProgramConfig,
    pub transactions: &'a [Transaction],
    pub expenses: &'a [Expense],
    pub advances: &'a [CashAdvance],
    pub charges: &'a [Charge],
    pub people: &'a [Person],
    pub overrides: &'a [LeaderPercentage],
}

impl ProgramSnapshot<'_> {
    pub fn percentages(&self) -> PercentageConfig {
        self.program.percentages()
    }

    pub fn distribution(&self) -> RevenueDistribution {
        distribution::calculate_distribution(
            self.transactions,
            self.percentages(),
            self.people,
            self.overrides,
        )
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub approved_transactions: usize,
    pub pending_transactions: usize,
    pub rejected_transactions: usize,
    pub large_books: u32,
    pub small_books: u32,
    pub total_hours: f64,
    pub approved_expenses: f64,
    pub pending_expenses: f64,
    pub approved_advances: f64,
    pub applied_charges: f64,
    /// Colporters with at least one approved transaction
    pub active_colporters: usize,
    /// Leaders with at least one approved team transaction
    pub active_leaders: usize,
    pub distribution: RevenueDistribution,
    pub net_profit: NetProfit,
}

pub fn dashboard_summary(snapshot: &ProgramSnapshot) -> DashboardSummary {
    let count_status = |status: ReviewStatus| {
        snapshot
            .transactions
            .iter()
            .filter(|t| t.status == status)
            .count()
    };
    let sum_expenses = |status: ReviewStatus| -> f64 {
        snapshot
            .expenses
            .iter()
            .filter(|e| e.status == status)
            .map(|e| e.amount)
            .sum()
    };

    let totals = bucketing::flat_totals(snapshot.transactions);
    let approved = snapshot.transactions.iter().filter(|t| t.is_approved());
    let active_colporters: BTreeSet<&str> =
        approved.clone().map(|t| t.student_id.as_str()).collect();
    let active_leaders: BTreeSet<&str> = approved.filter_map(|t| t.leader_id.as_deref()).collect();

    let distribution = snapshot.distribution();
    let net_profit =
        distribution::calculate_net_profit(&distribution, snapshot.advances, snapshot.expenses);

    DashboardSummary {
        total_revenue: totals.sales,
        approved_transactions: totals.transaction_count,
        pending_transactions: count_status(ReviewStatus::Pending),
        rejected_transactions: count_status(ReviewStatus::Rejected),
        large_books: totals.large_books,
        small_books: totals.small_books,
        total_hours: totals.hours,
        approved_expenses: sum_expenses(ReviewStatus::Approved),
        pending_expenses: sum_expenses(ReviewStatus::Pending),
        approved_advances: net_profit.approved_advances,
        applied_charges: snapshot
            .charges
            .iter()
            .filter(|c| c.is_applied())
            .map(|c| c.amount)
            .sum(),
        active_colporters: active_colporters.len(),
        active_leaders: active_leaders.len(),
        distribution,
        net_profit,
    }
}

// =============================================================================
// Per-person totals
// =============================================================================

/// Activity and earnings of one person over the whole snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonTotals {
    pub person_id: String,
    pub name: String,
    pub person_type: PersonType,
    /// Own sales for colporters, team sales for leaders
    pub sales: f64,
    pub hours: f64,
    pub large_books: u32,
    pub small_books: u32,
    pub days_worked: usize,
    pub percentage: f64,
    /// `sales * percentage / 100`
    pub earnings: f64,
    pub charges: f64,
    pub advances: f64,
    /// Earnings minus applied charges and approved advances
    pub net: f64,
}

/// Totals for every person of `person_type`, highest sales first
pub fn person_totals(snapshot: &ProgramSnapshot, person_type: PersonType) -> Vec<PersonTotals> {
    let percentages = snapshot.percentages();

    let mut charges: HashMap<&str, f64> = HashMap::new();
    for charge in snapshot.charges.iter().filter(|c| c.is_applied()) {
        *charges.entry(charge.person_id.as_str()).or_insert(0.0) += charge.amount;
    }
    let mut advances: HashMap<&str, f64> = HashMap::new();
    for advance in snapshot.advances.iter().filter(|a| a.is_approved()) {
        *advances.entry(advance.person_id.as_str()).or_insert(0.0) += advance.advance_amount;
    }

    let mut rows: Vec<PersonTotals> = snapshot
        .people
        .iter()
        .filter(|p| p.person_type == person_type)
        .map(|person| {
            let mut sales = 0.0;
            let mut hours = 0.0;
            let mut large_books = 0;
            let mut small_books = 0;
            let mut days = BTreeSet::new();
            for tx in snapshot
                .transactions
                .iter()
                .filter(|t| t.is_approved() && t.belongs_to(&person.id, person_type))
            {
                sales += tx.total;
                hours += tx.hours_worked;
                large_books += tx.books_of_size(BookSize::Large);
                small_books += tx.books_of_size(BookSize::Small);
                days.insert(tx.date);
            }

            let percentage =
                percentages.percentage_for(&person.id, person_type, snapshot.overrides);
            let earnings = sales * (percentage / 100.0);
            let charges = charges.get(person.id.as_str()).copied().unwrap_or(0.0);
            let advances = advances.get(person.id.as_str()).copied().unwrap_or(0.0);

            PersonTotals {
                person_id: person.id.clone(),
                name: person.full_name(),
                person_type,
                sales,
                hours,
                large_books,
                small_books,
                days_worked: days.len(),
                percentage,
                earnings,
                charges,
                advances,
                net: earnings - charges - advances,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.sales.total_cmp(&a.sales));
    rows
}

// =============================================================================
// Program report
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
    pub count: usize,
}

/// Approved expenses by category, largest first
pub fn expenses_by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for expense in expenses.iter().filter(|e| e.is_approved()) {
        let entry = totals.entry(expense.category.as_str()).or_insert((0.0, 0));
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    let mut result: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (amount, count))| CategoryTotal {
            category: category.to_string(),
            amount,
            count,
        })
        .collect();
    result.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgramReport {
    pub program_id: String,
    pub program_name: Option<String>,
    pub totals: Totals,
    pub distribution: RevenueDistribution,
    pub net_profit: NetProfit,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub colporters: Vec<PersonTotals>,
    pub leaders: Vec<PersonTotals>,
    pub weeks: Vec<WeekBucket>,
    pub months: Vec<MonthBucket>,
}

pub fn program_report(snapshot: &ProgramSnapshot) -> ProgramReport {
    let distribution = snapshot.distribution();
    let net_profit =
        distribution::calculate_net_profit(&distribution, snapshot.advances, snapshot.expenses);

    ProgramReport {
        program_id: snapshot.program.id.clone(),
        program_name: snapshot.program.name.clone(),
        totals: bucketing::flat_totals(snapshot.transactions),
        distribution,
        net_profit,
        expenses_by_category: expenses_by_category(snapshot.expenses),
        colporters: person_totals(snapshot, PersonType::Colporter),
        leaders: person_totals(snapshot, PersonType::Leader),
        weeks: bucketing::bucket_by_week(snapshot.transactions),
        months: bucketing::bucket_by_month(snapshot.transactions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookLine, ChargeStatus, FinancialConfig};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn person(id: &str, person_type: PersonType) -> Person {
        Person {
            id: id.to_string(),
            name: id.to_uppercase(),
            apellido: String::new(),
            person_type,
        }
    }

    fn tx(day: u32, student: &str, leader: &str, total: f64, status: ReviewStatus) -> Transaction {
        Transaction {
            id: format!("{}-{}", student, day),
            date: date(day),
            student_id: student.to_string(),
            leader_id: Some(leader.to_string()),
            total,
            status,
            books: vec![BookLine {
                size: BookSize::Large,
                quantity: 1,
                price: total,
                title: "Bible Readings".to_string(),
            }],
            hours_worked: 5.0,
            cash: total,
            checks: 0.0,
            atm_mobile: 0.0,
            paypal: 0.0,
        }
    }

    fn expense(category: &str, amount: f64, status: ReviewStatus) -> Expense {
        Expense {
            id: "e".to_string(),
            date: date(4),
            category: category.to_string(),
            amount,
            status,
            leader_id: None,
            motivo: None,
        }
    }

    struct Fixture {
        program: ProgramConfig,
        transactions: Vec<Transaction>,
        expenses: Vec<Expense>,
        advances: Vec<CashAdvance>,
        charges: Vec<Charge>,
        people: Vec<Person>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                program: ProgramConfig {
                    id: "p1".to_string(),
                    name: Some("Summer".to_string()),
                    start_date: date(1),
                    end_date: date(30),
                    financial_goal: 10_000.0,
                    financial_config: FinancialConfig::default(),
                },
                transactions: vec![
                    tx(2, "c1", "l1", 200.0, ReviewStatus::Approved),
                    tx(2, "c1", "l1", 100.0, ReviewStatus::Approved),
                    tx(3, "c2", "l1", 100.0, ReviewStatus::Approved),
                    tx(3, "c2", "l1", 400.0, ReviewStatus::Pending),
                    tx(4, "c2", "l1", 50.0, ReviewStatus::Rejected),
                ],
                expenses: vec![
                    expense("food", 60.0, ReviewStatus::Approved),
                    expense("fuel", 80.0, ReviewStatus::Approved),
                    expense("food", 30.0, ReviewStatus::Approved),
                    expense("food", 500.0, ReviewStatus::Pending),
                ],
                advances: vec![CashAdvance {
                    id: "a1".to_string(),
                    person_id: "c1".to_string(),
                    advance_amount: 20.0,
                    status: ReviewStatus::Approved,
                    request_date: None,
                }],
                charges: vec![Charge {
                    id: "ch1".to_string(),
                    person_id: "c1".to_string(),
                    amount: 10.0,
                    status: ChargeStatus::Applied,
                    category: "MATERIALS".to_string(),
                    date: date(3),
                    description: None,
                }],
                people: vec![
                    person("c1", PersonType::Colporter),
                    person("c2", PersonType::Colporter),
                    person("c3", PersonType::Colporter),
                    person("l1", PersonType::Leader),
                ],
            }
        }

        fn snapshot(&self) -> ProgramSnapshot<'_> {
            ProgramSnapshot {
                program: &self.program,
                transactions: &self.transactions,
                expenses: &self.expenses,
                advances: &self.advances,
                charges: &self.charges,
                people: &self.people,
                overrides: &[],
            }
        }
    }

    #[test]
    fn test_dashboard_summary() {
        let fixture = Fixture::new();
        let summary = dashboard_summary(&fixture.snapshot());

        assert_eq!(summary.total_revenue, 400.0);
        assert_eq!(summary.approved_transactions, 3);
        assert_eq!(summary.pending_transactions, 1);
        assert_eq!(summary.rejected_transactions, 1);
        assert_eq!(summary.large_books, 3);
        assert_eq!(summary.total_hours, 15.0);
        assert_eq!(summary.approved_expenses, 170.0);
        assert_eq!(summary.pending_expenses, 500.0);
        assert_eq!(summary.applied_charges, 10.0);
        assert_eq!(summary.active_colporters, 2);
        assert_eq!(summary.active_leaders, 1);
        // 400 * 35% program share - 20 advances - 170 program expenses
        assert!((summary.net_profit.net_profit - (140.0 - 190.0)).abs() < 1e-9);
    }

    #[test]
    fn test_person_totals_for_colporters() {
        let fixture = Fixture::new();
        let rows = person_totals(&fixture.snapshot(), PersonType::Colporter);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].person_id, "c1");
        assert_eq!(rows[0].sales, 300.0);
        assert_eq!(rows[0].days_worked, 1);
        assert_eq!(rows[0].earnings, 150.0);
        assert_eq!(rows[0].net, 120.0);
        assert_eq!(rows[1].person_id, "c2");
        assert_eq!(rows[1].sales, 100.0);
        assert_eq!(rows[2].sales, 0.0);
    }

    #[test]
    fn test_person_totals_for_leaders_use_team_sales() {
        let fixture = Fixture::new();
        let rows = person_totals(&fixture.snapshot(), PersonType::Leader);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sales, 400.0);
        assert_eq!(rows[0].percentage, 15.0);
        assert!((rows[0].earnings - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_expenses_by_category() {
        let fixture = Fixture::new();
        let categories = expenses_by_category(&fixture.expenses);

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "food");
        assert_eq!(categories[0].amount, 90.0);
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories[1].category, "fuel");
    }

    #[test]
    fn test_program_report_sections() {
        let fixture = Fixture::new();
        let report = program_report(&fixture.snapshot());

        assert_eq!(report.program_name.as_deref(), Some("Summer"));
        assert_eq!(report.totals.sales, 400.0);
        assert_eq!(report.weeks.len(), 1);
        assert_eq!(report.months.len(), 1);
        assert_eq!(report.colporters.len(), 3);
        assert_eq!(report.leaders.len(), 1);
    }
}
