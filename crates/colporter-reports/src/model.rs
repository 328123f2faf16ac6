//! Program records as served by the REST API
//!
//! All records are read-only snapshots owned by the backend. Field names
//! follow the API's JSON: camelCase for most records, snake_case inside the
//! program record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants;

// =============================================================================
// Statuses
// =============================================================================

/// Review status shared by transactions, expenses and cash advances
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::Pending => write!(f, "PENDING"),
            ReviewStatus::Approved => write!(f, "APPROVED"),
            ReviewStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Charge lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    Pending,
    Applied,
    Cancelled,
}

impl std::fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeStatus::Pending => write!(f, "PENDING"),
            ChargeStatus::Applied => write!(f, "APPLIED"),
            ChargeStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Book format sold in a transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookSize {
    Large,
    Small,
}

impl std::fmt::Display for BookSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookSize::Large => write!(f, "large"),
            BookSize::Small => write!(f, "small"),
        }
    }
}

/// One line of books in a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookLine {
    pub size: BookSize,
    pub quantity: u32,
    #[serde(default, deserialize_with = "de::amount")]
    pub price: f64,
    pub title: String,
}

/// A day's sales deposit by a colporter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(with = "de::date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "de::id")]
    pub student_id: String,
    #[serde(default, deserialize_with = "de::option_id")]
    pub leader_id: Option<String>,
    #[serde(deserialize_with = "de::amount")]
    pub total: f64,
    pub status: ReviewStatus,
    #[serde(default)]
    pub books: Vec<BookLine>,
    #[serde(default, deserialize_with = "de::amount")]
    pub hours_worked: f64,
    #[serde(default, deserialize_with = "de::amount")]
    pub cash: f64,
    #[serde(default, deserialize_with = "de::amount")]
    pub checks: f64,
    #[serde(default, deserialize_with = "de::amount")]
    pub atm_mobile: f64,
    #[serde(default, deserialize_with = "de::amount")]
    pub paypal: f64,
}

impl Transaction {
    pub fn is_approved(&self) -> bool {
        self.status == ReviewStatus::Approved
    }

    /// Whether this transaction is attributed to `person_id` for the given role
    pub fn belongs_to(&self, person_id: &str, person_type: PersonType) -> bool {
        match person_type {
            PersonType::Colporter => self.student_id == person_id,
            PersonType::Leader => self.leader_id.as_deref() == Some(person_id),
        }
    }

    /// Books sold of one size
    pub fn books_of_size(&self, size: BookSize) -> u32 {
        self.books
            .iter()
            .filter(|b| b.size == size)
            .map(|b| b.quantity)
            .sum()
    }
}

// =============================================================================
// Expenses, advances, charges
// =============================================================================

/// Program or leader expense
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(with = "de::date")]
    pub date: NaiveDate,
    pub category: String,
    #[serde(deserialize_with = "de::amount")]
    pub amount: f64,
    pub status: ReviewStatus,
    /// None for expenses paid by the program itself
    #[serde(default, deserialize_with = "de::option_id")]
    pub leader_id: Option<String>,
    #[serde(default)]
    pub motivo: Option<String>,
}

impl Expense {
    pub fn is_approved(&self) -> bool {
        self.status == ReviewStatus::Approved
    }

    pub fn is_program_expense(&self) -> bool {
        self.leader_id.is_none()
    }
}

/// Cash handed to a person ahead of their earnings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashAdvance {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::id")]
    pub person_id: String,
    #[serde(deserialize_with = "de::amount")]
    pub advance_amount: f64,
    pub status: ReviewStatus,
    #[serde(default, with = "de::option_date")]
    pub request_date: Option<NaiveDate>,
}

impl CashAdvance {
    pub fn is_approved(&self) -> bool {
        self.status == ReviewStatus::Approved
    }
}

/// Deduction against a person's earnings (fines, materials, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::id")]
    pub person_id: String,
    #[serde(deserialize_with = "de::amount")]
    pub amount: f64,
    pub status: ChargeStatus,
    pub category: String,
    /// Date the charge was applied
    #[serde(with = "de::date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

impl Charge {
    pub fn is_applied(&self) -> bool {
        self.status == ChargeStatus::Applied
    }
}

// =============================================================================
// People
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonType {
    Colporter,
    Leader,
}

impl std::fmt::Display for PersonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersonType::Colporter => write!(f, "Colporter"),
            PersonType::Leader => write!(f, "Leader"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub apellido: String,
    pub person_type: PersonType,
}

impl Person {
    pub fn full_name(&self) -> String {
        if self.apellido.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.apellido)
        }
    }

    pub fn is_leader(&self) -> bool {
        self.person_type == PersonType::Leader
    }
}

/// Per-leader revenue share overriding the program's global leader percentage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderPercentage {
    #[serde(deserialize_with = "de::id")]
    pub leader_id: String,
    #[serde(deserialize_with = "de::amount")]
    pub percentage: f64,
    #[serde(default)]
    pub is_active: bool,
}

/// First active override for a leader, if any
pub fn active_override<'a>(
    overrides: &'a [LeaderPercentage],
    leader_id: &str,
) -> Option<&'a LeaderPercentage> {
    overrides
        .iter()
        .find(|o| o.is_active && o.leader_id == leader_id)
}

// =============================================================================
// Program
// =============================================================================

/// Budget cap for one expense category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseBudget {
    pub category: String,
    #[serde(deserialize_with = "de::amount")]
    pub budget_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialConfig {
    #[serde(default, deserialize_with = "de::option_amount")]
    pub colporter_percentage: Option<f64>,
    #[serde(default, deserialize_with = "de::option_amount")]
    pub leader_percentage: Option<f64>,
    #[serde(default)]
    pub expense_budgets: Vec<ExpenseBudget>,
    #[serde(default = "default_allow_override")]
    pub allow_budget_override: bool,
}

fn default_allow_override() -> bool {
    true
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            colporter_percentage: None,
            leader_percentage: None,
            expense_budgets: Vec::new(),
            allow_budget_override: default_allow_override(),
        }
    }
}

impl FinancialConfig {
    /// Budget cap configured for a category (case-insensitive match)
    pub fn budget_for(&self, category: &str) -> Option<&ExpenseBudget> {
        self.expense_budgets
            .iter()
            .find(|b| b.category.eq_ignore_ascii_case(category))
    }
}

/// A time-boxed fundraising campaign
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramConfig {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(with = "de::date")]
    pub start_date: NaiveDate,
    #[serde(with = "de::date")]
    pub end_date: NaiveDate,
    #[serde(default, deserialize_with = "de::amount")]
    pub financial_goal: f64,
    #[serde(rename = "financialConfig", default)]
    pub financial_config: FinancialConfig,
}

impl ProgramConfig {
    pub fn percentages(&self) -> PercentageConfig {
        PercentageConfig::from_financial_config(&self.financial_config)
    }
}

/// Program-wide revenue split percentages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentageConfig {
    pub colporter_percentage: f64,
    pub leader_percentage: f64,
}

impl Default for PercentageConfig {
    fn default() -> Self {
        Self {
            colporter_percentage: constants::DEFAULT_COLPORTER_PERCENTAGE,
            leader_percentage: constants::DEFAULT_LEADER_PERCENTAGE,
        }
    }
}

impl PercentageConfig {
    pub fn from_financial_config(config: &FinancialConfig) -> Self {
        Self {
            colporter_percentage: config
                .colporter_percentage
                .unwrap_or(constants::DEFAULT_COLPORTER_PERCENTAGE),
            leader_percentage: config
                .leader_percentage
                .unwrap_or(constants::DEFAULT_LEADER_PERCENTAGE),
        }
    }

    /// Earnings percentage for a person: colporters get the colporter share,
    /// leaders their active override or the global leader share.
    pub fn percentage_for(
        &self,
        person_id: &str,
        person_type: PersonType,
        overrides: &[LeaderPercentage],
    ) -> f64 {
        match person_type {
            PersonType::Colporter => self.colporter_percentage,
            PersonType::Leader => active_override(overrides, person_id)
                .map(|o| o.percentage)
                .unwrap_or(self.leader_percentage),
        }
    }
}

// =============================================================================
// Server-side aggregates
// =============================================================================

/// Hours and net deposits of one colporter, aggregated across programs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BonificationTotals {
    #[serde(deserialize_with = "de::id")]
    pub colporter_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub apellido: Option<String>,
    #[serde(default, deserialize_with = "de::amount")]
    pub total_hours: f64,
    #[serde(default, deserialize_with = "de::amount")]
    pub total_net_amount: f64,
}

impl BonificationTotals {
    pub fn display_name(&self) -> String {
        match (&self.name, &self.apellido) {
            (Some(name), Some(apellido)) if !apellido.is_empty() => {
                format!("{} {}", name, apellido)
            }
            (Some(name), _) => name.clone(),
            _ => self.colporter_id.clone(),
        }
    }
}

/// Headline numbers served by the dashboard endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    #[serde(deserialize_with = "de::amount")]
    pub total_revenue: f64,
    #[serde(deserialize_with = "de::amount")]
    pub total_expenses: f64,
    pub active_colporters: u32,
    pub active_leaders: u32,
    pub pending_transactions: u32,
    pub pending_expenses: u32,
}

// =============================================================================
// Lenient deserializers
// =============================================================================

/// Parse a `YYYY-MM-DD` date, or the date part of an ISO timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, constants::DATE_FORMAT).ok()
}

/// Deserializers tolerant of the backend's mixed JSON encodings
/// (numeric ids or string ids, decimals sent as strings, timestamps for dates)
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(i64),
        Float(f64),
        Str(String),
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match NumberOrString::deserialize(d)? {
            NumberOrString::Int(i) => Ok(i.to_string()),
            NumberOrString::Float(f) => Ok(f.to_string()),
            NumberOrString::Str(s) => Ok(s),
        }
    }

    pub fn option_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<NumberOrString>::deserialize(d)? {
            None => None,
            Some(NumberOrString::Int(i)) => Some(i.to_string()),
            Some(NumberOrString::Float(f)) => Some(f.to_string()),
            Some(NumberOrString::Str(s)) if s.is_empty() => None,
            Some(NumberOrString::Str(s)) => Some(s),
        })
    }

    fn to_f64<E: serde::de::Error>(value: NumberOrString) -> Result<f64, E> {
        match value {
            NumberOrString::Int(i) => Ok(i as f64),
            NumberOrString::Float(f) => Ok(f),
            NumberOrString::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid amount: {}", s))),
        }
    }

    pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Option::<NumberOrString>::deserialize(d)? {
            None => Ok(0.0),
            Some(value) => to_f64(value),
        }
    }

    pub fn option_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<NumberOrString>::deserialize(d)? {
            None => Ok(None),
            Some(value) => to_f64(value).map(Some),
        }
    }

    pub mod date {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        use crate::constants::DATE_FORMAT;

        pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&date.format(DATE_FORMAT).to_string())
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
            let raw = String::deserialize(d)?;
            crate::model::parse_date(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
        }
    }

    pub mod option_date {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        use crate::constants::DATE_FORMAT;

        pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => s.serialize_some(&d.format(DATE_FORMAT).to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            Ok(raw.as_deref().and_then(crate::model::parse_date))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_from_api_json() {
        let json = r#"{
            "id": 17,
            "date": "2025-06-02T00:00:00.000Z",
            "studentId": "c-1",
            "leaderId": 4,
            "total": "125.50",
            "status": "APPROVED",
            "books": [{"size": "LARGE", "quantity": 2, "price": 40, "title": "Steps to Christ"}],
            "hoursWorked": 8,
            "cash": 100,
            "checks": 0,
            "atmMobile": 25.5,
            "paypal": 0
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id, "17");
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(tx.leader_id.as_deref(), Some("4"));
        assert_eq!(tx.total, 125.5);
        assert!(tx.is_approved());
        assert_eq!(tx.books_of_size(BookSize::Large), 2);
        assert_eq!(tx.books_of_size(BookSize::Small), 0);
    }

    #[test]
    fn test_program_defaults_when_percentages_unset() {
        let json = r#"{
            "id": "p1",
            "start_date": "2025-05-01",
            "end_date": "2025-08-31",
            "financial_goal": 100000,
            "financialConfig": {"expense_budgets": []}
        }"#;

        let program: ProgramConfig = serde_json::from_str(json).unwrap();
        let pct = program.percentages();
        assert_eq!(pct.colporter_percentage, 50.0);
        assert_eq!(pct.leader_percentage, 15.0);
        assert!(program.financial_config.allow_budget_override);
    }

    #[test]
    fn test_expense_without_leader_is_program_expense() {
        let json = r#"{"id": 1, "date": "2025-06-01", "category": "food",
                       "amount": 40, "status": "APPROVED", "leaderId": null, "motivo": "lunch"}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert!(expense.is_program_expense());
        assert!(expense.is_approved());
    }

    #[test]
    fn test_leader_percentage_falls_back_to_global() {
        let pct = PercentageConfig::default();
        let overrides = vec![
            LeaderPercentage {
                leader_id: "l1".to_string(),
                percentage: 20.0,
                is_active: true,
            },
            LeaderPercentage {
                leader_id: "l2".to_string(),
                percentage: 30.0,
                is_active: false,
            },
        ];

        assert_eq!(pct.percentage_for("l1", PersonType::Leader, &overrides), 20.0);
        assert_eq!(pct.percentage_for("l2", PersonType::Leader, &overrides), 15.0);
        assert_eq!(pct.percentage_for("l1", PersonType::Colporter, &overrides), 50.0);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("not-a-date").is_none());
        assert!(parse_date("2025").is_none());
        assert_eq!(
            parse_date("2025-06-08"),
            NaiveDate::from_ymd_opt(2025, 6, 8)
        );
    }
}
