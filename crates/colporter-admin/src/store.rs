//! Program data store
//!
//! One cached resource per API resource for the selected program. Built once
//! in `main` and passed by reference to the command handlers.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colporter_reports::model::{
    BonificationTotals, CashAdvance, Charge, DashboardStats, Expense, LeaderPercentage, Person,
    PersonType, ProgramConfig, ReviewStatus, Transaction,
};
use colporter_reports::summary::ProgramSnapshot;
use tracing::{debug, info};

use crate::api::{ApiClient, Query};
use crate::cache::{Resource, TtlPolicy};
use crate::config::Config;

pub struct ProgramStore {
    api: ApiClient,
    config: Config,
    program: Resource<ProgramConfig>,
    transactions: Resource<Vec<Transaction>>,
    expenses: Resource<Vec<Expense>>,
    advances: Resource<Vec<CashAdvance>>,
    charges: Resource<Vec<Charge>>,
    people: Resource<Vec<Person>>,
    overrides: Resource<Vec<LeaderPercentage>>,
    dashboard_stats: Resource<DashboardStats>,
}

fn loaded<'a, T>(resource: &'a Resource<Vec<T>>, name: &str) -> Result<&'a [T]> {
    resource
        .data()
        .map(Vec::as_slice)
        .with_context(|| format!("{} not loaded", name))
}

impl ProgramStore {
    pub fn new(api: ApiClient, config: Config) -> Self {
        let stats_ttl = TtlPolicy::ExpireAfter(config.dashboard_stats_ttl);
        Self {
            api,
            config,
            program: Resource::new("program", TtlPolicy::FetchOnce),
            transactions: Resource::new("transactions", TtlPolicy::FetchOnce),
            expenses: Resource::new("expenses", TtlPolicy::FetchOnce),
            advances: Resource::new("cash advances", TtlPolicy::FetchOnce),
            charges: Resource::new("charges", TtlPolicy::FetchOnce),
            people: Resource::new("people", TtlPolicy::FetchOnce),
            overrides: Resource::new("leader percentages", TtlPolicy::FetchOnce),
            dashboard_stats: Resource::new("dashboard stats", stats_ttl),
        }
    }

    pub fn program_id(&self) -> Result<String> {
        self.config.require_program().map(str::to_string)
    }

    /// Fetch every program resource that is missing or stale, in sequence
    pub async fn load(&mut self, force: bool) -> Result<()> {
        let program_id = self.program_id()?;
        let api = &self.api;
        let query = Query::program(&program_id);

        self.program
            .load(force, || api.program(&program_id))
            .await
            .with_context(|| format!("Failed to load program '{}'", program_id))?;
        self.transactions
            .load(force, || api.transactions(&query))
            .await
            .context("Failed to load transactions")?;
        self.expenses
            .load(force, || api.expenses(&query))
            .await
            .context("Failed to load expenses")?;
        self.advances
            .load(force, || api.cash_advances(&query))
            .await
            .context("Failed to load cash advances")?;
        self.charges
            .load(force, || api.charges(&query))
            .await
            .context("Failed to load charges")?;
        self.people
            .load(force, || api.people(&query))
            .await
            .context("Failed to load people")?;
        self.overrides
            .load(force, || api.leader_percentages(&query))
            .await
            .context("Failed to load leader percentages")?;

        info!(
            program = %program_id,
            transactions = self.transactions.data().map_or(0, Vec::len),
            people = self.people.data().map_or(0, Vec::len),
            "Program data loaded"
        );
        Ok(())
    }

    /// Read-only view over the loaded resources
    pub fn snapshot(&self) -> Result<ProgramSnapshot<'_>> {
        Ok(ProgramSnapshot {
            program: self.program.data().context("program not loaded")?,
            transactions: loaded(&self.transactions, "transactions")?,
            expenses: loaded(&self.expenses, "expenses")?,
            advances: loaded(&self.advances, "cash advances")?,
            charges: loaded(&self.charges, "charges")?,
            people: loaded(&self.people, "people")?,
            overrides: loaded(&self.overrides, "leader percentages")?,
        })
    }

    /// Resources whose last fetch failed, with the error message
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        let states = [
            (self.program.name(), self.program.error()),
            (self.transactions.name(), self.transactions.error()),
            (self.expenses.name(), self.expenses.error()),
            (self.advances.name(), self.advances.error()),
            (self.charges.name(), self.charges.error()),
            (self.people.name(), self.people.error()),
            (self.overrides.name(), self.overrides.error()),
        ];
        states
            .into_iter()
            .filter_map(|(name, error)| error.map(|e| (name, e)))
            .collect()
    }

    /// Server dashboard numbers, cached for the configured TTL.
    ///
    /// `None` when the server has no stats endpoint (HTTP 404).
    pub async fn dashboard_stats(&mut self, force: bool) -> Result<Option<&DashboardStats>> {
        let program_id = self.config.program_id.clone();
        let api = &self.api;
        let result = self
            .dashboard_stats
            .load(force, || api.dashboard_stats(program_id.as_deref()))
            .await;

        match result {
            Ok(()) => Ok(self.dashboard_stats.data()),
            Err(e) if e.status() == Some(404) => {
                debug!("Dashboard stats not available on this server");
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to load dashboard stats"),
        }
    }

    /// Uncached approved program expenses, for budget checks against current spending
    pub async fn fresh_expenses(&self) -> Result<Vec<Expense>> {
        let program_id = self.program_id()?;
        let query = Query::program(&program_id).with_status(ReviewStatus::Approved);
        self.api
            .expenses(&query)
            .await
            .context("Failed to load expenses")
    }

    /// Uncached transactions of one person within a date range
    pub async fn person_transactions(
        &self,
        person: &Person,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let program_id = self.program_id()?;
        let query = Query::program(&program_id).with_range(start, end);
        let query = match person.person_type {
            PersonType::Colporter => query.with_student(&person.id),
            PersonType::Leader => query.with_leader(&person.id),
        };
        self.api
            .transactions(&query)
            .await
            .with_context(|| format!("Failed to load transactions for '{}'", person.id))
    }

    /// Uncached bonification totals across programs (the selected one when empty)
    pub async fn bonification_totals(
        &self,
        program_ids: &[String],
    ) -> Result<Vec<BonificationTotals>> {
        let ids = if program_ids.is_empty() {
            vec![self.program_id()?]
        } else {
            program_ids.to_vec()
        };
        self.api
            .bonification_totals(&ids)
            .await
            .context("Failed to load bonification totals")
    }
}
