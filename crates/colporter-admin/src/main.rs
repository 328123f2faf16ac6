//! Colporter Program Financial Dashboard
//!
//! Fetches program records from the admin REST API and prints derived
//! financial reports: revenue distribution, projections, weekly/monthly
//! sales, individual earnings, bonifications, budget checks and incentive
//! allocation. Reports can be exported as CSV or printable HTML.

mod api;
mod cache;
mod config;
mod constants;
mod output;
mod store;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use colporter_reports::bonification;
use colporter_reports::bucketing;
use colporter_reports::budget::{self, ResponsibleParty};
use colporter_reports::export;
use colporter_reports::incentive;
use colporter_reports::individual::{self, IndividualReportRequest};
use colporter_reports::model::Person;
use colporter_reports::projection;
use colporter_reports::summary::{self, ProgramSnapshot};

use api::ApiClient;
use config::{Config, FileConfig};
use store::ProgramStore;

/// Load config file or exit with helpful message
fn load_config_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        anyhow::bail!(
            "Config file '{}' not found.\n\n\
            To get started:\n\
            1. Copy config.toml.example to {}\n\
            2. Fill in the API URL and your tokens\n\n\
            See config.toml.example for the required format.",
            path.display(),
            constants::CONFIG_FILE
        );
    }

    FileConfig::load(path)
}

/// Initialize tracing; `--verbose` overrides RUST_LOG
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[derive(Parser, Debug)]
#[command(name = "colporter-admin")]
#[command(about = "Financial reports for colporter fundraising programs")]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = constants::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Data directory (session tokens)
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Output directory for generated CSV/HTML reports
    #[arg(short, long, default_value = "./output", global = true)]
    output_dir: PathBuf,

    /// Program id (overrides [program] id in config.toml)
    #[arg(short, long, global = true)]
    program: Option<String>,

    /// API base URL (overrides [api] base_url in config.toml)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Program dashboard: sales, costs, distribution and net profit
    Summary {
        /// Re-print every SECS seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,

        /// Ignore cached data
        #[arg(long)]
        refresh: bool,
    },

    /// Revenue split between colporters, leaders and the program
    Distribution,

    /// Project revenue to the end of the program
    Projection {
        /// Project from today instead of the latest sale
        #[arg(long)]
        today: bool,
    },

    /// Weekly sales and books
    Weekly {
        /// Only the most recent week with sales
        #[arg(long)]
        current: bool,

        /// Restrict to one colporter or leader
        #[arg(long)]
        person: Option<String>,
    },

    /// Monthly sales and days worked
    Monthly {
        /// Restrict to one colporter or leader
        #[arg(long)]
        person: Option<String>,
    },

    /// Earnings and charges of one person over a date range
    Individual {
        /// Person id
        #[arg(long)]
        person: String,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Also write a CSV file to the output directory
        #[arg(long)]
        csv: bool,

        /// Also write a printable HTML file to the output directory
        #[arg(long)]
        html: bool,
    },

    /// Silver/Gold bonification progress
    Bonification {
        /// Programs to aggregate (comma-separated; default: the selected program)
        #[arg(long, value_delimiter = ',')]
        programs: Vec<String>,

        /// Evaluate given hours instead of fetching (requires --amount)
        #[arg(long, requires = "amount")]
        hours: Option<f64>,

        /// Evaluate given net amount instead of fetching (requires --hours)
        #[arg(long, requires = "hours")]
        amount: Option<f64>,
    },

    /// Check a new expense against its category budget
    BudgetCheck {
        /// Expense category
        #[arg(long)]
        category: String,

        /// Expense amount in USD
        #[arg(long)]
        amount: f64,

        /// Leader paying the expense (leader expenses are not budgeted)
        #[arg(long)]
        leader: Option<String>,
    },

    /// Split an incentive across leaders by team sales
    Incentive {
        /// Amount to distribute in USD
        #[arg(long)]
        total: f64,

        /// Budget category to check the allocation against
        #[arg(long)]
        category: Option<String>,
    },

    /// Write all program CSV reports to the output directory
    Report,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Manual bonification evaluation needs no API access
    if let Command::Bonification {
        hours: Some(hours),
        amount: Some(amount),
        ..
    } = &args.command
    {
        output::print_bonification_status(&bonification::evaluate(*hours, *amount));
        return Ok(());
    }

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create {}", args.data_dir.display()))?;

    let file_config = load_config_file(&args.config)?;
    let config = Config::from_file(&file_config, args.api_url, args.program, &args.data_dir)?;
    debug!(base_url = %config.base_url, program = ?config.program_id, "Configuration loaded");

    let api = ApiClient::new(&config)?;
    let mut store = ProgramStore::new(api, config);

    handle_command(args.command, &mut store, &args.output_dir).await
}

async fn handle_command(
    command: Command,
    store: &mut ProgramStore,
    output_dir: &Path,
) -> Result<()> {
    match command {
        Command::Summary { watch, refresh } => match watch {
            Some(secs) => watch_summary(store, refresh, Duration::from_secs(secs.max(1))).await,
            None => show_summary(store, refresh).await,
        },

        Command::Distribution => {
            store.load(false).await?;
            let snapshot = store.snapshot()?;
            let distribution = snapshot.distribution();
            let net = colporter_reports::distribution::calculate_net_profit(
                &distribution,
                snapshot.advances,
                snapshot.expenses,
            );
            output::print_distribution(&distribution, &net);
            Ok(())
        }

        Command::Projection { today } => {
            store.load(false).await?;
            let snapshot = store.snapshot()?;
            let as_of = if today {
                chrono::Local::now().date_naive()
            } else {
                latest_sale_date(&snapshot).unwrap_or(snapshot.program.start_date)
            };
            let projection = projection::project(snapshot.program, &snapshot.distribution(), as_of);
            output::print_projection(&program_name(&snapshot), &projection);
            Ok(())
        }

        Command::Weekly { current, person } => {
            store.load(false).await?;
            let snapshot = store.snapshot()?;
            let weeks = match &person {
                Some(id) => {
                    let person = find_person(&snapshot, id)?;
                    println!(
                        "Weekly sales for {} ({})",
                        person.full_name(),
                        person.person_type
                    );
                    bucketing::bucket_by_week(&bucketing::for_person(
                        snapshot.transactions,
                        &person.id,
                        person.person_type,
                    ))
                }
                None => bucketing::bucket_by_week(snapshot.transactions),
            };

            if current {
                match bucketing::current_week(&weeks) {
                    Some(week) => output::print_weeks(std::slice::from_ref(week)),
                    None => println!("No approved sales in this period."),
                }
            } else {
                output::print_weeks(&weeks);
                let totals = bucketing::bucket_totals(&weeks);
                if totals.transaction_count > 0 {
                    println!(
                        "\nAll weeks: {} in sales, {} books ({} large, {} small), {:.1} hours",
                        format_money(totals.sales),
                        totals.total_books(),
                        totals.large_books,
                        totals.small_books,
                        totals.hours
                    );
                }
            }
            Ok(())
        }

        Command::Monthly { person } => {
            store.load(false).await?;
            let snapshot = store.snapshot()?;
            let months = match &person {
                Some(id) => {
                    let person = find_person(&snapshot, id)?;
                    println!(
                        "Monthly sales for {} ({})",
                        person.full_name(),
                        person.person_type
                    );
                    bucketing::bucket_by_month(&bucketing::for_person(
                        snapshot.transactions,
                        &person.id,
                        person.person_type,
                    ))
                }
                None => bucketing::bucket_by_month(snapshot.transactions),
            };
            output::print_months(&months);
            Ok(())
        }

        Command::Individual {
            person,
            start,
            end,
            csv,
            html,
        } => {
            store.load(false).await?;
            let snapshot = store.snapshot()?;
            let person = find_person(&snapshot, &person)?;
            let request = IndividualReportRequest {
                person_id: person.id.clone(),
                person_type: person.person_type,
                start_date: start,
                end_date: end,
            };
            let transactions = store.person_transactions(person, start, end).await?;
            let report = individual::build_individual_report(
                &request,
                &transactions,
                snapshot.charges,
                &snapshot.percentages(),
                snapshot.overrides,
            )?;

            let name = person.full_name();
            output::print_individual(&name, &report);

            let stem = format!("individual_{}_{}_{}", person.id, start, end);
            if csv {
                let path = create_output_path(output_dir, &format!("{}.csv", stem))?;
                let file = create_file(&path)?;
                export::write_individual_csv(file, &report, &name)?;
                println!("\n  Generated: {}", path.display());
            }
            if html {
                let path = create_output_path(output_dir, &format!("{}.html", stem))?;
                std::fs::write(&path, export::individual_html(&report, &name))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("  Generated: {}", path.display());
            }
            Ok(())
        }

        Command::Bonification { programs, .. } => {
            let totals = store.bonification_totals(&programs).await?;
            output::print_bonifications(&bonification::evaluate_all(&totals));
            Ok(())
        }

        Command::BudgetCheck {
            category,
            amount,
            leader,
        } => {
            store.load(false).await?;
            let expenses = store.fresh_expenses().await?;
            let snapshot = store.snapshot()?;
            let party = match leader {
                Some(id) => ResponsibleParty::Leader(id),
                None => ResponsibleParty::Program,
            };
            let outcome = budget::check_budget(
                &party,
                &category,
                amount,
                &expenses,
                &snapshot.program.financial_config,
            );
            output::print_budget_check(&outcome);
            outcome.ensure_allowed()?;
            Ok(())
        }

        Command::Incentive { total, category } => {
            store.load(false).await?;
            let snapshot = store.snapshot()?;
            let weights = incentive::team_sales(snapshot.transactions, snapshot.people);
            let allocations = incentive::distribute(total, &weights);
            output::print_incentive(&allocations);

            if let Some(category) = category {
                let expenses = store.fresh_expenses().await?;
                let outcome = budget::check_budget(
                    &ResponsibleParty::Program,
                    &category,
                    incentive::allocated_total(&allocations),
                    &expenses,
                    &snapshot.program.financial_config,
                );
                println!();
                output::print_budget_check(&outcome);
                outcome.ensure_allowed()?;
            }
            Ok(())
        }

        Command::Report => {
            store.load(false).await?;
            let snapshot = store.snapshot()?;
            write_reports(&snapshot, output_dir)
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Print the dashboard, falling back to the last loaded data when a fetch fails
async fn show_summary(store: &mut ProgramStore, force: bool) -> Result<()> {
    if let Err(e) = store.load(force).await {
        if store.snapshot().is_err() {
            return Err(e);
        }
        eprintln!("Warning: {:#}", e);
        for (resource, error) in store.failures() {
            eprintln!("  {}: {}", resource, error);
        }
        eprintln!("Showing the last loaded data.");
    }

    let stats = match store.dashboard_stats(force).await {
        Ok(stats) => stats.cloned(),
        Err(e) => {
            let message = format!("{:#}", e);
            warn!(error = %message, "Dashboard stats unavailable");
            None
        }
    };

    let snapshot = store.snapshot()?;
    let dashboard = summary::dashboard_summary(&snapshot);
    let categories = summary::expenses_by_category(snapshot.expenses);
    output::print_summary(
        &program_name(&snapshot),
        &dashboard,
        stats.as_ref(),
        &categories,
    );
    Ok(())
}

async fn watch_summary(store: &mut ProgramStore, refresh: bool, interval: Duration) -> Result<()> {
    show_summary(store, refresh).await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopped.");
                return Ok(());
            }
            _ = tokio::time::sleep(interval) => {}
        }

        // Program data is fetched once per process, so later rounds force it
        if let Err(e) = show_summary(store, true).await {
            eprintln!("Error: {:#}", e);
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn format_money(val: f64) -> String {
    format!("${:.2}", val)
}

fn program_name(snapshot: &ProgramSnapshot) -> String {
    snapshot
        .program
        .name
        .clone()
        .unwrap_or_else(|| snapshot.program.id.clone())
}

fn latest_sale_date(snapshot: &ProgramSnapshot) -> Option<NaiveDate> {
    snapshot
        .transactions
        .iter()
        .filter(|t| t.is_approved())
        .map(|t| t.date)
        .max()
}

fn find_person<'a>(snapshot: &'a ProgramSnapshot, id: &str) -> Result<&'a Person> {
    match snapshot.person(id) {
        Some(person) => Ok(person),
        None => anyhow::bail!(
            "Person '{}' not found in program '{}'.\n\n\
            Use 'colporter-admin report' to list people.",
            id,
            snapshot.program.id
        ),
    }
}

fn create_output_path(output_dir: &Path, filename: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    Ok(output_dir.join(filename))
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))
}

/// Write all program-wide CSV reports
fn write_reports(snapshot: &ProgramSnapshot, output_dir: &Path) -> Result<()> {
    let report = summary::program_report(snapshot);
    println!("Writing reports for {}...\n", program_name(snapshot));

    let path = create_output_path(output_dir, constants::WEEKLY_REPORT_FILENAME)?;
    export::write_weekly_csv(create_file(&path)?, &report.weeks)?;
    println!("  Generated: {}", path.display());

    let path = create_output_path(output_dir, constants::MONTHLY_REPORT_FILENAME)?;
    export::write_monthly_csv(create_file(&path)?, &report.months)?;
    println!("  Generated: {}", path.display());

    let path = create_output_path(output_dir, constants::COLPORTERS_REPORT_FILENAME)?;
    export::write_person_totals_csv(create_file(&path)?, &report.colporters)?;
    println!("  Generated: {}", path.display());

    let path = create_output_path(output_dir, constants::LEADERS_REPORT_FILENAME)?;
    export::write_person_totals_csv(create_file(&path)?, &report.leaders)?;
    println!("  Generated: {}", path.display());

    output::print_person_totals("COLPORTERS", &report.colporters);
    output::print_person_totals("LEADERS", &report.leaders);

    debug!(
        colporters = report.colporters.len(),
        leaders = report.leaders.len(),
        "Reports written"
    );
    Ok(())
}
