//! Console rendering of reports

use colporter_reports::bonification::{BonificationStatus, ColporterBonification, TierProgress};
use colporter_reports::bucketing::{MonthBucket, WeekBucket};
use colporter_reports::budget::{BudgetLimit, BudgetOutcome};
use colporter_reports::distribution::{NetProfit, RevenueDistribution};
use colporter_reports::export;
use colporter_reports::incentive::{LeaderAllocation, allocated_total};
use colporter_reports::individual::IndividualReport;
use colporter_reports::model::{BookSize, DashboardStats};
use colporter_reports::projection::ProgramProjection;
use colporter_reports::summary::{CategoryTotal, DashboardSummary, PersonTotals};
use tabled::settings::Style;
use tabled::{Table, Tabled};

fn money(val: f64) -> String {
    format!("${}", export::money(val))
}

fn money_row(label: &str, amount: f64) {
    println!("  {:<22}{:>12}", label, money(amount));
}

fn deduction_row(label: &str, amount: f64) {
    println!("  {:<21}-{:>12}", label, money(amount));
}

fn print_header(title: &str) {
    println!("\n============================================================");
    println!("{:^60}", title);
    println!("============================================================\n");
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{}", table);
}

// =============================================================================
// Summary
// =============================================================================

pub fn print_summary(
    program_name: &str,
    summary: &DashboardSummary,
    stats: Option<&DashboardStats>,
    categories: &[CategoryTotal],
) {
    print_header(&format!("PROGRAM SUMMARY: {}", program_name));

    println!("SALES:");
    money_row("Total Revenue:", summary.total_revenue);
    println!(
        "  Transactions:         {:>12}  ({} pending, {} rejected)",
        summary.approved_transactions, summary.pending_transactions, summary.rejected_transactions
    );
    println!(
        "  Books:                {:>12}  ({} large, {} small)",
        summary.large_books + summary.small_books,
        summary.large_books,
        summary.small_books
    );
    println!("  Hours Worked:         {:>12.1}", summary.total_hours);
    println!(
        "  Active People:        {:>12}  colporters, {} leaders",
        summary.active_colporters, summary.active_leaders
    );

    println!("\nCOSTS:");
    money_row("Approved Expenses:", summary.approved_expenses);
    money_row("Pending Expenses:", summary.pending_expenses);
    money_row("Cash Advances:", summary.approved_advances);
    money_row("Applied Charges:", summary.applied_charges);

    if !categories.is_empty() {
        println!("\nEXPENSES BY CATEGORY:");
        for category in categories {
            println!(
                "  {:<20} {:>12}  ({} item(s))",
                category.category,
                money(category.amount),
                category.count
            );
        }
    }

    print_distribution(&summary.distribution, &summary.net_profit);

    if let Some(stats) = stats {
        println!("\nSERVER DASHBOARD:");
        money_row("Total Revenue:", stats.total_revenue);
        money_row("Total Expenses:", stats.total_expenses);
        println!(
            "  Pending:              {:>12}  transactions, {} expenses",
            stats.pending_transactions, stats.pending_expenses
        );
    }

    println!("============================================================");
}

// =============================================================================
// Distribution
// =============================================================================

pub fn print_distribution(dist: &RevenueDistribution, net: &NetProfit) {
    println!(
        "\nREVENUE DISTRIBUTION ({} total):",
        money(dist.total_revenue)
    );
    println!(
        "  Colporters:           {:>7.2}%  {:>12}",
        dist.colporter_percentage,
        money(dist.colporter_amount)
    );
    println!(
        "  Custom Leaders ({}):   {:>7.2}%  {:>12}",
        dist.custom_leader_count,
        dist.custom_leader_percentage,
        money(dist.custom_leader_amount)
    );
    println!(
        "  Global Leaders ({}):   {:>7.2}%  {:>12}",
        dist.global_leader_count,
        dist.global_leaders_total_percentage,
        money(dist.global_leader_amount)
    );
    println!(
        "  Program:              {:>7.2}%  {:>12}",
        dist.program_percentage,
        money(dist.program_gross_amount)
    );
    if dist.is_misconfigured() {
        println!("  WARNING: leader percentages exceed the share left after colporters");
    }

    if !dist.leader_shares.is_empty() {
        println!("\n  {:<28} {:>8} {:>12}", "Leader", "Share", "Amount");
        println!("  {}", "-".repeat(50));
        for share in &dist.leader_shares {
            println!(
                "  {:<28} {:>7.2}% {:>12}{}",
                share.name,
                share.percentage,
                money(share.amount),
                if share.custom { "  (custom)" } else { "" }
            );
        }
    }

    println!("\nNET PROFIT:");
    money_row("Program Share:", net.program_gross_amount);
    deduction_row("Cash Advances:", net.approved_advances);
    deduction_row("Program Expenses:", net.approved_program_expenses);
    println!("  ─────────────────────────────────────");
    money_row("Net Profit:", net.net_profit);
}

// =============================================================================
// Projection
// =============================================================================

pub fn print_projection(program_name: &str, p: &ProgramProjection) {
    print_header(&format!("PROJECTION: {}", program_name));

    println!(
        "  As of {}: day {} of {} ({} remaining)",
        p.as_of, p.days_elapsed, p.total_days, p.days_remaining
    );
    println!();
    money_row("Current Revenue:", p.current_revenue);
    money_row("Daily Average:", p.daily_average);
    money_row("Projected Revenue:", p.projected_revenue);
    money_row("Financial Goal:", p.financial_goal);
    println!(
        "  Goal Progress:        {:>11.1}%  (projected {:.1}%)",
        p.goal_progress, p.projected_goal_progress
    );
    money_row("Amount Needed:", p.amount_needed);
    match p.required_daily_average {
        Some(required) => money_row("Required Daily Avg:", required),
        None => println!("  Program has ended."),
    }

    println!("\n  Projected Shares:");
    money_row("  Colporters:", p.projected_colporter_amount);
    money_row("  Leaders:", p.projected_leader_amount);
    money_row("  Program:", p.projected_program_amount);

    println!(
        "\n  Status: {}",
        if p.on_track() { "ON TRACK" } else { "BEHIND GOAL" }
    );
}

// =============================================================================
// Weekly / monthly
// =============================================================================

pub fn print_weeks(weeks: &[WeekBucket]) {
    if weeks.is_empty() {
        println!("No approved sales in this period.");
        return;
    }

    for week in weeks {
        println!("\nWeek {}", week.label());
        println!(
            "{:<12} {:<10} {:>12} {:>7} {:>7}",
            "Date", "Day", "Sales", "Large", "Small"
        );
        println!("{}", "-".repeat(52));
        for date in week.dates() {
            println!(
                "{:<12} {:<10} {:>12} {:>7} {:>7}",
                date.to_string(),
                date.format("%A").to_string(),
                money(week.sales_on(date)),
                week.books_on(date, BookSize::Large),
                week.books_on(date, BookSize::Small),
            );
        }
        println!("{}", "-".repeat(52));
        println!(
            "{:<23} {:>12} {:>7} {:>7}",
            "Total",
            money(week.total_sales()),
            week.book_count(BookSize::Large),
            week.book_count(BookSize::Small),
        );

        let titles = week.titles(BookSize::Large);
        if !titles.is_empty() {
            println!("\n  Large titles:");
            for (title, qty) in &titles {
                println!("    {:<40} {:>5}", title, qty);
            }
        }
        let titles = week.titles(BookSize::Small);
        if !titles.is_empty() {
            println!("  Small titles:");
            for (title, qty) in &titles {
                println!("    {:<40} {:>5}", title, qty);
            }
        }
    }
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    label: String,
    #[tabled(rename = "Sales")]
    sales: String,
    #[tabled(rename = "Large")]
    large: u32,
    #[tabled(rename = "Small")]
    small: u32,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Days")]
    days: usize,
    #[tabled(rename = "Daily Avg")]
    daily_average: String,
}

pub fn print_months(months: &[MonthBucket]) {
    if months.is_empty() {
        println!("No approved sales in this period.");
        return;
    }

    print_table(
        months
            .iter()
            .map(|m| MonthRow {
                label: m.label.clone(),
                sales: money(m.sales),
                large: m.large_books,
                small: m.small_books,
                hours: format!("{:.1}", m.hours),
                days: m.days_worked,
                daily_average: money(m.daily_average()),
            })
            .collect(),
    );
}

// =============================================================================
// People
// =============================================================================

#[derive(Tabled)]
struct PersonRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Sales")]
    sales: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Books")]
    books: u32,
    #[tabled(rename = "Days")]
    days: usize,
    #[tabled(rename = "%")]
    percentage: String,
    #[tabled(rename = "Earnings")]
    earnings: String,
    #[tabled(rename = "Charges")]
    charges: String,
    #[tabled(rename = "Advances")]
    advances: String,
    #[tabled(rename = "Net")]
    net: String,
}

pub fn print_person_totals(title: &str, rows: &[PersonTotals]) {
    println!("\n{}:", title);
    if rows.is_empty() {
        println!("  (none)");
        return;
    }

    print_table(
        rows.iter()
            .map(|r| PersonRow {
                name: r.name.clone(),
                sales: money(r.sales),
                hours: format!("{:.1}", r.hours),
                books: r.large_books + r.small_books,
                days: r.days_worked,
                percentage: format!("{:.2}", r.percentage),
                earnings: money(r.earnings),
                charges: money(r.charges),
                advances: money(r.advances),
                net: money(r.net),
            })
            .collect(),
    );
}

// =============================================================================
// Individual report
// =============================================================================

pub fn print_individual(person_name: &str, report: &IndividualReport) {
    print_header(&format!(
        "{} ({}) {} - {}",
        person_name, report.person_type, report.start_date, report.end_date
    ));

    if report.is_empty() {
        println!("No sales or charges in this period.");
        return;
    }

    for week in report.weeks() {
        println!("Week {}", week.week_label);
        for day in &week.days {
            println!(
                "  {:<12} {:<10} {:>12}",
                day.date.to_string(),
                day.day_name,
                money(day.amount)
            );
        }
        println!("  {:<23} {:>12}\n", "Week total", money(week.week_total));
    }

    if !report.charges.is_empty() {
        println!("CHARGES:");
        for charge in &report.charges {
            println!(
                "  {:<12} {:<16} {:>12}  {}",
                charge.date.to_string(),
                charge.category,
                money(charge.amount),
                charge.description.as_deref().unwrap_or("")
            );
        }
        println!();
    }

    money_row("Total Earnings:", report.total_earnings);
    println!(
        "  Scaled ({:>5.2}%):      {:>12}",
        report.percentage,
        money(report.scaled_earnings)
    );
    deduction_row("Charges:", report.total_charges);
    println!("  ─────────────────────────────────────");
    money_row("Net Amount:", report.net_amount);
}

// =============================================================================
// Bonification
// =============================================================================

fn tier_line(name: &str, tier: &TierProgress) {
    println!(
        "  {:<7} {:<9} hours {:>5.1}% ({:.1} left)  amount {:>5.1}% ({} left)  reward {}",
        name,
        if tier.achieved { "ACHIEVED" } else { "pending" },
        tier.hours_progress,
        tier.hours_remaining,
        tier.amount_progress,
        money(tier.amount_remaining),
        money(tier.reward)
    );
}

pub fn print_bonification_status(status: &BonificationStatus) {
    println!(
        "Hours: {:.1}  Net amount: {}",
        status.current_hours,
        money(status.current_net_amount)
    );
    tier_line("Silver", &status.silver_status);
    tier_line("Gold", &status.gold_status);
    println!("  Next target: {}", status.next_target);
}

#[derive(Tabled)]
struct BonificationRow {
    #[tabled(rename = "Colporter")]
    name: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Silver")]
    silver: String,
    #[tabled(rename = "Gold")]
    gold: String,
    #[tabled(rename = "Next")]
    next: String,
    #[tabled(rename = "Reward")]
    reward: String,
}

fn tier_cell(tier: &TierProgress) -> String {
    if tier.achieved {
        "yes".to_string()
    } else {
        format!("{:.0}% / {:.0}%", tier.hours_progress, tier.amount_progress)
    }
}

pub fn print_bonifications(results: &[ColporterBonification]) {
    if results.is_empty() {
        println!("No bonification data for the selected programs.");
        return;
    }

    print_table(
        results
            .iter()
            .map(|r| BonificationRow {
                name: r.name.clone(),
                hours: format!("{:.1}", r.status.current_hours),
                net: money(r.status.current_net_amount),
                silver: tier_cell(&r.status.silver_status),
                gold: tier_cell(&r.status.gold_status),
                next: r.status.next_target.to_string(),
                reward: money(r.status.reward_earned()),
            })
            .collect(),
    );
}

// =============================================================================
// Budget / incentive
// =============================================================================

pub fn print_budget_check(outcome: &BudgetOutcome) {
    let check = match outcome {
        BudgetOutcome::Exempt => {
            println!("Leader expense: not tracked against program budgets.");
            return;
        }
        BudgetOutcome::Checked(check) => check,
    };

    println!("Category:          {}", check.category);
    println!("Requested:         {:>12}", money(check.requested_amount));
    match &check.limit {
        BudgetLimit::Unlimited { current_spending } => {
            println!("Spent so far:      {:>12}", money(*current_spending));
            println!("Budget:            {:>12}", "unlimited");
        }
        BudgetLimit::Limited {
            budget_amount,
            current_spending,
            remaining,
        } => {
            println!("Budget:            {:>12}", money(*budget_amount));
            println!("Spent so far:      {:>12}", money(*current_spending));
            println!("Remaining:         {:>12}", money(*remaining));
        }
    }

    if check.blocking {
        println!("\nBLOCKED: this expense exceeds the budget and overrides are not allowed.");
    } else if check.is_warning() {
        println!("\nWARNING: this expense exceeds the remaining budget (override allowed).");
    } else {
        println!("\nOK: within budget.");
    }
}

#[derive(Tabled)]
struct AllocationRow {
    #[tabled(rename = "Leader")]
    name: String,
    #[tabled(rename = "Team Sales")]
    team_sales: String,
    #[tabled(rename = "Share")]
    share: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

pub fn print_incentive(allocations: &[LeaderAllocation]) {
    if allocations.is_empty() {
        println!("No leaders to allocate to.");
        return;
    }

    print_table(
        allocations
            .iter()
            .map(|a| AllocationRow {
                name: a.name.clone(),
                team_sales: money(a.team_sales),
                share: format!("{:.2}%", a.share_percentage),
                amount: money(a.amount),
            })
            .collect(),
    );
    println!("Total allocated: {}", money(allocated_total(allocations)));
}
