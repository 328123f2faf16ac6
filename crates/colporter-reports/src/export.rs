//! CSV and printable HTML exports
//!
//! Writers are generic over `io::Write` so callers decide where the bytes
//! go (a file, stdout, an in-memory buffer).

use csv::{Writer, WriterBuilder};
use std::io;

use crate::bucketing::{MonthBucket, WeekBucket};
use crate::constants::DATE_FORMAT;
use crate::error::Result;
use crate::individual::{IndividualReport, WeekGroup};
use crate::model::{BookSize, Charge};
use crate::summary::PersonTotals;

/// Normalize -0.0 to 0.0 for cleaner output
pub fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}

/// Two-decimal amount without a currency sign
pub fn money(val: f64) -> String {
    format!("{:.2}", normalize_zero(val))
}

// =============================================================================
// CSV
// =============================================================================

/// Individual earnings report: header block, daily rows grouped by week with
/// a total row after each week, charges, then summary rows.
pub fn write_individual_csv<W: io::Write>(
    writer: W,
    report: &IndividualReport,
    person_name: &str,
) -> Result<()> {
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);

    wtr.write_record(["Person", person_name, &report.person_type.to_string()])?;
    wtr.write_record([
        "Period",
        &report.start_date.format(DATE_FORMAT).to_string(),
        &report.end_date.format(DATE_FORMAT).to_string(),
    ])?;
    wtr.write_record(["Date", "Day", "Amount"])?;

    for week in report.weeks() {
        for day in &week.days {
            wtr.write_record([
                &day.date.format(DATE_FORMAT).to_string(),
                &day.day_name,
                &money(day.amount),
            ])?;
        }
        wtr.write_record(["Week total", &week.week_label, &money(week.week_total)])?;
    }

    for charge in &report.charges {
        wtr.write_record([
            &charge.date.format(DATE_FORMAT).to_string(),
            &format!("Charge: {}", charge.category),
            &money(charge.amount),
        ])?;
    }

    wtr.write_record(["Total earnings", "", &money(report.total_earnings)])?;
    wtr.write_record(["Percentage", "", &format!("{:.2}", report.percentage)])?;
    wtr.write_record(["Scaled earnings", "", &money(report.scaled_earnings)])?;
    wtr.write_record(["Charges", "", &money(report.total_charges)])?;
    wtr.write_record(["Net amount", "", &money(report.net_amount)])?;

    wtr.flush()?;
    Ok(())
}

/// One row per day of each week bucket, with book counts by size
pub fn write_weekly_csv<W: io::Write>(writer: W, weeks: &[WeekBucket]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record(["Week", "Date", "Sales", "Large_Books", "Small_Books"])?;
    for week in weeks {
        let label = week.label();
        for date in week.dates() {
            wtr.write_record([
                &label,
                &date.format(DATE_FORMAT).to_string(),
                &money(week.sales_on(date)),
                &week.books_on(date, BookSize::Large).to_string(),
                &week.books_on(date, BookSize::Small).to_string(),
            ])?;
        }
        wtr.write_record([
            label.as_str(),
            "Total",
            &money(week.total_sales()),
            &week.book_count(BookSize::Large).to_string(),
            &week.book_count(BookSize::Small).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_monthly_csv<W: io::Write>(writer: W, months: &[MonthBucket]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record([
        "Month",
        "Sales",
        "Large_Books",
        "Small_Books",
        "Hours",
        "Days_Worked",
        "Daily_Average",
    ])?;
    for month in months {
        wtr.write_record([
            &month.label,
            &money(month.sales),
            &month.large_books.to_string(),
            &month.small_books.to_string(),
            &format!("{:.1}", month.hours),
            &month.days_worked.to_string(),
            &money(month.daily_average()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_person_totals_csv<W: io::Write>(writer: W, rows: &[PersonTotals]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record([
        "Id",
        "Name",
        "Role",
        "Sales",
        "Hours",
        "Large_Books",
        "Small_Books",
        "Days_Worked",
        "Percentage",
        "Earnings",
        "Charges",
        "Advances",
        "Net",
    ])?;
    for row in rows {
        wtr.write_record([
            &row.person_id,
            &row.name,
            &row.person_type.to_string(),
            &money(row.sales),
            &format!("{:.1}", row.hours),
            &row.large_books.to_string(),
            &row.small_books.to_string(),
            &row.days_worked.to_string(),
            &format!("{:.2}", row.percentage),
            &money(row.earnings),
            &money(row.charges),
            &money(row.advances),
            &money(row.net),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

// =============================================================================
// HTML
// =============================================================================

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const PRINT_STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;width:100%;margin-bottom:1.5em}\
th,td{border:1px solid #999;padding:4px 8px;text-align:left}\
td.amount,th.amount{text-align:right}\
tr.total td{font-weight:bold}";

fn week_table(week: &WeekGroup) -> String {
    let rows: String = week
        .days
        .iter()
        .map(|day| {
            format!(
                "<tr><td>{}</td><td>{}</td><td class=\"amount\">${}</td></tr>\n",
                day.date.format(DATE_FORMAT),
                escape_html(&day.day_name),
                money(day.amount)
            )
        })
        .collect();

    format!(
        "<h2>{}</h2>\n<table>\n\
         <tr><th>Date</th><th>Day</th><th class=\"amount\">Amount</th></tr>\n\
         {rows}\
         <tr class=\"total\"><td colspan=\"2\">Week total</td>\
         <td class=\"amount\">${}</td></tr>\n</table>\n",
        escape_html(&week.week_label),
        money(week.week_total)
    )
}

fn charges_table(charges: &[Charge]) -> String {
    if charges.is_empty() {
        return String::new();
    }

    let rows: String = charges
        .iter()
        .map(|charge| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"amount\">${}</td></tr>\n",
                charge.date.format(DATE_FORMAT),
                escape_html(&charge.category),
                escape_html(charge.description.as_deref().unwrap_or("")),
                money(charge.amount)
            )
        })
        .collect();

    format!(
        "<h2>Charges</h2>\n<table>\n\
         <tr><th>Date</th><th>Category</th><th>Description</th>\
         <th class=\"amount\">Amount</th></tr>\n\
         {rows}</table>\n"
    )
}

/// Standalone printable page for an individual report
pub fn individual_html(report: &IndividualReport, person_name: &str) -> String {
    let name = escape_html(person_name);
    let start = report.start_date.format(DATE_FORMAT);
    let end = report.end_date.format(DATE_FORMAT);

    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{name} {start} - {end}</title>\n<style>{PRINT_STYLE}</style>\n</head>\n<body>\n\
         <h1>{name}</h1>\n<p>{role} &middot; {start} - {end}</p>\n",
        role = report.person_type,
    );

    for week in report.weeks() {
        html.push_str(&week_table(&week));
    }
    html.push_str(&charges_table(&report.charges));
    html.push_str(&format!(
        "<h2>Summary</h2>\n<table>\n\
         <tr><td>Total earnings</td><td class=\"amount\">${}</td></tr>\n\
         <tr><td>Percentage</td><td class=\"amount\">{:.2}%</td></tr>\n\
         <tr><td>Scaled earnings</td><td class=\"amount\">${}</td></tr>\n\
         <tr><td>Charges</td><td class=\"amount\">${}</td></tr>\n\
         <tr class=\"total\"><td>Net amount</td><td class=\"amount\">${}</td></tr>\n\
         </table>\n</body>\n</html>\n",
        money(report.total_earnings),
        report.percentage,
        money(report.scaled_earnings),
        money(report.total_charges),
        money(report.net_amount),
    ));

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucketing::{bucket_by_month, bucket_by_week};
    use crate::individual::{IndividualReportRequest, build_individual_report};
    use crate::model::{
        BookLine, ChargeStatus, PercentageConfig, PersonType, ReviewStatus, Transaction,
    };
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn tx(day: u32, total: f64) -> Transaction {
        Transaction {
            id: format!("t{}", day),
            date: date(day),
            student_id: "c1".to_string(),
            leader_id: Some("l1".to_string()),
            total,
            status: ReviewStatus::Approved,
            books: vec![BookLine {
                size: BookSize::Small,
                quantity: 3,
                price: 5.0,
                title: "Steps to Christ".to_string(),
            }],
            hours_worked: 4.0,
            cash: total,
            checks: 0.0,
            atm_mobile: 0.0,
            paypal: 0.0,
        }
    }

    fn report() -> IndividualReport {
        let request = IndividualReportRequest {
            person_id: "c1".to_string(),
            person_type: PersonType::Colporter,
            start_date: date(7),
            end_date: date(10),
        };
        let charges = vec![Charge {
            id: "ch".to_string(),
            person_id: "c1".to_string(),
            amount: 20.0,
            status: ChargeStatus::Applied,
            category: "FINE".to_string(),
            date: date(9),
            description: Some("Late <report>".to_string()),
        }];
        build_individual_report(
            &request,
            &[tx(7, 40.0), tx(8, 60.0), tx(9, 100.0)],
            &charges,
            &PercentageConfig::default(),
            &[],
        )
        .unwrap()
    }

    fn to_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_individual_csv_has_week_totals_and_summary() {
        let mut buf = Vec::new();
        write_individual_csv(&mut buf, &report(), "Ana Lopez").unwrap();
        let out = to_string(buf);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Person,Ana Lopez,Colporter");
        assert_eq!(lines[1], "Period,2025-06-07,2025-06-10");
        assert_eq!(lines[2], "Date,Day,Amount");
        assert_eq!(lines[3], "2025-06-07,Saturday,40.00");
        assert!(out.contains("Week total,2025-06-02 - 2025-06-08,100.00"));
        assert!(out.contains("Week total,2025-06-09 - 2025-06-15,100.00"));
        assert!(out.contains("2025-06-09,Charge: FINE,20.00"));
        assert!(out.contains("Scaled earnings,,100.00"));
        assert!(out.ends_with("Net amount,,80.00\n"));
    }

    #[test]
    fn test_weekly_csv_rows() {
        let weeks = bucket_by_week(&[tx(2, 10.0), tx(3, 15.5)]);
        let mut buf = Vec::new();
        write_weekly_csv(&mut buf, &weeks).unwrap();
        let out = to_string(buf);

        assert!(out.starts_with("Week,Date,Sales,Large_Books,Small_Books\n"));
        assert!(out.contains("2025-06-02 - 2025-06-08,2025-06-03,15.50,0,3"));
        assert!(out.contains("2025-06-02 - 2025-06-08,Total,25.50,0,6"));
    }

    #[test]
    fn test_person_totals_csv_quotes_names_with_commas() {
        let rows = vec![PersonTotals {
            person_id: "c1".to_string(),
            name: "Lopez, Ana".to_string(),
            person_type: PersonType::Colporter,
            sales: 100.0,
            hours: 8.0,
            large_books: 1,
            small_books: 2,
            days_worked: 1,
            percentage: 50.0,
            earnings: 50.0,
            charges: 0.0,
            advances: 10.0,
            net: 40.0,
        }];
        let mut buf = Vec::new();
        write_person_totals_csv(&mut buf, &rows).unwrap();
        let out = to_string(buf);

        assert!(out.contains(
            "c1,\"Lopez, Ana\",Colporter,100.00,8.0,1,2,1,50.00,50.00,0.00,10.00,40.00"
        ));
    }

    #[test]
    fn test_monthly_csv_counts_distinct_days() {
        let months = bucket_by_month(&[tx(2, 10.0), tx(2, 20.0), tx(3, 30.0)]);
        let mut buf = Vec::new();
        write_monthly_csv(&mut buf, &months).unwrap();
        let out = to_string(buf);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines[0],
            "Month,Sales,Large_Books,Small_Books,Hours,Days_Worked,Daily_Average"
        );
        assert_eq!(lines[1], "June 2025,60.00,0,9,12.0,2,30.00");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_normalize_negative_zero() {
        assert_eq!(money(-0.0), "0.00");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_individual_html_escapes_user_text() {
        let html = individual_html(&report(), "<script>alert(1)</script>");

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Late &lt;report&gt;"));
        assert!(html.contains("2025-06-02 - 2025-06-08"));
        assert!(html.contains("$80.00"));
    }
}
