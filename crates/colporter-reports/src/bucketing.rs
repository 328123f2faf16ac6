//! Weekly and monthly bucketing of approved transactions
//!
//! Weeks start on Monday. The Monday of a date's week is found with the
//! offset `(dow == 0 ? -6 : 1) - dow`, counting days from Sunday = 0; the
//! week ends six days later.

use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::constants;
use crate::model::{BookLine, BookSize, PersonType, Transaction};

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let dow = date.weekday().num_days_from_sunday() as i64;
    let offset = if dow == 0 { -6 } else { 1 - dow };
    date + TimeDelta::days(offset)
}

/// Sunday of the week containing `date`
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + TimeDelta::days(6)
}

/// Book quantities by title, split by size
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BookTally {
    pub large: BTreeMap<String, u32>,
    pub small: BTreeMap<String, u32>,
}

impl BookTally {
    pub fn add(&mut self, line: &BookLine) {
        let titles = match line.size {
            BookSize::Large => &mut self.large,
            BookSize::Small => &mut self.small,
        };
        *titles.entry(line.title.clone()).or_insert(0) += line.quantity;
    }

    pub fn count(&self, size: BookSize) -> u32 {
        match size {
            BookSize::Large => self.large.values().sum(),
            BookSize::Small => self.small.values().sum(),
        }
    }

    pub fn total(&self) -> u32 {
        self.count(BookSize::Large) + self.count(BookSize::Small)
    }
}

/// Sales and books of one Monday-to-Sunday week
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekBucket {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sales: BTreeMap<NaiveDate, f64>,
    pub books: BTreeMap<NaiveDate, BookTally>,
    pub hours: f64,
    pub transaction_count: usize,
}

impl WeekBucket {
    fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date: start_date + TimeDelta::days(6),
            sales: BTreeMap::new(),
            books: BTreeMap::new(),
            hours: 0.0,
            transaction_count: 0,
        }
    }

    fn add(&mut self, tx: &Transaction) {
        *self.sales.entry(tx.date).or_insert(0.0) += tx.total;
        let tally = self.books.entry(tx.date).or_default();
        for line in &tx.books {
            tally.add(line);
        }
        self.hours += tx.hours_worked;
        self.transaction_count += 1;
    }

    /// The seven dates of the week, Monday first
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..7)
            .map(|i| self.start_date + TimeDelta::days(i))
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn sales_on(&self, date: NaiveDate) -> f64 {
        self.sales.get(&date).copied().unwrap_or(0.0)
    }

    pub fn books_on(&self, date: NaiveDate, size: BookSize) -> u32 {
        self.books.get(&date).map(|t| t.count(size)).unwrap_or(0)
    }

    pub fn total_sales(&self) -> f64 {
        self.sales.values().sum()
    }

    pub fn book_count(&self, size: BookSize) -> u32 {
        self.books.values().map(|t| t.count(size)).sum()
    }

    pub fn total_books(&self) -> u32 {
        self.books.values().map(BookTally::total).sum()
    }

    /// Titles sold during the week with cumulative quantities
    pub fn titles(&self, size: BookSize) -> BTreeMap<String, u32> {
        let mut titles = BTreeMap::new();
        for tally in self.books.values() {
            let source = match size {
                BookSize::Large => &tally.large,
                BookSize::Small => &tally.small,
            };
            for (title, qty) in source {
                *titles.entry(title.clone()).or_insert(0) += qty;
            }
        }
        titles
    }

    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start_date.format(constants::DATE_FORMAT),
            self.end_date.format(constants::DATE_FORMAT)
        )
    }
}

/// Group approved transactions into Monday-start weeks, oldest first
pub fn bucket_by_week(transactions: &[Transaction]) -> Vec<WeekBucket> {
    let mut weeks: BTreeMap<NaiveDate, WeekBucket> = BTreeMap::new();

    for tx in transactions.iter().filter(|t| t.is_approved()) {
        let start = week_start(tx.date);
        weeks
            .entry(start)
            .or_insert_with(|| WeekBucket::new(start))
            .add(tx);
    }

    weeks.into_values().collect()
}

/// Week shown by single-week reports: the latest week present in the data,
/// which is not necessarily the current calendar week.
pub fn current_week(buckets: &[WeekBucket]) -> Option<&WeekBucket> {
    buckets.iter().max_by_key(|b| b.end_date)
}

/// Totals over a set of transactions or buckets
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct Totals {
    pub sales: f64,
    pub large_books: u32,
    pub small_books: u32,
    pub hours: f64,
    pub transaction_count: usize,
}

impl Totals {
    pub fn total_books(&self) -> u32 {
        self.large_books + self.small_books
    }
}

/// Totals computed straight from the flat list (approved only)
pub fn flat_totals(transactions: &[Transaction]) -> Totals {
    transactions
        .iter()
        .filter(|t| t.is_approved())
        .fold(Totals::default(), |mut acc, tx| {
            acc.sales += tx.total;
            acc.large_books += tx.books_of_size(BookSize::Large);
            acc.small_books += tx.books_of_size(BookSize::Small);
            acc.hours += tx.hours_worked;
            acc.transaction_count += 1;
            acc
        })
}

/// Totals summed over week buckets; matches [`flat_totals`] for the same input
pub fn bucket_totals(buckets: &[WeekBucket]) -> Totals {
    buckets.iter().fold(Totals::default(), |mut acc, week| {
        acc.sales += week.total_sales();
        acc.large_books += week.book_count(BookSize::Large);
        acc.small_books += week.book_count(BookSize::Small);
        acc.hours += week.hours;
        acc.transaction_count += week.transaction_count;
        acc
    })
}

/// Sales and activity of one calendar month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthBucket {
    /// e.g. "June 2025"
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub sales: f64,
    pub large_books: u32,
    pub small_books: u32,
    pub hours: f64,
    pub transaction_count: usize,
    /// Distinct dates with at least one transaction
    pub days_worked: usize,
}

impl MonthBucket {
    pub fn total_books(&self) -> u32 {
        self.large_books + self.small_books
    }

    pub fn daily_average(&self) -> f64 {
        if self.days_worked == 0 {
            0.0
        } else {
            self.sales / self.days_worked as f64
        }
    }
}

/// Group approved transactions by calendar month, oldest first.
///
/// A day with several transactions counts once towards `days_worked`.
pub fn bucket_by_month(transactions: &[Transaction]) -> Vec<MonthBucket> {
    let mut months: BTreeMap<(i32, u32), (MonthBucket, BTreeSet<NaiveDate>)> = BTreeMap::new();

    for tx in transactions.iter().filter(|t| t.is_approved()) {
        let key = (tx.date.year(), tx.date.month());
        let (bucket, days) = months.entry(key).or_insert_with(|| {
            (
                MonthBucket {
                    label: tx.date.format(constants::MONTH_LABEL_FORMAT).to_string(),
                    year: key.0,
                    month: key.1,
                    sales: 0.0,
                    large_books: 0,
                    small_books: 0,
                    hours: 0.0,
                    transaction_count: 0,
                    days_worked: 0,
                },
                BTreeSet::new(),
            )
        });

        bucket.sales += tx.total;
        bucket.large_books += tx.books_of_size(BookSize::Large);
        bucket.small_books += tx.books_of_size(BookSize::Small);
        bucket.hours += tx.hours_worked;
        bucket.transaction_count += 1;
        if days.insert(tx.date) {
            bucket.days_worked += 1;
        }
    }

    months.into_values().map(|(bucket, _)| bucket).collect()
}

/// Transactions attributed to one person (by student for colporters, by leader for leaders)
pub fn for_person(
    transactions: &[Transaction],
    person_id: &str,
    person_type: PersonType,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.belongs_to(person_id, person_type))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReviewStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(day: NaiveDate, total: f64, status: ReviewStatus) -> Transaction {
        Transaction {
            id: format!("t-{}", day),
            date: day,
            student_id: "c1".to_string(),
            leader_id: Some("l1".to_string()),
            total,
            status,
            books: Vec::new(),
            hours_worked: 8.0,
            cash: total,
            checks: 0.0,
            atm_mobile: 0.0,
            paypal: 0.0,
        }
    }

    fn book(size: BookSize, quantity: u32, title: &str) -> BookLine {
        BookLine {
            size,
            quantity,
            price: 10.0,
            title: title.to_string(),
        }
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2025-06-02 is a Monday
        assert_eq!(week_start(date(2025, 6, 2)), date(2025, 6, 2));
        assert_eq!(week_start(date(2025, 6, 4)), date(2025, 6, 2));
        // Sunday belongs to the week that started six days earlier
        assert_eq!(week_start(date(2025, 6, 8)), date(2025, 6, 2));
        assert_eq!(week_end(date(2025, 6, 8)), date(2025, 6, 8));
        assert_eq!(week_start(date(2025, 6, 9)), date(2025, 6, 9));
    }

    #[test]
    fn test_week_boundary_splits_buckets() {
        let txs = vec![
            tx(date(2025, 6, 8), 50.0, ReviewStatus::Approved),
            tx(date(2025, 6, 9), 100.0, ReviewStatus::Approved),
        ];

        let weeks = bucket_by_week(&txs);

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].start_date, date(2025, 6, 2));
        assert_eq!(weeks[0].total_sales(), 50.0);
        assert_eq!(weeks[1].start_date, date(2025, 6, 9));
        assert_eq!(weeks[1].end_date, date(2025, 6, 15));
        assert_eq!(weeks[1].total_sales(), 100.0);
    }

    #[test]
    fn test_monday_and_following_sunday_share_a_week() {
        let txs = vec![
            tx(date(2025, 6, 2), 100.0, ReviewStatus::Approved),
            tx(date(2025, 6, 8), 50.0, ReviewStatus::Approved),
        ];

        let weeks = bucket_by_week(&txs);

        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].sales_on(date(2025, 6, 2)), 100.0);
        assert_eq!(weeks[0].sales_on(date(2025, 6, 8)), 50.0);
        assert_eq!(weeks[0].total_sales(), 150.0);
    }

    #[test]
    fn test_unapproved_transactions_are_skipped() {
        let txs = vec![
            tx(date(2025, 6, 3), 100.0, ReviewStatus::Pending),
            tx(date(2025, 6, 3), 20.0, ReviewStatus::Rejected),
        ];

        assert!(bucket_by_week(&txs).is_empty());
        assert_eq!(flat_totals(&txs), Totals::default());
    }

    #[test]
    fn test_books_accumulate_by_date_size_and_title() {
        let mut a = tx(date(2025, 6, 3), 60.0, ReviewStatus::Approved);
        a.books = vec![
            book(BookSize::Large, 2, "Great Controversy"),
            book(BookSize::Small, 3, "Steps to Christ"),
        ];
        let mut b = tx(date(2025, 6, 3), 40.0, ReviewStatus::Approved);
        b.books = vec![book(BookSize::Large, 1, "Great Controversy")];

        let weeks = bucket_by_week(&[a, b]);
        let week = &weeks[0];

        let tally = &week.books[&date(2025, 6, 3)];
        assert_eq!(tally.large["Great Controversy"], 3);
        assert_eq!(tally.small["Steps to Christ"], 3);
        assert_eq!(week.books_on(date(2025, 6, 3), BookSize::Large), 3);
        assert_eq!(week.total_books(), 6);
        assert_eq!(week.titles(BookSize::Large)["Great Controversy"], 3);
        assert_eq!(week.sales_on(date(2025, 6, 3)), 100.0);
        assert_eq!(week.sales_on(date(2025, 6, 4)), 0.0);
    }

    #[test]
    fn test_current_week_is_latest_in_data() {
        let txs = vec![
            tx(date(2025, 7, 15), 10.0, ReviewStatus::Approved),
            tx(date(2025, 6, 3), 10.0, ReviewStatus::Approved),
            tx(date(2025, 6, 25), 10.0, ReviewStatus::Approved),
        ];

        let weeks = bucket_by_week(&txs);
        let current = current_week(&weeks).unwrap();

        assert_eq!(current.start_date, date(2025, 7, 14));
        assert!(current_week(&[]).is_none());
    }

    #[test]
    fn test_bucket_totals_match_flat_totals() {
        let mut txs = Vec::new();
        for (i, day) in (1..=30).enumerate() {
            let mut t = tx(date(2025, 6, day), 10.0 + i as f64, ReviewStatus::Approved);
            t.books = vec![book(BookSize::Small, 1, "Health")];
            txs.push(t);
        }
        txs.push(tx(date(2025, 6, 10), 999.0, ReviewStatus::Pending));

        let weeks = bucket_by_week(&txs);
        let flat = flat_totals(&txs);
        let bucketed = bucket_totals(&weeks);

        assert!((flat.sales - bucketed.sales).abs() < 1e-9);
        assert_eq!(flat.small_books, bucketed.small_books);
        assert_eq!(flat.transaction_count, 30);
        assert_eq!(bucketed.transaction_count, 30);
    }

    #[test]
    fn test_month_buckets_count_days_once() {
        let txs = vec![
            tx(date(2025, 6, 2), 100.0, ReviewStatus::Approved),
            tx(date(2025, 6, 2), 50.0, ReviewStatus::Approved),
            tx(date(2025, 6, 3), 30.0, ReviewStatus::Approved),
            tx(date(2025, 7, 1), 20.0, ReviewStatus::Approved),
        ];

        let months = bucket_by_month(&txs);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].label, "June 2025");
        assert_eq!(months[0].sales, 180.0);
        assert_eq!(months[0].transaction_count, 3);
        assert_eq!(months[0].days_worked, 2);
        assert_eq!(months[0].daily_average(), 90.0);
        assert_eq!(months[1].label, "July 2025");
        assert_eq!(months[1].days_worked, 1);
    }

    #[test]
    fn test_for_person_filters_by_role() {
        let mut other = tx(date(2025, 6, 2), 10.0, ReviewStatus::Approved);
        other.student_id = "c2".to_string();
        other.leader_id = Some("l2".to_string());
        let txs = vec![tx(date(2025, 6, 2), 10.0, ReviewStatus::Approved), other];

        assert_eq!(for_person(&txs, "c1", PersonType::Colporter).len(), 1);
        assert_eq!(for_person(&txs, "l2", PersonType::Leader).len(), 1);
        assert!(for_person(&txs, "c1", PersonType::Leader).is_empty());
    }
}
