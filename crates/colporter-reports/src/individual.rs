//! Individual earnings and charges report for one person over a date range

use chrono::NaiveDate;
use serde::Serialize;

use crate::bucketing::week_start;
use crate::constants;
use crate::error::{ReportError, Result};
use crate::model::{Charge, LeaderPercentage, PercentageConfig, PersonType, Transaction};

/// Who and when the report covers (both dates inclusive)
#[derive(Debug, Clone, PartialEq)]
pub struct IndividualReportRequest {
    pub person_id: String,
    pub person_type: PersonType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl IndividualReportRequest {
    /// Reject requests without a person or with a reversed range
    pub fn validate(&self) -> Result<()> {
        if self.person_id.trim().is_empty() {
            return Err(ReportError::MissingPerson);
        }
        if self.start_date > self.end_date {
            return Err(ReportError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Every calendar date in the range
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|d| *d <= self.end_date)
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Gross sales on one day
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub day_name: String,
    pub amount: f64,
}

/// One Monday-start week of daily entries
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekGroup {
    pub week_label: String,
    pub days: Vec<DailyEntry>,
    pub week_total: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndividualReport {
    pub person_id: String,
    pub person_type: PersonType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Earnings percentage applied to the gross total
    pub percentage: f64,
    pub daily: Vec<DailyEntry>,
    /// Gross, unscaled
    pub total_earnings: f64,
    pub scaled_earnings: f64,
    pub total_charges: f64,
    /// May be negative when charges exceed scaled earnings
    pub net_amount: f64,
    pub charges: Vec<Charge>,
}

impl IndividualReport {
    pub fn weeks(&self) -> Vec<WeekGroup> {
        group_by_week(&self.daily)
    }

    pub fn days_with_sales(&self) -> usize {
        self.daily.iter().filter(|d| d.amount != 0.0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.total_earnings == 0.0 && self.charges.is_empty()
    }
}

/// Build the report for one person.
///
/// The percentage is applied once to the gross sum, not day by day.
pub fn build_individual_report(
    request: &IndividualReportRequest,
    transactions: &[Transaction],
    charges: &[Charge],
    percentages: &PercentageConfig,
    overrides: &[LeaderPercentage],
) -> Result<IndividualReport> {
    request.validate()?;

    let own: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.is_approved() && t.belongs_to(&request.person_id, request.person_type))
        .collect();

    let daily: Vec<DailyEntry> = request
        .dates()
        .into_iter()
        .map(|date| DailyEntry {
            date,
            day_name: date.format("%A").to_string(),
            amount: own.iter().filter(|t| t.date == date).map(|t| t.total).sum(),
        })
        .collect();

    let in_range: Vec<Charge> = charges
        .iter()
        .filter(|c| c.is_applied() && c.person_id == request.person_id && request.contains(c.date))
        .cloned()
        .collect();

    let percentage = percentages.percentage_for(&request.person_id, request.person_type, overrides);
    let total_earnings: f64 = daily.iter().map(|d| d.amount).sum();
    let total_charges: f64 = in_range.iter().map(|c| c.amount).sum();
    let scaled_earnings = total_earnings * (percentage / 100.0);

    Ok(IndividualReport {
        person_id: request.person_id.clone(),
        person_type: request.person_type,
        start_date: request.start_date,
        end_date: request.end_date,
        percentage,
        daily,
        total_earnings,
        scaled_earnings,
        total_charges,
        net_amount: scaled_earnings - total_charges,
        charges: in_range,
    })
}

/// Regroup daily entries into Monday-start weeks, preserving date order
pub fn group_by_week(daily: &[DailyEntry]) -> Vec<WeekGroup> {
    let mut weeks: Vec<(NaiveDate, WeekGroup)> = Vec::new();

    for entry in daily {
        let start = week_start(entry.date);
        let idx = match weeks.iter().position(|(s, _)| *s == start) {
            Some(idx) => idx,
            None => {
                let end = start + chrono::TimeDelta::days(6);
                weeks.push((
                    start,
                    WeekGroup {
                        week_label: format!(
                            "{} - {}",
                            start.format(constants::DATE_FORMAT),
                            end.format(constants::DATE_FORMAT)
                        ),
                        days: Vec::new(),
                        week_total: 0.0,
                    },
                ));
                weeks.len() - 1
            }
        };
        let group = &mut weeks[idx].1;
        group.week_total += entry.amount;
        group.days.push(entry.clone());
    }

    weeks.sort_by_key(|(start, _)| *start);
    weeks.into_iter().map(|(_, group)| group).collect()
}
