//! Time aggregation: daily, weekly and monthly hours, project allocation and
//! overtime.
//!
//! Entries are bucketed by `start_time`. Overtime is measured per entry: an
//! entry longer than the configured threshold contributes its excess. Hours
//! spread over several entries on one day never count as overtime.

use super::overview::HourTotals;
use super::period::{date_key, date_of, iso_week_key, month_key, percent, ratio};
use super::Snapshot;
use crate::config::AnalyticsConfig;
use crate::types::{round2, TimeEntry};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Time analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAnalytics {
    pub total_hours: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
    /// Ascending by date
    pub daily_hours: Vec<DailyHours>,
    /// Ascending by ISO week
    pub weekly_trends: Vec<WeeklyTrend>,
    /// Ascending by month
    pub monthly_breakdown: Vec<MonthlyTime>,
    pub project_allocation: Vec<ProjectAllocation>,
    pub overtime: OvertimeAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHours {
    /// "YYYY-MM-DD"
    pub date: String,
    pub total_hours: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrend {
    /// "YYYY-Www"
    pub week: String,
    pub hours: f64,
    pub revenue: f64,
    /// Revenue per tracked hour
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTime {
    /// "YYYY-MM"
    pub month: String,
    pub total_hours: f64,
    pub billable_hours: f64,
    pub overtime_hours: f64,
    /// Distinct dates with at least one entry
    pub active_days: usize,
    pub average_daily_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAllocation {
    pub project_id: String,
    pub title: String,
    /// The project's estimated hours
    pub allocated_hours: f64,
    pub actual_hours: f64,
    /// actual - allocated
    pub variance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeAnalysis {
    pub total_overtime_hours: f64,
    pub overtime_percentage: f64,
    /// Overtime hours at the configured placeholder rate
    pub estimated_cost: f64,
    pub entries_over_threshold: usize,
    /// Largest positive variance first
    pub top_variance_projects: Vec<ProjectAllocation>,
}

/// Hours beyond `threshold_hours` in a single entry.
pub fn entry_overtime(entry: &TimeEntry, threshold_hours: f64) -> f64 {
    (entry.hours() - threshold_hours).max(0.0)
}

#[derive(Default)]
struct MonthAcc {
    hours: HourTotals,
    overtime: f64,
    days: BTreeSet<NaiveDate>,
}

fn daily_hours(entries: &[TimeEntry]) -> Vec<DailyHours> {
    let mut days: BTreeMap<String, HourTotals> = BTreeMap::new();
    for entry in entries {
        days.entry(date_key(entry.start_time)).or_default().add(entry);
    }
    days.into_iter()
        .map(|(date, hours)| DailyHours {
            date,
            total_hours: round2(hours.total_hours()),
            billable_hours: round2(hours.billable_hours()),
            non_billable_hours: round2(hours.non_billable_hours()),
        })
        .collect()
}

fn weekly_trends(entries: &[TimeEntry]) -> Vec<WeeklyTrend> {
    let mut weeks: BTreeMap<String, (HourTotals, f64)> = BTreeMap::new();
    for entry in entries {
        let slot = weeks.entry(iso_week_key(entry.start_time)).or_default();
        slot.0.add(entry);
        slot.1 += entry.revenue();
    }
    weeks
        .into_iter()
        .map(|(week, (hours, revenue))| WeeklyTrend {
            week,
            hours: round2(hours.total_hours()),
            revenue: round2(revenue),
            efficiency: round2(ratio(revenue, hours.total_hours())),
        })
        .collect()
}

fn monthly_breakdown(entries: &[TimeEntry], threshold_hours: f64) -> Vec<MonthlyTime> {
    let mut months: BTreeMap<String, MonthAcc> = BTreeMap::new();
    for entry in entries {
        let acc = months.entry(month_key(entry.start_time)).or_default();
        acc.hours.add(entry);
        acc.overtime += entry_overtime(entry, threshold_hours);
        acc.days.insert(date_of(entry.start_time));
    }
    months
        .into_iter()
        .map(|(month, acc)| MonthlyTime {
            month,
            total_hours: round2(acc.hours.total_hours()),
            billable_hours: round2(acc.hours.billable_hours()),
            overtime_hours: round2(acc.overtime),
            active_days: acc.days.len(),
            average_daily_hours: round2(ratio(acc.hours.total_hours(), acc.days.len() as f64)),
        })
        .collect()
}

fn project_allocation(snapshot: &Snapshot) -> Vec<ProjectAllocation> {
    let mut minutes: HashMap<&str, u64> = HashMap::new();
    for entry in &snapshot.time_entries {
        *minutes.entry(entry.project_id.as_str()).or_default() += entry.duration as u64;
    }
    snapshot
        .projects
        .iter()
        .map(|project| {
            let actual = minutes.get(project.id.as_str()).copied().unwrap_or(0) as f64 / 60.0;
            ProjectAllocation {
                project_id: project.id.clone(),
                title: project.title.clone(),
                allocated_hours: round2(project.estimated_hours),
                actual_hours: round2(actual),
                variance: round2(actual - project.estimated_hours),
            }
        })
        .collect()
}

pub fn compute(snapshot: &Snapshot, config: &AnalyticsConfig) -> TimeAnalytics {
    let entries = &snapshot.time_entries;
    let threshold = config.overtime_threshold_hours;
    let hours = HourTotals::of(entries);

    let over: Vec<f64> = entries
        .iter()
        .map(|e| entry_overtime(e, threshold))
        .filter(|h| *h > 0.0)
        .collect();
    let total_overtime: f64 = over.iter().sum();

    let project_allocation = project_allocation(snapshot);
    let mut top_variance_projects: Vec<ProjectAllocation> = project_allocation
        .iter()
        .filter(|p| p.variance > 0.0)
        .cloned()
        .collect();
    top_variance_projects.sort_by(|a, b| b.variance.total_cmp(&a.variance));
    top_variance_projects.truncate(config.top_projects_count);

    TimeAnalytics {
        total_hours: round2(hours.total_hours()),
        billable_hours: round2(hours.billable_hours()),
        non_billable_hours: round2(hours.non_billable_hours()),
        daily_hours: daily_hours(entries),
        weekly_trends: weekly_trends(entries),
        monthly_breakdown: monthly_breakdown(entries, threshold),
        project_allocation,
        overtime: OvertimeAnalysis {
            total_overtime_hours: round2(total_overtime),
            overtime_percentage: round2(percent(total_overtime, hours.total_hours())),
            estimated_cost: round2(total_overtime * config.overtime_cost_rate),
            entries_over_threshold: over.len(),
            top_variance_projects,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::*;
    use crate::types::ProjectStatus;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_hours_split_sums_to_total() {
        let snapshot = Snapshot {
            time_entries: vec![
                entry("e1", "t1", "p1", 7, true, 10.0),
                entry("e2", "t1", "p1", 11, false, 0.0),
                entry("e3", "t1", "p1", 13, true, 10.0),
                entry("e4", "t1", "p1", 1, false, 0.0),
            ],
            ..Default::default()
        };
        let time = compute(&snapshot, &AnalyticsConfig::default());
        let sum = time.billable_hours + time.non_billable_hours;
        assert!((time.total_hours - sum).abs() <= 0.01);
        for day in &time.daily_hours {
            assert!((day.total_hours - (day.billable_hours + day.non_billable_hours)).abs() <= 0.01);
        }
    }

    #[test]
    fn test_daily_grouping_by_start_date() {
        let snapshot = Snapshot {
            time_entries: vec![
                at(entry("e1", "t1", "p1", 60, true, 10.0), ts(2024, 3, 5)),
                at(entry("e2", "t1", "p1", 30, false, 0.0), ts(2024, 3, 4)),
                at(entry("e3", "t1", "p1", 90, true, 10.0), ts(2024, 3, 5)),
            ],
            ..Default::default()
        };
        let time = compute(&snapshot, &AnalyticsConfig::default());
        let days: Vec<(&str, f64)> = time
            .daily_hours
            .iter()
            .map(|d| (d.date.as_str(), d.total_hours))
            .collect();
        assert_eq!(days, vec![("2024-03-04", 0.5), ("2024-03-05", 2.5)]);
    }

    #[test]
    fn test_weekly_trends_use_iso_weeks() {
        let new_year = Utc.with_ymd_and_hms(2021, 1, 1, 10, 0, 0).unwrap();
        let snapshot = Snapshot {
            time_entries: vec![
                at(entry("e1", "t1", "p1", 120, true, 50.0), new_year),
                at(entry("e2", "t1", "p1", 120, false, 0.0), ts(2021, 1, 4)),
            ],
            ..Default::default()
        };
        let time = compute(&snapshot, &AnalyticsConfig::default());
        assert_eq!(time.weekly_trends.len(), 2);
        assert_eq!(time.weekly_trends[0].week, "2020-W53");
        assert_eq!(time.weekly_trends[0].efficiency, 50.0);
        assert_eq!(time.weekly_trends[1].week, "2021-W01");
        assert_eq!(time.weekly_trends[1].efficiency, 0.0);
    }

    #[test]
    fn test_overtime_is_per_entry() {
        let snapshot = Snapshot {
            time_entries: vec![
                // 10h entry: 2h overtime
                entry("e1", "t1", "p1", 600, true, 100.0),
                // two 5h entries on the same day: no overtime
                entry("e2", "t1", "p1", 300, true, 100.0),
                entry("e3", "t1", "p1", 300, true, 100.0),
            ],
            ..Default::default()
        };
        let time = compute(&snapshot, &AnalyticsConfig::default());
        assert_eq!(time.overtime.total_overtime_hours, 2.0);
        assert_eq!(time.overtime.entries_over_threshold, 1);
        assert_eq!(time.overtime.estimated_cost, 150.0);
        assert_eq!(time.overtime.overtime_percentage, 10.0);

        let month = &time.monthly_breakdown[0];
        assert_eq!(month.month, "2024-03");
        assert_eq!(month.overtime_hours, 2.0);
        assert_eq!(month.active_days, 1);
        assert_eq!(month.average_daily_hours, 20.0);
    }

    #[test]
    fn test_average_daily_hours_over_active_days() {
        let snapshot = Snapshot {
            time_entries: vec![
                at(entry("e1", "t1", "p1", 240, true, 10.0), ts(2024, 3, 4)),
                at(entry("e2", "t1", "p1", 120, true, 10.0), ts(2024, 3, 6)),
            ],
            ..Default::default()
        };
        let time = compute(&snapshot, &AnalyticsConfig::default());
        assert_eq!(time.monthly_breakdown[0].active_days, 2);
        assert_eq!(time.monthly_breakdown[0].average_daily_hours, 3.0);
    }

    #[test]
    fn test_allocation_and_top_variance() {
        let mut p1 = project("p1", "c1", ProjectStatus::Active);
        p1.estimated_hours = 1.0;
        let mut p2 = project("p2", "c1", ProjectStatus::Active);
        p2.estimated_hours = 10.0;
        let mut p3 = project("p3", "c1", ProjectStatus::Active);
        p3.estimated_hours = 0.5;
        let snapshot = Snapshot {
            projects: vec![p1, p2, p3],
            time_entries: vec![
                entry("e1", "t1", "p1", 180, true, 10.0),
                entry("e2", "t2", "p2", 60, true, 10.0),
                entry("e3", "t3", "p3", 60, true, 10.0),
            ],
            ..Default::default()
        };
        let time = compute(&snapshot, &AnalyticsConfig::default());
        assert_eq!(time.project_allocation[0].variance, 2.0);
        assert_eq!(time.project_allocation[1].variance, -9.0);

        let top: Vec<&str> = time
            .overtime
            .top_variance_projects
            .iter()
            .map(|p| p.project_id.as_str())
            .collect();
        assert_eq!(top, vec!["p1", "p3"]);
    }

    #[test]
    fn test_empty() {
        let time = compute(&Snapshot::default(), &AnalyticsConfig::default());
        assert_eq!(time, TimeAnalytics::default());
    }
}
