//! Month-over-month trends and seasonal quarters.
//!
//! Growth is measured against the previous month *present* in the series,
//! not the previous calendar month, so a gap month is skipped over.

use super::overview::HourTotals;
use super::period::{month_key, percent_change, quarter_of, ratio};
use super::Snapshot;
use crate::config::AnalyticsConfig;
use crate::types::{round2, TimeEntry};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Trend analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalytics {
    /// Billable revenue per month
    pub revenue_trend: Vec<TrendPoint>,
    /// Cumulative client count per month
    pub client_growth: Vec<TrendPoint>,
    /// Projects created per month
    pub project_volume: Vec<TrendPoint>,
    pub productivity_trend: Vec<ProductivityPoint>,
    /// Always Q1 through Q4
    pub seasonal_patterns: Vec<SeasonalPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// "YYYY-MM"
    pub period: String,
    pub value: f64,
    /// Percent change vs the preceding point; 0 for the first
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityPoint {
    pub month: String,
    pub entries: usize,
    pub average_hours_per_entry: f64,
    /// Revenue per tracked hour
    pub efficiency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Peak,
    Normal,
    Low,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Peak => "peak",
            Season::Normal => "normal",
            Season::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalPattern {
    /// "Q1".."Q4"
    pub quarter: String,
    pub revenue: f64,
    pub project_volume: usize,
    pub pattern: Season,
}

/// Attach growth to an ascending series of (period, value).
pub fn with_growth(series: impl IntoIterator<Item = (String, f64)>) -> Vec<TrendPoint> {
    let mut previous: Option<f64> = None;
    series
        .into_iter()
        .map(|(period, value)| {
            let growth = previous.map_or(0.0, |prev| percent_change(value, prev));
            previous = Some(value);
            TrendPoint {
                period,
                value: round2(value),
                growth: round2(growth),
            }
        })
        .collect()
}

/// Classify quarterly revenue against the mean quarter (total / 4).
pub fn classify_quarters(revenue: [f64; 4], config: &AnalyticsConfig) -> [Season; 4] {
    let mean = revenue.iter().sum::<f64>() / 4.0;
    revenue.map(|value| {
        if value > mean * config.seasonal_peak_ratio {
            Season::Peak
        } else if value < mean * config.seasonal_low_ratio {
            Season::Low
        } else {
            Season::Normal
        }
    })
}

fn count_by_month(dates: impl Iterator<Item = DateTime<Utc>>) -> BTreeMap<String, usize> {
    let mut months = BTreeMap::new();
    for ts in dates {
        *months.entry(month_key(ts)).or_default() += 1;
    }
    months
}

fn productivity_trend(entries: &[TimeEntry]) -> Vec<ProductivityPoint> {
    let mut months: BTreeMap<String, (usize, HourTotals, f64)> = BTreeMap::new();
    for entry in entries {
        let slot = months.entry(month_key(entry.created_at)).or_default();
        slot.0 += 1;
        slot.1.add(entry);
        slot.2 += entry.revenue();
    }
    months
        .into_iter()
        .map(|(month, (count, hours, revenue))| ProductivityPoint {
            month,
            entries: count,
            average_hours_per_entry: round2(ratio(hours.total_hours(), count as f64)),
            efficiency: round2(ratio(revenue, hours.total_hours())),
        })
        .collect()
}

pub fn compute(snapshot: &Snapshot, config: &AnalyticsConfig) -> TrendAnalytics {
    let entries = &snapshot.time_entries;

    let mut revenue_by_month: BTreeMap<String, f64> = BTreeMap::new();
    for entry in entries {
        *revenue_by_month.entry(month_key(entry.created_at)).or_default() += entry.revenue();
    }

    let mut cumulative = 0usize;
    let client_growth = with_growth(
        count_by_month(snapshot.clients.iter().map(|c| c.created_at))
            .into_iter()
            .map(|(month, added)| {
                cumulative += added;
                (month, cumulative as f64)
            }),
    );

    let project_volume = with_growth(
        count_by_month(snapshot.projects.iter().map(|p| p.created_at))
            .into_iter()
            .map(|(month, count)| (month, count as f64)),
    );

    let mut quarter_revenue = [0.0f64; 4];
    let mut quarter_projects = [0usize; 4];
    for entry in entries {
        quarter_revenue[quarter_of(entry.created_at.month()) as usize - 1] += entry.revenue();
    }
    for project in &snapshot.projects {
        quarter_projects[quarter_of(project.created_at.month()) as usize - 1] += 1;
    }
    let seasons = classify_quarters(quarter_revenue, config);

    TrendAnalytics {
        revenue_trend: with_growth(revenue_by_month),
        client_growth,
        project_volume,
        productivity_trend: productivity_trend(entries),
        seasonal_patterns: (0..4)
            .map(|q| SeasonalPattern {
                quarter: format!("Q{}", q + 1),
                revenue: round2(quarter_revenue[q]),
                project_volume: quarter_projects[q],
                pattern: seasons[q],
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::*;
    use crate::types::ProjectStatus;

    #[test]
    fn test_growth_against_previous_point() {
        let points = with_growth(vec![
            ("2024-01".to_string(), 0.0),
            ("2024-02".to_string(), 1000.0),
            ("2024-04".to_string(), 1500.0),
        ]);
        let growth: Vec<f64> = points.iter().map(|p| p.growth).collect();
        // first point and a zero predecessor both yield 0
        assert_eq!(growth, vec![0.0, 0.0, 50.0]);
    }

    #[test]
    fn test_seasonal_classification() {
        let config = AnalyticsConfig::default();
        // mean 200: peak above 240, low below 160
        let seasons = classify_quarters([100.0, 100.0, 500.0, 100.0], &config);
        assert_eq!(seasons[2], Season::Peak);
        assert_eq!(seasons, [Season::Low, Season::Low, Season::Peak, Season::Low]);

        let seasons = classify_quarters([180.0, 200.0, 240.0, 180.0], &config);
        assert_eq!(seasons, [Season::Normal; 4]);

        // no revenue at all is flat, not low
        assert_eq!(classify_quarters([0.0; 4], &config), [Season::Normal; 4]);
    }

    #[test]
    fn test_seasonal_quarters_ignore_year() {
        let snapshot = Snapshot {
            time_entries: vec![
                at(entry("e1", "t1", "p1", 60, true, 100.0), ts(2023, 8, 1)),
                at(entry("e2", "t1", "p1", 60, true, 100.0), ts(2024, 9, 1)),
                at(entry("e3", "t1", "p1", 60, true, 80.0), ts(2024, 2, 1)),
            ],
            ..Default::default()
        };
        let trends = compute(&snapshot, &AnalyticsConfig::default());
        let quarters: Vec<(&str, f64, Season)> = trends
            .seasonal_patterns
            .iter()
            .map(|s| (s.quarter.as_str(), s.revenue, s.pattern))
            .collect();
        assert_eq!(
            quarters,
            vec![
                ("Q1", 80.0, Season::Normal),
                ("Q2", 0.0, Season::Low),
                ("Q3", 200.0, Season::Peak),
                ("Q4", 0.0, Season::Low),
            ]
        );
    }

    #[test]
    fn test_client_growth_is_cumulative() {
        let mut c2 = client("c2");
        c2.created_at = ts(2024, 2, 3);
        let mut c3 = client("c3");
        c3.created_at = ts(2024, 2, 9);
        let snapshot = Snapshot {
            clients: vec![client("c1"), c2, c3],
            ..Default::default()
        };
        let trends = compute(&snapshot, &AnalyticsConfig::default());
        let values: Vec<(f64, f64)> = trends
            .client_growth
            .iter()
            .map(|p| (p.value, p.growth))
            .collect();
        assert_eq!(values, vec![(1.0, 0.0), (3.0, 200.0)]);
    }

    #[test]
    fn test_revenue_trend_and_volume() {
        let mut p2 = project("p2", "c1", ProjectStatus::Active);
        p2.created_at = ts(2024, 2, 1);
        let mut p3 = project("p3", "c1", ProjectStatus::Active);
        p3.created_at = ts(2024, 2, 2);
        let snapshot = Snapshot {
            projects: vec![project("p1", "c1", ProjectStatus::Active), p2, p3],
            time_entries: vec![
                at(entry("e1", "t1", "p1", 600, true, 100.0), ts(2024, 2, 10)),
                at(entry("e2", "t1", "p1", 900, true, 100.0), ts(2024, 3, 5)),
                at(entry("e3", "t1", "p1", 60, false, 0.0), ts(2024, 3, 6)),
            ],
            ..Default::default()
        };
        let trends = compute(&snapshot, &AnalyticsConfig::default());
        assert_eq!(trends.revenue_trend[1].value, 1500.0);
        assert_eq!(trends.revenue_trend[1].growth, 50.0);
        assert_eq!(trends.project_volume[1].value, 2.0);
        assert_eq!(trends.project_volume[1].growth, 100.0);

        let march = &trends.productivity_trend[1];
        assert_eq!(march.entries, 2);
        assert_eq!(march.average_hours_per_entry, 8.0);
        assert_eq!(march.efficiency, 93.75);
    }
}
