//! Revenue and financial aggregation.
//!
//! Months are keyed by entry `created_at`. Project revenue only counts
//! entries in the (filtered) snapshot, so a project filter narrows both the
//! projects and the revenue attributed to them.

use super::overview::{revenue_in_month, HourTotals};
use super::period::{month_key, percent, percent_change, ratio, Month};
use super::Snapshot;
use crate::config::AnalyticsConfig;
use crate::types::{round2, Project, TimeEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Revenue analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueAnalytics {
    pub total_revenue: f64,
    pub monthly_revenue: f64,
    pub revenue_growth: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
    /// Non-billable hours at the configured placeholder rate
    pub non_billable_cost: f64,
    /// Revenue per billable hour
    pub average_hourly_rate: f64,
    /// Ascending by month
    pub by_month: Vec<MonthlyRevenue>,
    pub by_project: Vec<ProjectRevenue>,
    /// Descending by revenue
    pub by_client: Vec<ClientRevenue>,
    /// Highest profitability first
    pub top_performing_projects: Vec<ProjectRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    /// "YYYY-MM"
    pub month: String,
    pub revenue: f64,
    pub billable_hours: f64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRevenue {
    pub project_id: String,
    pub title: String,
    pub client_id: String,
    pub client_name: String,
    pub revenue: f64,
    pub hours: f64,
    pub total_spent: f64,
    /// (revenue - total spent) / revenue * 100
    pub profitability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRevenue {
    pub client_id: String,
    pub client_name: String,
    pub revenue: f64,
    pub project_count: usize,
}

/// Unrounded revenue and hours per project id.
pub(crate) fn totals_by_project(entries: &[TimeEntry]) -> HashMap<&str, (f64, HourTotals)> {
    let mut totals: HashMap<&str, (f64, HourTotals)> = HashMap::new();
    for entry in entries {
        let slot = totals.entry(entry.project_id.as_str()).or_default();
        slot.0 += entry.revenue();
        slot.1.add(entry);
    }
    totals
}

pub(crate) fn project_revenue(
    projects: &[Project],
    entries: &[TimeEntry],
) -> Vec<ProjectRevenue> {
    let totals = totals_by_project(entries);
    projects
        .iter()
        .map(|project| {
            let (revenue, hours) = totals
                .get(project.id.as_str())
                .copied()
                .unwrap_or_default();
            ProjectRevenue {
                project_id: project.id.clone(),
                title: project.title.clone(),
                client_id: project.client_id.clone(),
                client_name: project.client_name.clone(),
                revenue: round2(revenue),
                hours: round2(hours.total_hours()),
                total_spent: round2(project.total_spent),
                profitability: round2(percent(revenue - project.total_spent, revenue)),
            }
        })
        .collect()
}

/// Per-client revenue and project count, highest revenue first.
pub(crate) fn client_revenue(
    snapshot: &Snapshot,
    by_project: &[ProjectRevenue],
) -> Vec<ClientRevenue> {
    let mut rows: Vec<ClientRevenue> = snapshot
        .clients
        .iter()
        .map(|client| {
            let projects: Vec<&ProjectRevenue> = by_project
                .iter()
                .filter(|p| p.client_id == client.id)
                .collect();
            ClientRevenue {
                client_id: client.id.clone(),
                client_name: client.name.clone(),
                revenue: round2(projects.iter().map(|p| p.revenue).sum()),
                project_count: projects.len(),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    rows
}

fn monthly_revenue(entries: &[TimeEntry]) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<String, (f64, HourTotals)> = BTreeMap::new();
    for entry in entries {
        let slot = months.entry(month_key(entry.created_at)).or_default();
        slot.0 += entry.revenue();
        slot.1.add(entry);
    }
    months
        .into_iter()
        .map(|(month, (revenue, hours))| MonthlyRevenue {
            month,
            revenue: round2(revenue),
            billable_hours: round2(hours.billable_hours()),
            total_hours: round2(hours.total_hours()),
        })
        .collect()
}

pub fn compute(
    snapshot: &Snapshot,
    config: &AnalyticsConfig,
    now: DateTime<Utc>,
) -> RevenueAnalytics {
    let entries = &snapshot.time_entries;
    let hours = HourTotals::of(entries);
    let total_revenue: f64 = entries.iter().map(TimeEntry::revenue).sum();

    let this_month = Month::of(now);
    let current = revenue_in_month(entries, this_month);
    let previous = revenue_in_month(entries, this_month.previous());

    let by_project = project_revenue(&snapshot.projects, entries);
    let by_client = client_revenue(snapshot, &by_project);

    let mut top_performing_projects = by_project.clone();
    top_performing_projects.sort_by(|a, b| b.profitability.total_cmp(&a.profitability));
    top_performing_projects.truncate(config.top_projects_count);

    RevenueAnalytics {
        total_revenue: round2(total_revenue),
        monthly_revenue: round2(current),
        revenue_growth: round2(percent_change(current, previous)),
        billable_hours: round2(hours.billable_hours()),
        non_billable_hours: round2(hours.non_billable_hours()),
        non_billable_cost: round2(hours.non_billable_hours() * config.non_billable_cost_rate),
        average_hourly_rate: round2(ratio(total_revenue, hours.billable_hours())),
        by_month: monthly_revenue(entries),
        by_project,
        by_client,
        top_performing_projects,
    }
}
