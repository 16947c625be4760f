//! Headline numbers for the dashboard.

use super::period::{percent, percent_change, Month};
use super::Snapshot;
use crate::types::{round2, ClientStatus, ProjectStatus, TaskStatus, TimeEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Overview analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewAnalytics {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub total_clients: usize,
    pub active_clients: usize,
    pub total_tasks: usize,
    pub open_tasks: usize,
    pub overdue_tasks: usize,
    pub total_hours: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
    /// Billable revenue across all entries
    pub total_revenue: f64,
    /// Billable revenue of entries created in the current month
    pub monthly_revenue: f64,
    pub previous_month_revenue: f64,
    /// Percent change of monthly vs previous month revenue
    pub revenue_growth: f64,
    /// Billable hours as a percent of total hours
    pub utilization: f64,
}

/// Hours split by billability, unrounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct HourTotals {
    pub total_minutes: u64,
    pub billable_minutes: u64,
}

impl HourTotals {
    pub fn of<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> Self {
        let mut totals = HourTotals::default();
        for entry in entries {
            totals.add(entry);
        }
        totals
    }

    pub fn add(&mut self, entry: &TimeEntry) {
        self.total_minutes += entry.duration as u64;
        if entry.billable {
            self.billable_minutes += entry.duration as u64;
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.total_minutes as f64 / 60.0
    }

    pub fn billable_hours(&self) -> f64 {
        self.billable_minutes as f64 / 60.0
    }

    pub fn non_billable_hours(&self) -> f64 {
        (self.total_minutes - self.billable_minutes) as f64 / 60.0
    }
}

/// Billable revenue of the entries created in `month`.
pub(crate) fn revenue_in_month(entries: &[TimeEntry], month: Month) -> f64 {
    entries
        .iter()
        .filter(|e| month.contains(e.created_at))
        .map(TimeEntry::revenue)
        .sum()
}

pub fn compute(snapshot: &Snapshot, now: DateTime<Utc>) -> OverviewAnalytics {
    let entries = &snapshot.time_entries;
    let hours = HourTotals::of(entries);

    let this_month = Month::of(now);
    let monthly_revenue = revenue_in_month(entries, this_month);
    let previous_month_revenue = revenue_in_month(entries, this_month.previous());

    let count_projects =
        |status: ProjectStatus| snapshot.projects.iter().filter(|p| p.status == status).count();

    OverviewAnalytics {
        total_projects: snapshot.projects.len(),
        active_projects: count_projects(ProjectStatus::Active),
        completed_projects: count_projects(ProjectStatus::Completed),
        total_clients: snapshot.clients.len(),
        active_clients: snapshot
            .clients
            .iter()
            .filter(|c| c.status == ClientStatus::Active)
            .count(),
        total_tasks: snapshot.tasks.len(),
        open_tasks: snapshot
            .tasks
            .iter()
            .filter(|t| !matches!(t.status, TaskStatus::Completed | TaskStatus::Cancelled))
            .count(),
        overdue_tasks: snapshot.tasks.iter().filter(|t| t.is_overdue(now)).count(),
        total_hours: round2(hours.total_hours()),
        billable_hours: round2(hours.billable_hours()),
        non_billable_hours: round2(hours.non_billable_hours()),
        total_revenue: round2(entries.iter().map(TimeEntry::revenue).sum()),
        monthly_revenue: round2(monthly_revenue),
        previous_month_revenue: round2(previous_month_revenue),
        revenue_growth: round2(percent_change(monthly_revenue, previous_month_revenue)),
        utilization: round2(percent(hours.billable_hours(), hours.total_hours())),
    }
}
