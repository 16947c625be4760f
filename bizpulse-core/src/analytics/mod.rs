//! Analytics module for bizpulse
//!
//! Turns the four record collections into business metrics:
//! - Overview (headline counts, hours, revenue, utilization)
//! - Revenue (by month, project and client; top performers)
//! - Productivity (completion time, overdue tasks, bottlenecks)
//! - Clients (status mix, acquisition, top clients)
//! - Project performance (on-time delivery, budget adherence, margins)
//! - Time (daily, weekly and monthly hours; allocation; overtime)
//! - Trends (month-over-month growth and seasonal quarters)
//!
//! Every view is a pure function of a [`Snapshot`], an optional
//! [`AnalyticsFilter`] and a caller-supplied `now`. Nothing is cached and
//! nothing is written back. Zero denominators resolve to `0.0` through the
//! helpers in [`period`].
//!
//! See [`engine`] for the entry points.

pub mod clients;
pub mod engine;
pub mod filter;
pub mod overview;
pub mod performance;
pub mod period;
pub mod productivity;
pub mod revenue;
pub mod time;
pub mod trends;

pub use clients::ClientAnalytics;
pub use engine::{AnalyticsEngine, AnalyticsReport, AnalyticsView};
pub use filter::{AnalyticsFilter, DateRange};
pub use overview::OverviewAnalytics;
pub use performance::ProjectPerformanceAnalytics;
pub use productivity::ProductivityAnalytics;
pub use revenue::RevenueAnalytics;
pub use time::TimeAnalytics;
pub use trends::TrendAnalytics;

use crate::types::{Client, Project, Task, TimeEntry};
use serde::Serialize;

/// The four collections an analytics view reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub time_entries: Vec<TimeEntry>,
}

impl Snapshot {
    /// Apply `filter` to each collection independently.
    ///
    /// `None` returns a copy with every collection in its original order.
    pub fn filtered(&self, filter: Option<&AnalyticsFilter>) -> Snapshot {
        Snapshot {
            clients: filter::apply(&self.clients, filter, AnalyticsFilter::keeps_client),
            projects: filter::apply(&self.projects, filter, AnalyticsFilter::keeps_project),
            tasks: filter::apply(&self.tasks, filter, AnalyticsFilter::keeps_task),
            time_entries: filter::apply(
                &self.time_entries,
                filter,
                AnalyticsFilter::keeps_time_entry,
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
            && self.projects.is_empty()
            && self.tasks.is_empty()
            && self.time_entries.is_empty()
    }
}

/// Share of a collection in one status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusShare {
    pub status: String,
    pub count: usize,
    /// Percent of the filtered collection, 2 decimals
    pub percentage: f64,
}

/// Count and percentage per status value present, in the order given.
pub(crate) fn status_distribution<S: Copy + PartialEq>(
    statuses: &[S],
    order: &[S],
    name: fn(&S) -> &'static str,
) -> Vec<StatusShare> {
    let total = statuses.len() as f64;
    order
        .iter()
        .filter_map(|status| {
            let count = statuses.iter().filter(|s| *s == status).count();
            (count > 0).then(|| StatusShare {
                status: name(status).to_string(),
                count,
                percentage: crate::types::round2(period::percent(count as f64, total)),
            })
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::types::{ClientStatus, ProjectStatus, TaskStatus};

    #[test]
    fn test_filtered_without_filter_is_identity() {
        let snapshot = Snapshot {
            clients: vec![client("c2"), client("c1")],
            projects: vec![project("p1", "c1", ProjectStatus::Cancelled)],
            tasks: vec![task("t1", "p1", TaskStatus::Todo)],
            time_entries: vec![entry("e1", "t1", "p1", 30, false, 0.0)],
        };
        assert_eq!(snapshot.filtered(None), snapshot);
    }

    #[test]
    fn test_filtered_applies_per_collection() {
        let mut archived = client("c2");
        archived.status = ClientStatus::Archived;
        let snapshot = Snapshot {
            clients: vec![client("c1"), archived],
            projects: vec![
                project("p1", "c1", ProjectStatus::Active),
                project("p2", "c2", ProjectStatus::Cancelled),
            ],
            tasks: vec![task("t1", "p1", TaskStatus::Todo), task("t2", "p2", TaskStatus::Todo)],
            time_entries: vec![entry("e1", "t2", "p2", 30, true, 10.0)],
        };

        let filter = AnalyticsFilter {
            projects: ["p2".to_string()].into(),
            include_archived: false,
            ..Default::default()
        };
        let out = snapshot.filtered(Some(&filter));
        assert_eq!(out.clients.len(), 1);
        // p2 is in the set but cancelled
        assert!(out.projects.is_empty());
        // tasks and entries do not carry a project status
        assert_eq!(out.tasks.len(), 1);
        assert_eq!(out.time_entries.len(), 1);
    }

    #[test]
    fn test_status_distribution_skips_absent_statuses() {
        let statuses = [TaskStatus::Todo, TaskStatus::Todo, TaskStatus::Completed];
        let order = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed];
        let dist = status_distribution(&statuses, &order, TaskStatus::as_str);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].status, "todo");
        assert_eq!(dist[0].count, 2);
        assert_eq!(dist[0].percentage, 66.67);
        assert_eq!(dist[1].percentage, 33.33);
    }
}
