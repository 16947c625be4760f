//! Analytics filtering
//!
//! A filter is applied to each collection independently, using only the
//! fields that collection carries. Empty ID sets place no restriction.

use crate::types::{Client, ClientStatus, Project, ProjectStatus, Task, TimeEntry};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Inclusive range compared against a record's `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Restricts which records an analytics view sees.
///
/// `include_archived = false` drops cancelled projects and archived clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsFilter {
    pub date_range: Option<DateRange>,
    pub projects: BTreeSet<String>,
    pub clients: BTreeSet<String>,
    pub users: BTreeSet<String>,
    pub include_archived: bool,
}

impl AnalyticsFilter {
    fn in_range(&self, ts: DateTime<Utc>) -> bool {
        self.date_range.map_or(true, |range| range.contains(ts))
    }

    fn allows(set: &BTreeSet<String>, id: &str) -> bool {
        set.is_empty() || set.contains(id)
    }

    pub fn keeps_client(&self, client: &Client) -> bool {
        self.in_range(client.created_at)
            && Self::allows(&self.clients, &client.id)
            && (self.include_archived || client.status != ClientStatus::Archived)
    }

    pub fn keeps_project(&self, project: &Project) -> bool {
        self.in_range(project.created_at)
            && Self::allows(&self.projects, &project.id)
            && Self::allows(&self.clients, &project.client_id)
            && (self.include_archived || project.status != ProjectStatus::Cancelled)
    }

    pub fn keeps_task(&self, task: &Task) -> bool {
        self.in_range(task.created_at)
            && Self::allows(&self.projects, &task.project_id)
            && (self.users.is_empty() || task.assigned_to.iter().any(|u| self.users.contains(u)))
    }

    pub fn keeps_time_entry(&self, entry: &TimeEntry) -> bool {
        self.in_range(entry.created_at)
            && Self::allows(&self.projects, &entry.project_id)
            && Self::allows(&self.users, &entry.user_id)
    }
}

/// Apply an optional filter; `None` returns the input unchanged.
pub fn apply<T: Clone>(
    items: &[T],
    filter: Option<&AnalyticsFilter>,
    keep: fn(&AnalyticsFilter, &T) -> bool,
) -> Vec<T> {
    match filter {
        Some(filter) => items.iter().filter(|item| keep(filter, item)).cloned().collect(),
        None => items.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::*;
    use chrono::TimeZone;

    #[test]
    fn test_no_filter_is_identity() {
        let projects = vec![
            project("p2", "c1", ProjectStatus::Cancelled),
            project("p1", "c1", ProjectStatus::Active),
        ];
        let out = apply(&projects, None, AnalyticsFilter::keeps_project);
        assert_eq!(out, projects);
    }

    #[test]
    fn test_archived_excluded_unless_requested() {
        let projects = vec![
            project("p1", "c1", ProjectStatus::Active),
            project("p2", "c1", ProjectStatus::Cancelled),
        ];
        let filter = AnalyticsFilter::default();
        let out = apply(&projects, Some(&filter), AnalyticsFilter::keeps_project);
        assert_eq!(out.len(), 1);

        let filter = AnalyticsFilter {
            include_archived: true,
            ..Default::default()
        };
        let out = apply(&projects, Some(&filter), AnalyticsFilter::keeps_project);
        assert_eq!(out.len(), 2);

        let mut archived = client("c2");
        archived.status = ClientStatus::Archived;
        let clients = vec![client("c1"), archived];
        let out = apply(&clients, Some(&AnalyticsFilter::default()), AnalyticsFilter::keeps_client);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let mut entry = entry("e1", "t1", "p1", 60, true, 100.0);
        entry.created_at = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let filter = AnalyticsFilter {
            date_range: Some(DateRange::new(
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                entry.created_at,
            )),
            ..Default::default()
        };
        assert!(filter.keeps_time_entry(&entry));

        entry.created_at += chrono::Duration::seconds(1);
        assert!(!filter.keeps_time_entry(&entry));
    }

    #[test]
    fn test_users_match_entries_and_assignees() {
        let filter = AnalyticsFilter {
            users: BTreeSet::from(["u2".to_string()]),
            ..Default::default()
        };

        let mut e = entry("e1", "t1", "p1", 60, true, 100.0);
        assert!(!filter.keeps_time_entry(&e));
        e.user_id = "u2".to_string();
        assert!(filter.keeps_time_entry(&e));

        let mut t = task("t1", "p1", crate::types::TaskStatus::Todo);
        assert!(!filter.keeps_task(&t));
        t.assigned_to.insert("u2".to_string());
        assert!(filter.keeps_task(&t));
    }

    #[test]
    fn test_client_set_restricts_projects_by_client_id() {
        let filter = AnalyticsFilter {
            clients: BTreeSet::from(["c2".to_string()]),
            ..Default::default()
        };
        assert!(!filter.keeps_project(&project("p1", "c1", ProjectStatus::Active)));
        assert!(filter.keeps_project(&project("p2", "c2", ProjectStatus::Active)));
    }
}
