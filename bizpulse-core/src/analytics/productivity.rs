//! Task throughput, overdue work and delivery bottlenecks.

use super::period::{days_between, percent, ratio};
use super::{status_distribution, Snapshot, StatusShare};
use crate::config::AnalyticsConfig;
use crate::types::{round2, Project, ProjectStatus, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

const TASK_STATUSES: [TaskStatus; 5] = [
    TaskStatus::Todo,
    TaskStatus::InProgress,
    TaskStatus::Completed,
    TaskStatus::Blocked,
    TaskStatus::Cancelled,
];

/// Productivity analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityAnalytics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: f64,
    /// Mean days from creation to completion over completed tasks
    pub average_completion_days: f64,
    /// Mean tracked hours per completed task
    pub average_hours_per_task: f64,
    pub overdue_tasks: usize,
    pub overdue_percentage: f64,
    /// Percent of completed projects delivered by their deadline
    pub project_delivery_rate: f64,
    pub status_distribution: Vec<StatusShare>,
    pub bottlenecks: Vec<Bottleneck>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckKind {
    Task,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    pub description: String,
    pub impact: Impact,
}

/// Whether a completed project finished by its deadline (both dates present).
pub(crate) fn delivered_on_time(project: &Project) -> bool {
    matches!((project.end_date, project.deadline), (Some(end), Some(deadline)) if end <= deadline)
}

/// Percent of completed projects delivered on time; 0 when none completed.
pub(crate) fn on_time_rate(projects: &[Project]) -> f64 {
    let completed: Vec<&Project> = projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Completed)
        .collect();
    let on_time = completed.iter().filter(|p| delivered_on_time(p)).count();
    percent(on_time as f64, completed.len() as f64)
}

pub fn compute(
    snapshot: &Snapshot,
    config: &AnalyticsConfig,
    now: DateTime<Utc>,
) -> ProductivityAnalytics {
    let tasks = &snapshot.tasks;
    let total = tasks.len();

    let completed: Vec<_> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .collect();
    let completion_days: Vec<f64> = completed
        .iter()
        .filter_map(|t| t.completed_at.map(|done| days_between(t.created_at, done)))
        .collect();
    let completed_hours: f64 = completed.iter().map(|t| t.actual_hours).sum();

    let overdue_tasks = tasks.iter().filter(|t| t.is_overdue(now)).count();
    let overdue_percentage = percent(overdue_tasks as f64, total as f64);

    let mut bottlenecks = Vec::new();
    if overdue_percentage > config.overdue_bottleneck_percent {
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Task,
            description: format!(
                "{} of {} tasks are overdue ({:.0}%)",
                overdue_tasks, total, overdue_percentage
            ),
            impact: Impact::High,
        });
    }
    let late_projects = snapshot
        .projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Active && p.deadline.is_some_and(|d| d < now))
        .count();
    if late_projects > 0 {
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Project,
            description: format!("{} active projects are past their deadline", late_projects),
            impact: Impact::Medium,
        });
    }

    let statuses: Vec<TaskStatus> = tasks.iter().map(|t| t.status).collect();

    ProductivityAnalytics {
        total_tasks: total,
        completed_tasks: completed.len(),
        completion_rate: round2(percent(completed.len() as f64, total as f64)),
        average_completion_days: round2(ratio(
            completion_days.iter().sum(),
            completion_days.len() as f64,
        )),
        average_hours_per_task: round2(ratio(completed_hours, completed.len() as f64)),
        overdue_tasks,
        overdue_percentage: round2(overdue_percentage),
        project_delivery_rate: round2(on_time_rate(&snapshot.projects)),
        status_distribution: status_distribution(&statuses, &TASK_STATUSES, TaskStatus::as_str),
        bottlenecks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::*;
    use crate::types::Task;
    use chrono::Duration;

    fn overdue(id: &str, now: DateTime<Utc>) -> Task {
        let mut t = task(id, "p1", TaskStatus::InProgress);
        t.due_date = Some(now - Duration::days(2));
        t
    }

    #[test]
    fn test_empty_is_zero() {
        let p = compute(&Snapshot::default(), &AnalyticsConfig::default(), ts(2024, 3, 1));
        assert_eq!(p.overdue_percentage, 0.0);
        assert_eq!(p.average_completion_days, 0.0);
        assert_eq!(p.project_delivery_rate, 0.0);
        assert!(p.bottlenecks.is_empty());
        assert!(p.status_distribution.is_empty());
    }

    #[test]
    fn test_average_completion_days() {
        let mut a = task("t1", "p1", TaskStatus::Completed);
        a.completed_at = Some(a.created_at + Duration::days(2));
        a.actual_hours = 3.0;
        let mut b = task("t2", "p1", TaskStatus::Completed);
        b.completed_at = Some(b.created_at + Duration::hours(36));
        b.actual_hours = 5.0;
        // completed without a timestamp is skipped for the mean
        let c = task("t3", "p1", TaskStatus::Completed);
        let snapshot = Snapshot {
            tasks: vec![a, b, c, task("t4", "p1", TaskStatus::Todo)],
            ..Default::default()
        };

        let p = compute(&snapshot, &AnalyticsConfig::default(), ts(2024, 3, 1));
        assert_eq!(p.average_completion_days, 1.75);
        assert_eq!(p.completed_tasks, 3);
        assert_eq!(p.completion_rate, 75.0);
        assert_eq!(p.average_hours_per_task, 2.67);
    }

    #[test]
    fn test_bottleneck_above_threshold() {
        let now = ts(2024, 3, 10);
        let mut tasks: Vec<Task> = (0..4)
            .map(|i| task(&format!("t{}", i), "p1", TaskStatus::Todo))
            .collect();
        tasks.push(overdue("late", now));
        let snapshot = Snapshot {
            tasks,
            ..Default::default()
        };

        // exactly 20% is not a bottleneck
        let p = compute(&snapshot, &AnalyticsConfig::default(), now);
        assert_eq!(p.overdue_percentage, 20.0);
        assert!(p.bottlenecks.is_empty());

        let mut snapshot = snapshot;
        snapshot.tasks.push(overdue("later", now));
        let p = compute(&snapshot, &AnalyticsConfig::default(), now);
        assert_eq!(p.overdue_percentage, 33.33);
        assert_eq!(p.bottlenecks.len(), 1);
        assert_eq!(p.bottlenecks[0].kind, BottleneckKind::Task);
        assert_eq!(p.bottlenecks[0].impact, Impact::High);
    }

    #[test]
    fn test_overdue_is_monotonic() {
        let now = ts(2024, 3, 10);
        let mut snapshot = Snapshot {
            tasks: vec![task("t1", "p1", TaskStatus::Todo), overdue("t2", now)],
            ..Default::default()
        };
        let before = compute(&snapshot, &AnalyticsConfig::default(), now);

        snapshot.tasks.push(overdue("t3", now));
        let after = compute(&snapshot, &AnalyticsConfig::default(), now);

        assert!(after.overdue_tasks > before.overdue_tasks);
        assert!(after.overdue_percentage > before.overdue_percentage);
    }

    #[test]
    fn test_project_delivery_rate() {
        let mut on_time = project("p1", "c1", ProjectStatus::Completed);
        on_time.end_date = Some(ts(2024, 3, 1));
        on_time.deadline = Some(ts(2024, 3, 1));
        let mut late = project("p2", "c1", ProjectStatus::Completed);
        late.end_date = Some(ts(2024, 3, 5));
        late.deadline = Some(ts(2024, 3, 1));
        // completed without dates counts against the rate
        let undated = project("p3", "c1", ProjectStatus::Completed);
        let active = project("p4", "c1", ProjectStatus::Active);
        let snapshot = Snapshot {
            projects: vec![on_time, late, undated, active],
            ..Default::default()
        };

        let p = compute(&snapshot, &AnalyticsConfig::default(), ts(2024, 3, 10));
        assert_eq!(p.project_delivery_rate, 33.33);
    }

    #[test]
    fn test_idempotent() {
        let now = ts(2024, 3, 10);
        let snapshot = Snapshot {
            tasks: vec![overdue("t1", now), task("t2", "p1", TaskStatus::Blocked)],
            ..Default::default()
        };
        let config = AnalyticsConfig::default();
        let copy = snapshot.clone();
        assert_eq!(compute(&snapshot, &config, now), compute(&snapshot, &config, now));
        assert_eq!(snapshot, copy);
    }
}
