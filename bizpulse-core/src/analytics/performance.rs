//! Project delivery, budget adherence and margins.

use super::period::{days_between, percent, ratio};
use super::productivity::on_time_rate;
use super::revenue::totals_by_project;
use super::{status_distribution, Snapshot, StatusShare};
use crate::types::{round2, ProjectStatus};
use serde::Serialize;

const PROJECT_STATUSES: [ProjectStatus; 4] = [
    ProjectStatus::Active,
    ProjectStatus::OnHold,
    ProjectStatus::Completed,
    ProjectStatus::Cancelled,
];

/// Project-performance analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPerformanceAnalytics {
    pub total_projects: usize,
    /// Percent of completed projects that ended by their deadline
    pub on_time_delivery: f64,
    /// Percent of budgeted projects whose spend stayed within budget
    pub budget_adherence: f64,
    /// Mean days from start to end over completed projects with both dates
    pub average_duration_days: f64,
    pub total_profit: f64,
    pub average_margin: f64,
    pub profitability: Vec<ProjectProfit>,
    pub over_budget: Vec<OverBudgetProject>,
    pub status_distribution: Vec<StatusShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProfit {
    pub project_id: String,
    pub title: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    /// profit / revenue * 100
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverBudgetProject {
    pub project_id: String,
    pub title: String,
    pub budget: f64,
    pub total_spent: f64,
    pub overrun: f64,
}

pub fn compute(snapshot: &Snapshot) -> ProjectPerformanceAnalytics {
    let projects = &snapshot.projects;
    let totals = totals_by_project(&snapshot.time_entries);

    let budgeted: Vec<_> = projects.iter().filter(|p| p.budget > 0.0).collect();
    let within_budget = budgeted.iter().filter(|p| p.total_spent <= p.budget).count();

    let durations: Vec<f64> = projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Completed)
        .filter_map(|p| match (p.start_date, p.end_date) {
            (Some(start), Some(end)) => Some(days_between(start, end)),
            _ => None,
        })
        .collect();

    let profitability: Vec<ProjectProfit> = projects
        .iter()
        .map(|project| {
            let revenue = totals
                .get(project.id.as_str())
                .map_or(0.0, |(revenue, _)| *revenue);
            let profit = revenue - project.total_spent;
            ProjectProfit {
                project_id: project.id.clone(),
                title: project.title.clone(),
                revenue: round2(revenue),
                cost: round2(project.total_spent),
                profit: round2(profit),
                margin: round2(percent(profit, revenue)),
            }
        })
        .collect();

    let over_budget = budgeted
        .iter()
        .filter(|p| p.total_spent > p.budget)
        .map(|p| OverBudgetProject {
            project_id: p.id.clone(),
            title: p.title.clone(),
            budget: round2(p.budget),
            total_spent: round2(p.total_spent),
            overrun: round2(p.total_spent - p.budget),
        })
        .collect();

    let statuses: Vec<ProjectStatus> = projects.iter().map(|p| p.status).collect();

    ProjectPerformanceAnalytics {
        total_projects: projects.len(),
        on_time_delivery: round2(on_time_rate(projects)),
        budget_adherence: round2(percent(within_budget as f64, budgeted.len() as f64)),
        average_duration_days: round2(ratio(durations.iter().sum(), durations.len() as f64)),
        total_profit: round2(profitability.iter().map(|p| p.profit).sum()),
        average_margin: round2(ratio(
            profitability.iter().map(|p| p.margin).sum(),
            profitability.len() as f64,
        )),
        profitability,
        over_budget,
        status_distribution: status_distribution(
            &statuses,
            &PROJECT_STATUSES,
            ProjectStatus::as_str,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::*;

    #[test]
    fn test_budget_adherence_over_budgeted_projects_only() {
        let mut within = project("p1", "c1", ProjectStatus::Active);
        within.budget = 1000.0;
        within.total_spent = 1000.0;
        let mut over = project("p2", "c1", ProjectStatus::Active);
        over.budget = 500.0;
        over.total_spent = 800.0;
        let unbudgeted = project("p3", "c1", ProjectStatus::Active);
        let snapshot = Snapshot {
            projects: vec![within, over, unbudgeted],
            ..Default::default()
        };

        let perf = compute(&snapshot);
        assert_eq!(perf.budget_adherence, 50.0);
        assert_eq!(perf.over_budget.len(), 1);
        assert_eq!(perf.over_budget[0].overrun, 300.0);
    }

    #[test]
    fn test_profit_and_margin() {
        let mut p1 = project("p1", "c1", ProjectStatus::Active);
        p1.total_spent = 150.0;
        let mut p2 = project("p2", "c1", ProjectStatus::Active);
        p2.total_spent = 40.0;
        let snapshot = Snapshot {
            projects: vec![p1, p2],
            time_entries: vec![
                entry("e1", "t1", "p1", 120, true, 100.0),
                entry("e2", "t1", "p1", 60, false, 0.0),
            ],
            ..Default::default()
        };

        let perf = compute(&snapshot);
        assert_eq!(perf.profitability[0].revenue, 200.0);
        assert_eq!(perf.profitability[0].profit, 50.0);
        assert_eq!(perf.profitability[0].margin, 25.0);
        // no revenue: margin 0, profit negative
        assert_eq!(perf.profitability[1].profit, -40.0);
        assert_eq!(perf.profitability[1].margin, 0.0);
        assert_eq!(perf.total_profit, 10.0);
    }

    #[test]
    fn test_status_distribution_and_on_time() {
        let mut done = project("p1", "c1", ProjectStatus::Completed);
        done.start_date = Some(ts(2024, 1, 1));
        done.end_date = Some(ts(2024, 1, 11));
        done.deadline = Some(ts(2024, 1, 31));
        let snapshot = Snapshot {
            projects: vec![
                done,
                project("p2", "c1", ProjectStatus::Active),
                project("p3", "c1", ProjectStatus::Active),
                project("p4", "c1", ProjectStatus::OnHold),
            ],
            ..Default::default()
        };

        let perf = compute(&snapshot);
        assert_eq!(perf.on_time_delivery, 100.0);
        assert_eq!(perf.average_duration_days, 10.0);
        let dist: Vec<(&str, usize, f64)> = perf
            .status_distribution
            .iter()
            .map(|s| (s.status.as_str(), s.count, s.percentage))
            .collect();
        assert_eq!(
            dist,
            vec![("active", 2, 50.0), ("on_hold", 1, 25.0), ("completed", 1, 25.0)]
        );
    }

    #[test]
    fn test_empty() {
        let perf = compute(&Snapshot::default());
        assert_eq!(perf, ProjectPerformanceAnalytics::default());
    }
}
