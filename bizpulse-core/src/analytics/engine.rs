//! Analytics engine
//!
//! The engine holds the configured rates and thresholds and dispatches to
//! the view modules. It never reads or writes storage itself: callers pass
//! a [`Snapshot`], usually from [`crate::Workspace::snapshot`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bizpulse_core::analytics::{AnalyticsEngine, AnalyticsFilter, AnalyticsView};
//!
//! let engine = AnalyticsEngine::new(config.analytics);
//! let snapshot = workspace.snapshot();
//!
//! let filter = AnalyticsFilter { include_archived: true, ..Default::default() };
//! let report = engine.report(AnalyticsView::Revenue, &snapshot, Some(&filter), Utc::now());
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

use super::{
    clients, overview, performance, productivity, revenue, time, trends, AnalyticsFilter,
    ClientAnalytics, OverviewAnalytics, ProductivityAnalytics, ProjectPerformanceAnalytics,
    RevenueAnalytics, Snapshot, TimeAnalytics, TrendAnalytics,
};
use crate::config::AnalyticsConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

/// One of the seven analytics views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsView {
    Overview,
    Revenue,
    Productivity,
    Clients,
    Performance,
    Time,
    Trends,
}

impl AnalyticsView {
    pub const ALL: [AnalyticsView; 7] = [
        AnalyticsView::Overview,
        AnalyticsView::Revenue,
        AnalyticsView::Productivity,
        AnalyticsView::Clients,
        AnalyticsView::Performance,
        AnalyticsView::Time,
        AnalyticsView::Trends,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsView::Overview => "overview",
            AnalyticsView::Revenue => "revenue",
            AnalyticsView::Productivity => "productivity",
            AnalyticsView::Clients => "clients",
            AnalyticsView::Performance => "performance",
            AnalyticsView::Time => "time",
            AnalyticsView::Trends => "trends",
        }
    }
}

impl std::str::FromStr for AnalyticsView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalyticsView::ALL
            .into_iter()
            .find(|view| view.as_str() == s)
            .ok_or_else(|| format!("unknown analytics view: {}", s))
    }
}

/// Output of [`AnalyticsEngine::report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum AnalyticsReport {
    Overview(OverviewAnalytics),
    Revenue(RevenueAnalytics),
    Productivity(ProductivityAnalytics),
    Clients(ClientAnalytics),
    Performance(ProjectPerformanceAnalytics),
    Time(TimeAnalytics),
    Trends(TrendAnalytics),
}

impl AnalyticsReport {
    pub fn view(&self) -> AnalyticsView {
        match self {
            AnalyticsReport::Overview(_) => AnalyticsView::Overview,
            AnalyticsReport::Revenue(_) => AnalyticsView::Revenue,
            AnalyticsReport::Productivity(_) => AnalyticsView::Productivity,
            AnalyticsReport::Clients(_) => AnalyticsView::Clients,
            AnalyticsReport::Performance(_) => AnalyticsView::Performance,
            AnalyticsReport::Time(_) => AnalyticsView::Time,
            AnalyticsReport::Trends(_) => AnalyticsView::Trends,
        }
    }
}

/// Stateless aggregation over snapshots.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn overview(
        &self,
        snapshot: &Snapshot,
        filter: Option<&AnalyticsFilter>,
        now: DateTime<Utc>,
    ) -> OverviewAnalytics {
        overview::compute(&snapshot.filtered(filter), now)
    }

    pub fn revenue(
        &self,
        snapshot: &Snapshot,
        filter: Option<&AnalyticsFilter>,
        now: DateTime<Utc>,
    ) -> RevenueAnalytics {
        revenue::compute(&snapshot.filtered(filter), &self.config, now)
    }

    pub fn productivity(
        &self,
        snapshot: &Snapshot,
        filter: Option<&AnalyticsFilter>,
        now: DateTime<Utc>,
    ) -> ProductivityAnalytics {
        productivity::compute(&snapshot.filtered(filter), &self.config, now)
    }

    pub fn clients(
        &self,
        snapshot: &Snapshot,
        filter: Option<&AnalyticsFilter>,
        now: DateTime<Utc>,
    ) -> ClientAnalytics {
        clients::compute(&snapshot.filtered(filter), &self.config, now)
    }

    pub fn project_performance(
        &self,
        snapshot: &Snapshot,
        filter: Option<&AnalyticsFilter>,
    ) -> ProjectPerformanceAnalytics {
        performance::compute(&snapshot.filtered(filter))
    }

    pub fn time(&self, snapshot: &Snapshot, filter: Option<&AnalyticsFilter>) -> TimeAnalytics {
        time::compute(&snapshot.filtered(filter), &self.config)
    }

    pub fn trends(&self, snapshot: &Snapshot, filter: Option<&AnalyticsFilter>) -> TrendAnalytics {
        trends::compute(&snapshot.filtered(filter), &self.config)
    }

    /// Compute one view by name.
    pub fn report(
        &self,
        view: AnalyticsView,
        snapshot: &Snapshot,
        filter: Option<&AnalyticsFilter>,
        now: DateTime<Utc>,
    ) -> AnalyticsReport {
        let start = Instant::now();
        let report = match view {
            AnalyticsView::Overview => AnalyticsReport::Overview(self.overview(snapshot, filter, now)),
            AnalyticsView::Revenue => AnalyticsReport::Revenue(self.revenue(snapshot, filter, now)),
            AnalyticsView::Productivity => {
                AnalyticsReport::Productivity(self.productivity(snapshot, filter, now))
            }
            AnalyticsView::Clients => AnalyticsReport::Clients(self.clients(snapshot, filter, now)),
            AnalyticsView::Performance => {
                AnalyticsReport::Performance(self.project_performance(snapshot, filter))
            }
            AnalyticsView::Time => AnalyticsReport::Time(self.time(snapshot, filter)),
            AnalyticsView::Trends => AnalyticsReport::Trends(self.trends(snapshot, filter)),
        };
        tracing::debug!(
            view = view.as_str(),
            filtered = filter.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Computed analytics view"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::*;
    use crate::types::{ProjectStatus, TaskStatus};

    fn snapshot() -> Snapshot {
        Snapshot {
            clients: vec![client("c1")],
            projects: vec![
                project("p1", "c1", ProjectStatus::Active),
                project("p2", "c1", ProjectStatus::Cancelled),
            ],
            tasks: vec![task("t1", "p1", TaskStatus::Todo)],
            time_entries: vec![
                entry("e1", "t1", "p1", 120, true, 100.0),
                entry("e2", "t2", "p2", 60, true, 100.0),
            ],
        }
    }

    #[test]
    fn test_view_names_round_trip() {
        for view in AnalyticsView::ALL {
            assert_eq!(view.as_str().parse::<AnalyticsView>().unwrap(), view);
        }
        assert!("weather".parse::<AnalyticsView>().is_err());
    }

    #[test]
    fn test_report_dispatch_matches_view() {
        let engine = AnalyticsEngine::default();
        let snapshot = snapshot();
        let now = ts(2024, 3, 10);
        for view in AnalyticsView::ALL {
            assert_eq!(engine.report(view, &snapshot, None, now).view(), view);
        }
    }

    #[test]
    fn test_report_serializes_tagged() {
        let engine = AnalyticsEngine::default();
        let report = engine.report(AnalyticsView::Overview, &snapshot(), None, ts(2024, 3, 10));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["view"], "overview");
        assert_eq!(json["data"]["billableHours"], 3.0);
    }

    #[test]
    fn test_filter_applies_before_aggregation() {
        let engine = AnalyticsEngine::default();
        let snapshot = snapshot();
        let now = ts(2024, 3, 10);

        let all = engine.overview(&snapshot, None, now);
        assert_eq!(all.total_projects, 2);

        let filter = AnalyticsFilter {
            projects: ["p1".to_string()].into(),
            ..Default::default()
        };
        let narrowed = engine.overview(&snapshot, Some(&filter), now);
        assert_eq!(narrowed.total_projects, 1);
        assert_eq!(narrowed.total_hours, 2.0);
        assert_eq!(narrowed.total_revenue, 200.0);
    }

    #[test]
    fn test_views_are_idempotent() {
        let engine = AnalyticsEngine::default();
        let snapshot = snapshot();
        let now = ts(2024, 3, 10);
        for view in AnalyticsView::ALL {
            assert_eq!(
                engine.report(view, &snapshot, None, now),
                engine.report(view, &snapshot, None, now)
            );
        }
    }
}
