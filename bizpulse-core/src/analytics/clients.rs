//! Client base analytics.

use super::period::{month_key, ratio, Month};
use super::revenue::{client_revenue, project_revenue, ClientRevenue};
use super::{status_distribution, Snapshot, StatusShare};
use crate::config::AnalyticsConfig;
use crate::types::{round2, ClientStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const CLIENT_STATUSES: [ClientStatus; 4] = [
    ClientStatus::Active,
    ClientStatus::Inactive,
    ClientStatus::Pending,
    ClientStatus::Archived,
];

/// Client analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAnalytics {
    pub total_clients: usize,
    pub active_clients: usize,
    /// Clients created in the current month
    pub new_this_month: usize,
    pub average_projects_per_client: f64,
    pub average_revenue_per_client: f64,
    pub status_distribution: Vec<StatusShare>,
    /// Highest revenue first
    pub top_clients: Vec<ClientRevenue>,
    /// Clients created per month, ascending
    pub acquisition: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

pub fn compute(
    snapshot: &Snapshot,
    config: &AnalyticsConfig,
    now: DateTime<Utc>,
) -> ClientAnalytics {
    let clients = &snapshot.clients;
    let this_month = Month::of(now);

    let by_project = project_revenue(&snapshot.projects, &snapshot.time_entries);
    let mut top_clients = client_revenue(snapshot, &by_project);
    let client_total: f64 = top_clients.iter().map(|c| c.revenue).sum();
    let attached_projects: usize = top_clients.iter().map(|c| c.project_count).sum();
    top_clients.truncate(config.top_clients_count);

    let mut acquisition: BTreeMap<String, usize> = BTreeMap::new();
    for client in clients {
        *acquisition.entry(month_key(client.created_at)).or_default() += 1;
    }

    let statuses: Vec<ClientStatus> = clients.iter().map(|c| c.status).collect();

    ClientAnalytics {
        total_clients: clients.len(),
        active_clients: clients
            .iter()
            .filter(|c| c.status == ClientStatus::Active)
            .count(),
        new_this_month: clients
            .iter()
            .filter(|c| this_month.contains(c.created_at))
            .count(),
        average_projects_per_client: round2(ratio(
            attached_projects as f64,
            clients.len() as f64,
        )),
        average_revenue_per_client: round2(ratio(client_total, clients.len() as f64)),
        status_distribution: status_distribution(
            &statuses,
            &CLIENT_STATUSES,
            ClientStatus::as_str,
        ),
        top_clients,
        acquisition: acquisition
            .into_iter()
            .map(|(month, count)| MonthlyCount { month, count })
            .collect(),
    }
}
