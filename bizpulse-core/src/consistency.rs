//! Cross-store consistency updates
//!
//! Recomputes derived fields after the write that invalidated them:
//!
//! | Field | Recomputed after |
//! |-------|------------------|
//! | `Client::project_count` | project create/delete, or update that moves `client_id` |
//! | `Project::task_count`, `completed_tasks` | task create/delete, or update touching status or project |
//! | `Task::actual_hours` | time entry create/update/delete for that task |
//! | `Project::client_name` | client rename |
//!
//! The `refresh_*` functions run inside the triggering request. Their failures
//! are logged and swallowed: the primary write has already succeeded.

use crate::db::KeyValueStore;
use crate::error::Result;
use crate::store::{self, CLIENTS_KEY, PROJECTS_KEY, TASKS_KEY, TIME_ENTRIES_KEY};
use crate::types::{round2, Client, Project, Task, TaskStatus, TimeEntry};
use chrono::Utc;
use serde::Serialize;

/// Recompute `project_count` for one client.
pub fn refresh_client_project_count(kv: &dyn KeyValueStore, client_id: &str) {
    if let Err(e) = try_refresh_client_project_count(kv, client_id) {
        tracing::warn!(client_id, error = %e, "Failed to refresh client project count");
    }
}

fn try_refresh_client_project_count(kv: &dyn KeyValueStore, client_id: &str) -> Result<()> {
    let projects: Vec<Project> = store::load_strict(kv, PROJECTS_KEY)?;
    let count = projects.iter().filter(|p| p.client_id == client_id).count() as u32;

    let mut clients: Vec<Client> = store::load_strict(kv, CLIENTS_KEY)?;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        tracing::debug!(client_id, "Client gone, skipping project count refresh");
        return Ok(());
    };
    if client.project_count == count {
        return Ok(());
    }
    client.project_count = count;
    client.updated_at = Utc::now();
    store::save(kv, CLIENTS_KEY, &clients)?;

    tracing::debug!(client_id, count, "Refreshed client project count");
    Ok(())
}

/// Recompute `task_count` and `completed_tasks` for one project.
pub fn refresh_project_task_counts(kv: &dyn KeyValueStore, project_id: &str) {
    if let Err(e) = try_refresh_project_task_counts(kv, project_id) {
        tracing::warn!(project_id, error = %e, "Failed to refresh project task counts");
    }
}

fn try_refresh_project_task_counts(kv: &dyn KeyValueStore, project_id: &str) -> Result<()> {
    let tasks: Vec<Task> = store::load_strict(kv, TASKS_KEY)?;
    let (total, completed) = tasks
        .iter()
        .filter(|t| t.project_id == project_id)
        .fold((0u32, 0u32), |(total, completed), t| {
            let done = (t.status == TaskStatus::Completed) as u32;
            (total + 1, completed + done)
        });

    let mut projects: Vec<Project> = store::load_strict(kv, PROJECTS_KEY)?;
    let Some(project) = projects.iter_mut().find(|p| p.id == project_id) else {
        tracing::debug!(project_id, "Project gone, skipping task count refresh");
        return Ok(());
    };
    if project.task_count == total && project.completed_tasks == completed {
        return Ok(());
    }
    project.task_count = total;
    project.completed_tasks = completed;
    project.updated_at = Utc::now();
    store::save(kv, PROJECTS_KEY, &projects)?;

    tracing::debug!(project_id, total, completed, "Refreshed project task counts");
    Ok(())
}

/// Recompute `actual_hours` for one task from its time entries.
pub fn refresh_task_actual_hours(kv: &dyn KeyValueStore, task_id: &str) {
    if let Err(e) = try_refresh_task_actual_hours(kv, task_id) {
        tracing::warn!(task_id, error = %e, "Failed to refresh task actual hours");
    }
}

fn try_refresh_task_actual_hours(kv: &dyn KeyValueStore, task_id: &str) -> Result<()> {
    let entries: Vec<TimeEntry> = store::load_strict(kv, TIME_ENTRIES_KEY)?;
    let hours = actual_hours(&entries, task_id);

    let mut tasks: Vec<Task> = store::load_strict(kv, TASKS_KEY)?;
    let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
        tracing::debug!(task_id, "Task gone, skipping actual hours refresh");
        return Ok(());
    };
    if task.actual_hours == hours {
        return Ok(());
    }
    task.actual_hours = hours;
    task.updated_at = Utc::now();
    store::save(kv, TASKS_KEY, &tasks)?;

    tracing::debug!(task_id, hours, "Refreshed task actual hours");
    Ok(())
}

/// Sum of a task's entry durations in hours, rounded to 2 decimals.
pub fn actual_hours(entries: &[TimeEntry], task_id: &str) -> f64 {
    let minutes: u64 = entries
        .iter()
        .filter(|e| e.task_id == task_id)
        .map(|e| e.duration as u64)
        .sum();
    round2(minutes as f64 / 60.0)
}

/// Copy a client's current name onto every project that points at it.
pub fn resync_client_name(kv: &dyn KeyValueStore, client_id: &str, name: &str) {
    if let Err(e) = try_resync_client_name(kv, client_id, name) {
        tracing::warn!(client_id, error = %e, "Failed to re-sync client name on projects");
    }
}

fn try_resync_client_name(kv: &dyn KeyValueStore, client_id: &str, name: &str) -> Result<()> {
    let mut projects: Vec<Project> = store::load_strict(kv, PROJECTS_KEY)?;
    let now = Utc::now();
    let mut changed = 0usize;
    for project in projects
        .iter_mut()
        .filter(|p| p.client_id == client_id && p.client_name != name)
    {
        project.client_name = name.to_string();
        project.updated_at = now;
        changed += 1;
    }
    if changed > 0 {
        store::save(kv, PROJECTS_KEY, &projects)?;
        tracing::info!(client_id, changed, "Re-synced client name on projects");
    }
    Ok(())
}

/// Outcome of a full recomputation of derived fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub clients_fixed: usize,
    pub projects_fixed: usize,
    pub tasks_fixed: usize,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.clients_fixed + self.projects_fixed + self.tasks_fixed
    }
}

/// Recompute every derived field from scratch.
///
/// Unlike the `refresh_*` functions this propagates errors, since it is an
/// explicit maintenance request rather than a side effect of another write.
pub fn repair_all(kv: &dyn KeyValueStore) -> Result<RepairReport> {
    let mut clients: Vec<Client> = store::load_strict(kv, CLIENTS_KEY)?;
    let mut projects: Vec<Project> = store::load_strict(kv, PROJECTS_KEY)?;
    let mut tasks: Vec<Task> = store::load_strict(kv, TASKS_KEY)?;
    let entries: Vec<TimeEntry> = store::load_strict(kv, TIME_ENTRIES_KEY)?;
    let now = Utc::now();
    let mut report = RepairReport::default();

    for task in tasks.iter_mut() {
        let hours = actual_hours(&entries, &task.id);
        if task.actual_hours != hours {
            task.actual_hours = hours;
            task.updated_at = now;
            report.tasks_fixed += 1;
        }
    }

    for project in projects.iter_mut() {
        let mine = tasks.iter().filter(|t| t.project_id == project.id);
        let total = mine.clone().count() as u32;
        let completed = mine.filter(|t| t.status == TaskStatus::Completed).count() as u32;
        let client_name = clients
            .iter()
            .find(|c| c.id == project.client_id)
            .map(|c| c.name.as_str());

        let mut fixed = false;
        if project.task_count != total || project.completed_tasks != completed {
            project.task_count = total;
            project.completed_tasks = completed;
            fixed = true;
        }
        if let Some(name) = client_name {
            if project.client_name != name {
                project.client_name = name.to_string();
                fixed = true;
            }
        }
        if fixed {
            project.updated_at = now;
            report.projects_fixed += 1;
        }
    }

    for client in clients.iter_mut() {
        let count = projects.iter().filter(|p| p.client_id == client.id).count() as u32;
        if client.project_count != count {
            client.project_count = count;
            client.updated_at = now;
            report.clients_fixed += 1;
        }
    }

    if report.tasks_fixed > 0 {
        store::save(kv, TASKS_KEY, &tasks)?;
    }
    if report.projects_fixed > 0 {
        store::save(kv, PROJECTS_KEY, &projects)?;
    }
    if report.clients_fixed > 0 {
        store::save(kv, CLIENTS_KEY, &clients)?;
    }

    tracing::info!(
        clients = report.clients_fixed,
        projects = report.projects_fixed,
        tasks = report.tasks_fixed,
        "Derived field repair complete"
    );
    Ok(report)
}
