//! Core domain types for bizpulse
//!
//! These types are the records persisted by the record stores and consumed by
//! the analytics engine.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Client** | A customer that projects are delivered for |
//! | **Project** | A piece of work for one Client, with budget and rate |
//! | **Task** | A unit of work inside a Project |
//! | **TimeEntry** | Minutes tracked against a Task, optionally billable |
//! | **ActiveTimer** | A timer in progress; at most one exists at a time |
//!
//! ### Derived fields
//!
//! Some fields are never supplied by callers and are recomputed from related
//! records by [`crate::consistency`]:
//! - [`Client::project_count`]
//! - [`Project::task_count`] and [`Project::completed_tasks`]
//! - [`Task::actual_hours`]
//!
//! [`Project::client_name`] is a cached copy of the client's name, re-synced
//! whenever the client is renamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================
// Client
// ============================================

/// Lifecycle state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Inactive,
    Pending,
    Archived,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Pending => "pending",
            ClientStatus::Archived => "archived",
        }
    }
}

impl std::str::FromStr for ClientStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            "pending" => Ok(ClientStatus::Pending),
            "archived" => Ok(ClientStatus::Archived),
            _ => Err(format!("unknown client status: {}", s)),
        }
    }
}

/// A customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub status: ClientStatus,
    /// Number of projects pointing at this client (derived)
    pub project_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub status: ClientStatus,
}

impl NewClient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            company: None,
            address: None,
            status: ClientStatus::Active,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_status(mut self, status: ClientStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial update for a client; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub status: Option<ClientStatus>,
}

// ============================================
// Project
// ============================================

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "on_hold" => Ok(ProjectStatus::OnHold),
            "completed" => Ok(ProjectStatus::Completed),
            "cancelled" => Ok(ProjectStatus::Cancelled),
            _ => Err(format!("unknown project status: {}", s)),
        }
    }
}

/// Priority shared by projects and tasks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(format!("unknown priority: {}", s)),
        }
    }
}

/// A piece of work delivered for one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub client_id: String,
    /// Cached copy of the client's name
    pub client_name: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub budget: f64,
    pub total_spent: f64,
    pub hourly_rate: f64,
    pub estimated_hours: f64,
    /// Number of tasks in this project (derived)
    pub task_count: u32,
    /// Number of completed tasks in this project (derived)
    pub completed_tasks: u32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub client_id: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub budget: f64,
    pub total_spent: f64,
    pub hourly_rate: f64,
    pub estimated_hours: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
}

impl NewProject {
    pub fn new(title: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            client_id: client_id.into(),
            status: ProjectStatus::Active,
            priority: Priority::default(),
            budget: 0.0,
            total_spent: 0.0,
            hourly_rate: 0.0,
            estimated_hours: 0.0,
            start_date: None,
            end_date: None,
            deadline: None,
        }
    }
}

/// Partial update for a project; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub client_id: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub budget: Option<f64>,
    pub total_spent: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub estimated_hours: Option<f64>,
    /// `Some(None)` clears the date.
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub deadline: Option<Option<DateTime<Utc>>>,
}

// ============================================
// Task
// ============================================

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "blocked" => Ok(TaskStatus::Blocked),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(format!("unknown task status: {}", s)),
        }
    }
}

/// A unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub project_id: String,
    pub assigned_to: BTreeSet<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub estimated_hours: f64,
    /// Sum of this task's time entries in hours, 2 decimals (derived)
    pub actual_hours: f64,
    /// IDs of tasks this one depends on; never contains its own ID
    pub dependencies: BTreeSet<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Set on transition into `Completed`, cleared on transition out
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether the task is past its due date and still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: String,
    pub assigned_to: BTreeSet<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub estimated_hours: f64,
    pub dependencies: BTreeSet<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            project_id: project_id.into(),
            assigned_to: BTreeSet::new(),
            status: TaskStatus::Todo,
            priority: Priority::default(),
            estimated_hours: 0.0,
            dependencies: BTreeSet::new(),
            due_date: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn assigned(mut self, user_id: impl Into<String>) -> Self {
        self.assigned_to.insert(user_id.into());
        self
    }
}

/// Partial update for a task; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub assigned_to: Option<BTreeSet<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub estimated_hours: Option<f64>,
    pub dependencies: Option<BTreeSet<String>>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
}

// ============================================
// Time tracking
// ============================================

/// Minutes tracked against a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub project_id: String,
    pub user_id: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Length in whole minutes
    pub duration: u32,
    pub billable: bool,
    /// Rate per hour; always 0 for non-billable entries
    pub hourly_rate: f64,
    pub tags: Vec<String>,
    pub is_running: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    /// Duration in hours (unrounded).
    pub fn hours(&self) -> f64 {
        self.duration as f64 / 60.0
    }

    /// Revenue earned by this entry; 0 when not billable.
    pub fn revenue(&self) -> f64 {
        if self.billable {
            self.hours() * self.hourly_rate
        } else {
            0.0
        }
    }
}

/// Input for logging a time entry.
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub task_id: String,
    pub project_id: String,
    pub user_id: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub billable: bool,
    pub hourly_rate: f64,
    pub tags: Vec<String>,
}

/// Partial update for a time entry; `None` leaves a field unchanged.
///
/// Changing either bound recomputes `duration`.
#[derive(Debug, Clone, Default)]
pub struct TimeEntryUpdate {
    pub task_id: Option<String>,
    pub project_id: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub billable: Option<bool>,
    pub hourly_rate: Option<f64>,
    pub tags: Option<Vec<String>>,
}

/// A timer in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    /// ID the materialised time entry will receive
    pub time_entry_id: String,
    pub task_id: String,
    pub project_id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub description: String,
    pub tags: Vec<String>,
    pub billable: bool,
    pub hourly_rate: f64,
}

impl ActiveTimer {
    /// Whole minutes elapsed at `now`, rounded to nearest and never negative.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u32 {
        minutes_between(self.start_time, now)
    }
}

/// Request to start a timer.
#[derive(Debug, Clone)]
pub struct StartTimer {
    pub task_id: String,
    pub project_id: String,
    pub user_id: String,
    pub description: String,
    pub tags: Vec<String>,
    pub billable: bool,
    pub hourly_rate: f64,
}

impl StartTimer {
    pub fn new(
        task_id: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            description: String::new(),
            tags: Vec::new(),
            billable: false,
            hourly_rate: 0.0,
        }
    }

    pub fn billable_at(mut self, hourly_rate: f64) -> Self {
        self.billable = true;
        self.hourly_rate = hourly_rate;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Rounded whole minutes from `start` to `end`, clamped at zero.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let secs = end.signed_duration_since(start).num_seconds().max(0);
    ((secs as f64) / 60.0).round() as u32
}
