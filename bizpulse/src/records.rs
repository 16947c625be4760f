//! Record subcommands: clients, projects, tasks, time entries and the timer.

use anyhow::{bail, Context, Result};
use bizpulse_core::format::{format_currency, format_minutes, format_relative_time};
use bizpulse_core::{
    Client, ClientStatus, ClientUpdate, NewClient, NewProject, NewTask, NewTimeEntry, Priority,
    Project, ProjectStatus, ProjectUpdate, StartTimer, Task, TaskStatus, TaskUpdate, TimeEntry,
};
use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;

use crate::args::{parse_amount, parse_date_end, parse_date_start, parse_datetime};
use crate::{print_json, CliContext, OutputFormat};

// ============================================
// Clients
// ============================================

#[derive(Subcommand)]
pub enum ClientCommand {
    /// Add a client
    Add {
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// active, inactive, pending or archived
        #[arg(long, default_value = "active")]
        status: ClientStatus,
    },
    /// List clients
    List {
        #[arg(long)]
        status: Option<ClientStatus>,
        /// Case-insensitive match on name, email or company
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a client and its projects
    Show { id: String },
    /// Update a client
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        status: Option<ClientStatus>,
    },
    /// Delete a client (its projects are kept)
    Delete { id: String },
}

pub fn client(ctx: &CliContext, cmd: ClientCommand) -> Result<()> {
    let store = ctx.workspace.clients();
    match cmd {
        ClientCommand::Add {
            name,
            email,
            phone,
            company,
            address,
            status,
        } => {
            let mut new = NewClient::new(name, email).with_status(status);
            new.phone = phone;
            new.company = company;
            new.address = address;
            let client = store.add(new).context("failed to add client")?;
            created(ctx, "client", &client.id, &client)
        }
        ClientCommand::List { status, search } => {
            let mut clients = match search {
                Some(query) => store.search(&query),
                None => store.get_all(),
            };
            if let Some(status) = status {
                clients.retain(|c| c.status == status);
            }
            match ctx.format {
                OutputFormat::Json => print_json(&clients),
                OutputFormat::Text => {
                    if clients.is_empty() {
                        println!("No clients found.");
                    }
                    for c in &clients {
                        print_client_row(c);
                    }
                    Ok(())
                }
            }
        }
        ClientCommand::Show { id } => {
            let client = store
                .get_by_id(&id)
                .with_context(|| format!("client not found: {}", id))?;
            let projects = ctx.workspace.projects().get_by_client(&id);
            match ctx.format {
                OutputFormat::Json => print_json(&client),
                OutputFormat::Text => {
                    println!("{}", client.name);
                    println!("  ID:       {}", client.id);
                    println!("  Email:    {}", client.email);
                    if let Some(company) = &client.company {
                        println!("  Company:  {}", company);
                    }
                    if let Some(phone) = &client.phone {
                        println!("  Phone:    {}", phone);
                    }
                    println!("  Status:   {}", client.status.as_str());
                    println!("  Projects: {}", client.project_count);
                    for p in &projects {
                        print_project_row(p);
                    }
                    Ok(())
                }
            }
        }
        ClientCommand::Update {
            id,
            name,
            email,
            phone,
            company,
            address,
            status,
        } => {
            let update = ClientUpdate {
                name,
                email,
                phone,
                company,
                address,
                status,
            };
            let client = store.update(&id, update).context("failed to update client")?;
            updated(ctx, "client", &client.id, &client)
        }
        ClientCommand::Delete { id } => {
            store.delete(&id).context("failed to delete client")?;
            deleted(ctx, "client", &id)
        }
    }
}

fn print_client_row(c: &Client) {
    println!(
        "{:<36}  {:<24}  {:<9}  {} project(s)",
        c.id,
        c.name,
        c.status.as_str(),
        c.project_count
    );
}

// ============================================
// Projects
// ============================================

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Add a project for an existing client
    Add {
        title: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        description: Option<String>,
        /// active, on_hold, completed or cancelled
        #[arg(long, default_value = "active")]
        status: ProjectStatus,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long, value_parser = parse_amount, default_value = "0")]
        budget: f64,
        /// Hourly rate
        #[arg(long, value_parser = parse_amount, default_value = "0")]
        rate: f64,
        /// Estimated hours
        #[arg(long, value_parser = parse_amount, default_value = "0")]
        estimate: f64,
        #[arg(long, value_parser = parse_datetime)]
        start_date: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_datetime)]
        deadline: Option<DateTime<Utc>>,
    },
    /// List projects
    List {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
    },
    /// Show a project and its tasks
    Show { id: String },
    /// Update a project
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Move the project to another client
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, value_parser = parse_amount)]
        budget: Option<f64>,
        /// Amount spent so far
        #[arg(long, value_parser = parse_amount)]
        spent: Option<f64>,
        #[arg(long, value_parser = parse_amount)]
        rate: Option<f64>,
        #[arg(long, value_parser = parse_amount)]
        estimate: Option<f64>,
        #[arg(long, value_parser = parse_datetime)]
        start_date: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_datetime)]
        end_date: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_datetime)]
        deadline: Option<DateTime<Utc>>,
        #[arg(long, conflicts_with = "start_date")]
        clear_start_date: bool,
        #[arg(long, conflicts_with = "end_date")]
        clear_end_date: bool,
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,
    },
    /// Delete a project (its tasks are kept)
    Delete { id: String },
}

pub fn project(ctx: &CliContext, cmd: ProjectCommand) -> Result<()> {
    let store = ctx.workspace.projects();
    match cmd {
        ProjectCommand::Add {
            title,
            client,
            description,
            status,
            priority,
            budget,
            rate,
            estimate,
            start_date,
            deadline,
        } => {
            let mut new = NewProject::new(title, client);
            new.description = description;
            new.status = status;
            new.priority = priority;
            new.budget = budget;
            new.hourly_rate = rate;
            new.estimated_hours = estimate;
            new.start_date = start_date;
            new.deadline = deadline;
            let project = store.add(new).context("failed to add project")?;
            created(ctx, "project", &project.id, &project)
        }
        ProjectCommand::List { client, status } => {
            let mut projects = match client {
                Some(client_id) => store.get_by_client(&client_id),
                None => store.get_all(),
            };
            if let Some(status) = status {
                projects.retain(|p| p.status == status);
            }
            match ctx.format {
                OutputFormat::Json => print_json(&projects),
                OutputFormat::Text => {
                    if projects.is_empty() {
                        println!("No projects found.");
                    }
                    for p in &projects {
                        print_project_row(p);
                    }
                    Ok(())
                }
            }
        }
        ProjectCommand::Show { id } => {
            let project = store
                .get_by_id(&id)
                .with_context(|| format!("project not found: {}", id))?;
            let tasks = ctx.workspace.tasks().get_by_project(&id);
            match ctx.format {
                OutputFormat::Json => print_json(&project),
                OutputFormat::Text => {
                    println!("{}", project.title);
                    println!("  ID:        {}", project.id);
                    println!("  Client:    {} ({})", project.client_name, project.client_id);
                    println!("  Status:    {}", project.status.as_str());
                    println!("  Priority:  {}", project.priority.as_str());
                    println!(
                        "  Budget:    {} (spent {})",
                        format_currency(project.budget),
                        format_currency(project.total_spent)
                    );
                    println!("  Rate:      {}/h", format_currency(project.hourly_rate));
                    println!(
                        "  Tasks:     {} of {} completed",
                        project.completed_tasks, project.task_count
                    );
                    if let Some(deadline) = project.deadline {
                        println!("  Deadline:  {}", deadline.format("%Y-%m-%d"));
                    }
                    for t in &tasks {
                        print_task_row(t);
                    }
                    Ok(())
                }
            }
        }
        ProjectCommand::Update {
            id,
            title,
            description,
            client,
            status,
            priority,
            budget,
            spent,
            rate,
            estimate,
            start_date,
            end_date,
            deadline,
            clear_start_date,
            clear_end_date,
            clear_deadline,
        } => {
            let update = ProjectUpdate {
                title,
                description,
                client_id: client,
                status,
                priority,
                budget,
                total_spent: spent,
                hourly_rate: rate,
                estimated_hours: estimate,
                start_date: date_change(start_date, clear_start_date),
                end_date: date_change(end_date, clear_end_date),
                deadline: date_change(deadline, clear_deadline),
            };
            let project = store.update(&id, update).context("failed to update project")?;
            updated(ctx, "project", &project.id, &project)
        }
        ProjectCommand::Delete { id } => {
            store.delete(&id).context("failed to delete project")?;
            deleted(ctx, "project", &id)
        }
    }
}

fn print_project_row(p: &Project) {
    println!(
        "{:<36}  {:<24}  {:<20}  {:<9}  {}/{} tasks",
        p.id,
        p.title,
        p.client_name,
        p.status.as_str(),
        p.completed_tasks,
        p.task_count
    );
}

// ============================================
// Tasks
// ============================================

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Add a task to a project
    Add {
        title: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        description: Option<String>,
        /// User to assign (repeatable)
        #[arg(long = "assign")]
        assigned_to: Vec<String>,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Estimated hours
        #[arg(long, value_parser = parse_amount, default_value = "0")]
        estimate: f64,
        #[arg(long, value_parser = parse_datetime)]
        due: Option<DateTime<Utc>>,
        /// Task this one depends on (repeatable)
        #[arg(long = "depends-on")]
        dependencies: Vec<String>,
    },
    /// List tasks
    List {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        assignee: Option<String>,
        /// Only tasks past their due date and not completed
        #[arg(long)]
        overdue: bool,
    },
    /// Change a task's status
    Status { id: String, status: TaskStatus },
    /// Delete a task
    Delete { id: String },
}

pub fn task(ctx: &CliContext, cmd: TaskCommand) -> Result<()> {
    let store = ctx.workspace.tasks();
    match cmd {
        TaskCommand::Add {
            title,
            project,
            description,
            assigned_to,
            priority,
            estimate,
            due,
            dependencies,
        } => {
            if ctx.workspace.projects().get_by_id(&project).is_none() {
                bail!("project not found: {}", project);
            }
            let mut new = NewTask::new(title, project);
            new.description = description;
            new.assigned_to = assigned_to.into_iter().collect();
            new.priority = priority;
            new.estimated_hours = estimate;
            new.due_date = due;
            new.dependencies = dependencies.into_iter().collect();
            let task = store.add(new).context("failed to add task")?;
            created(ctx, "task", &task.id, &task)
        }
        TaskCommand::List {
            project,
            status,
            assignee,
            overdue,
        } => {
            let now = Utc::now();
            let mut tasks = if overdue {
                store.get_overdue(now)
            } else {
                store.get_all()
            };
            if let Some(project) = project {
                tasks.retain(|t| t.project_id == project);
            }
            if let Some(status) = status {
                tasks.retain(|t| t.status == status);
            }
            if let Some(user) = assignee {
                tasks.retain(|t| t.assigned_to.contains(&user));
            }
            match ctx.format {
                OutputFormat::Json => print_json(&tasks),
                OutputFormat::Text => {
                    if tasks.is_empty() {
                        println!("No tasks found.");
                    }
                    for t in &tasks {
                        print_task_row(t);
                    }
                    Ok(())
                }
            }
        }
        TaskCommand::Status { id, status } => {
            let update = TaskUpdate {
                status: Some(status),
                ..Default::default()
            };
            match store.update(&id, update).context("failed to update task")? {
                Some(task) => updated(ctx, "task", &task.id, &task),
                None => bail!("task not found: {}", id),
            }
        }
        TaskCommand::Delete { id } => {
            if !store.delete(&id).context("failed to delete task")? {
                bail!("task not found: {}", id);
            }
            deleted(ctx, "task", &id)
        }
    }
}

/// `--clear-*` wins over leaving the date untouched.
fn date_change(value: Option<DateTime<Utc>>, clear: bool) -> Option<Option<DateTime<Utc>>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn print_task_row(t: &Task) {
    let due = t
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<36}  {:<28}  {:<11}  {:<6}  due {:<10}  {:.2}h",
        t.id,
        t.title,
        t.status.as_str(),
        t.priority.as_str(),
        due,
        t.actual_hours
    );
}

// ============================================
// Time entries
// ============================================

#[derive(Subcommand)]
pub enum TimeCommand {
    /// Log time against a task
    Log {
        #[arg(long)]
        task: String,
        /// Length in minutes
        #[arg(long)]
        minutes: u32,
        /// When the work started (defaults to `minutes` ago)
        #[arg(long, value_parser = parse_datetime)]
        start: Option<DateTime<Utc>>,
        #[arg(long)]
        description: Option<String>,
        /// Hourly rate; marks the entry billable
        #[arg(long, value_parser = parse_amount)]
        rate: Option<f64>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// List time entries
    List {
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        user: Option<String>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_start)]
        from: Option<DateTime<Utc>>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_end)]
        to: Option<DateTime<Utc>>,
    },
    /// Delete a time entry
    Delete { id: String },
}

pub fn time(ctx: &CliContext, cmd: TimeCommand) -> Result<()> {
    let store = ctx.workspace.time_entries();
    match cmd {
        TimeCommand::Log {
            task,
            minutes,
            start,
            description,
            rate,
            tags,
            user,
        } => {
            let task = ctx
                .workspace
                .tasks()
                .get_by_id(&task)
                .with_context(|| format!("task not found: {}", task))?;
            let length = Duration::minutes(minutes as i64);
            let start_time = start.unwrap_or_else(|| Utc::now() - length);
            let entry = store
                .add(NewTimeEntry {
                    task_id: task.id,
                    project_id: task.project_id,
                    user_id: user.unwrap_or_else(|| ctx.config.tracking.default_user_id.clone()),
                    description: description.unwrap_or_default(),
                    start_time,
                    end_time: start_time + length,
                    billable: rate.is_some(),
                    hourly_rate: rate.unwrap_or(0.0),
                    tags,
                })
                .context("failed to log time")?;
            created(ctx, "time entry", &entry.id, &entry)
        }
        TimeCommand::List {
            task,
            project,
            user,
            from,
            to,
        } => {
            let mut entries = match (from, to) {
                (None, None) => store.get_all(),
                (from, to) => store.get_by_date_range(
                    from.unwrap_or(DateTime::<Utc>::MIN_UTC),
                    to.unwrap_or(DateTime::<Utc>::MAX_UTC),
                ),
            };
            if let Some(task) = task {
                entries.retain(|e| e.task_id == task);
            }
            if let Some(project) = project {
                entries.retain(|e| e.project_id == project);
            }
            if let Some(user) = user {
                entries.retain(|e| e.user_id == user);
            }
            match ctx.format {
                OutputFormat::Json => print_json(&entries),
                OutputFormat::Text => {
                    if entries.is_empty() {
                        println!("No time entries found.");
                    }
                    let total: u32 = entries.iter().map(|e| e.duration).sum();
                    for e in &entries {
                        print_entry_row(e);
                    }
                    if !entries.is_empty() {
                        println!("Total: {}", format_minutes(total));
                    }
                    Ok(())
                }
            }
        }
        TimeCommand::Delete { id } => {
            if !store.delete(&id).context("failed to delete time entry")? {
                bail!("time entry not found: {}", id);
            }
            deleted(ctx, "time entry", &id)
        }
    }
}

fn print_entry_row(e: &TimeEntry) {
    let billing = if e.billable {
        format!("@ {}/h", format_currency(e.hourly_rate))
    } else {
        "non-billable".to_string()
    };
    println!(
        "{:<36}  {}  {:>8}  {:<16}  {}",
        e.id,
        e.start_time.format("%Y-%m-%d %H:%M"),
        format_minutes(e.duration),
        billing,
        e.description
    );
}

// ============================================
// Timer
// ============================================

#[derive(Subcommand)]
pub enum TimerCommand {
    /// Start timing a task, stopping any running timer first
    Start {
        #[arg(long)]
        task: String,
        #[arg(long)]
        description: Option<String>,
        /// Hourly rate; marks the entry billable
        #[arg(long, value_parser = parse_amount)]
        rate: Option<f64>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Stop the running timer and save it as a time entry
    Stop,
    /// Show the running timer
    Status,
}

pub fn timer(ctx: &CliContext, cmd: TimerCommand) -> Result<()> {
    let store = ctx.workspace.time_entries();
    match cmd {
        TimerCommand::Start {
            task,
            description,
            rate,
            user,
        } => {
            let task = ctx
                .workspace
                .tasks()
                .get_by_id(&task)
                .with_context(|| format!("task not found: {}", task))?;
            let user = user.unwrap_or_else(|| ctx.config.tracking.default_user_id.clone());
            let mut request = StartTimer::new(&task.id, &task.project_id, user);
            if let Some(rate) = rate {
                request = request.billable_at(rate);
            }
            if let Some(description) = description {
                request = request.with_description(description);
            }
            let timer = store.start_timer(request).context("failed to start timer")?;
            match ctx.format {
                OutputFormat::Json => print_json(&timer),
                OutputFormat::Text => {
                    println!("Timer started on {}", task.title);
                    Ok(())
                }
            }
        }
        TimerCommand::Stop => {
            let entry = store.stop_timer().context("failed to stop timer")?;
            match ctx.format {
                OutputFormat::Json => print_json(&entry),
                OutputFormat::Text => {
                    println!("Timer stopped: {}", format_minutes(entry.duration));
                    println!("Saved time entry {}", entry.id);
                    Ok(())
                }
            }
        }
        TimerCommand::Status => {
            let timer = store.get_active_timer();
            match ctx.format {
                OutputFormat::Json => print_json(&timer),
                OutputFormat::Text => {
                    match timer {
                        Some(timer) => {
                            let now = Utc::now();
                            println!(
                                "Running on task {} for {} (started {})",
                                timer.task_id,
                                format_minutes(timer.elapsed_minutes(now)),
                                format_relative_time(timer.start_time, now)
                            );
                        }
                        None => println!("No timer running."),
                    }
                    Ok(())
                }
            }
        }
    }
}

// ============================================
// Output helpers
// ============================================

fn created<T: serde::Serialize>(ctx: &CliContext, kind: &str, id: &str, record: &T) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Text => {
            println!("Created {} {}", kind, id);
            Ok(())
        }
    }
}

fn updated<T: serde::Serialize>(ctx: &CliContext, kind: &str, id: &str, record: &T) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Text => {
            println!("Updated {} {}", kind, id);
            Ok(())
        }
    }
}

fn deleted(ctx: &CliContext, kind: &str, id: &str) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "deleted": id })),
        OutputFormat::Text => {
            println!("Deleted {} {}", kind, id);
            Ok(())
        }
    }
}
