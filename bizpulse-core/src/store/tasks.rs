//! Task record store
//!
//! Unlike clients and projects, a missing task is reported as `None`/`false`
//! rather than an error.

use super::{load, load_strict, new_id, require_non_negative, save, TASKS_KEY};
use crate::consistency;
use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use crate::types::{NewTask, Task, TaskStatus, TaskUpdate};
use chrono::{DateTime, Utc};

/// Repository over the task collection.
pub struct TaskStore<'a> {
    kv: &'a dyn KeyValueStore,
}

impl<'a> TaskStore<'a> {
    pub fn new(kv: &'a dyn KeyValueStore) -> Self {
        Self { kv }
    }

    /// All tasks in insertion order; empty if storage cannot be read.
    pub fn get_all(&self) -> Vec<Task> {
        load(self.kv, TASKS_KEY)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Task> {
        self.get_all().into_iter().find(|t| t.id == id)
    }

    pub fn get_by_project(&self, project_id: &str) -> Vec<Task> {
        self.get_all()
            .into_iter()
            .filter(|t| t.project_id == project_id)
            .collect()
    }

    pub fn get_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.get_all()
            .into_iter()
            .filter(|t| t.status == status)
            .collect()
    }

    pub fn get_by_assignee(&self, user_id: &str) -> Vec<Task> {
        self.get_all()
            .into_iter()
            .filter(|t| t.assigned_to.contains(user_id))
            .collect()
    }

    /// Open tasks whose due date is before `now`.
    pub fn get_overdue(&self, now: DateTime<Utc>) -> Vec<Task> {
        self.get_all()
            .into_iter()
            .filter(|t| t.is_overdue(now))
            .collect()
    }

    pub fn add(&self, new: NewTask) -> Result<Task> {
        if new.title.trim().is_empty() {
            return Err(Error::Validation("task title must not be empty".to_string()));
        }
        require_non_negative("estimated_hours", new.estimated_hours)?;

        let mut tasks: Vec<Task> = load_strict(self.kv, TASKS_KEY)?;
        let now = Utc::now();
        let task = Task {
            id: new_id(),
            title: new.title,
            description: new.description,
            project_id: new.project_id,
            assigned_to: new.assigned_to,
            status: new.status,
            priority: new.priority,
            estimated_hours: new.estimated_hours,
            actual_hours: 0.0,
            dependencies: new.dependencies,
            due_date: new.due_date,
            completed_at: (new.status == TaskStatus::Completed).then_some(now),
            created_at: now,
            updated_at: now,
        };
        tasks.push(task.clone());
        save(self.kv, TASKS_KEY, &tasks)?;

        consistency::refresh_project_task_counts(self.kv, &task.project_id);

        tracing::info!(task_id = %task.id, project_id = %task.project_id, "Task created");
        Ok(task)
    }

    /// Apply a partial update; `Ok(None)` when the task does not exist.
    pub fn update(&self, id: &str, update: TaskUpdate) -> Result<Option<Task>> {
        if update.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(Error::Validation("task title must not be empty".to_string()));
        }
        if update
            .dependencies
            .as_ref()
            .is_some_and(|deps| deps.contains(id))
        {
            return Err(Error::Validation(format!(
                "task {} cannot depend on itself",
                id
            )));
        }

        let mut tasks: Vec<Task> = load_strict(self.kv, TASKS_KEY)?;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        let previous_project = task.project_id.clone();
        let previous_status = task.status;
        let now = Utc::now();

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = Some(description);
        }
        if let Some(project_id) = update.project_id {
            task.project_id = project_id;
        }
        if let Some(assigned_to) = update.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(estimated_hours) = update.estimated_hours {
            require_non_negative("estimated_hours", estimated_hours)?;
            task.estimated_hours = estimated_hours;
        }
        if let Some(dependencies) = update.dependencies {
            task.dependencies = dependencies;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }

        let was_completed = previous_status == TaskStatus::Completed;
        let is_completed = task.status == TaskStatus::Completed;
        if is_completed && !was_completed {
            task.completed_at = Some(now);
        } else if was_completed && !is_completed {
            task.completed_at = None;
        }
        task.updated_at = now;

        let updated = task.clone();
        save(self.kv, TASKS_KEY, &tasks)?;

        if updated.project_id != previous_project {
            consistency::refresh_project_task_counts(self.kv, &previous_project);
            consistency::refresh_project_task_counts(self.kv, &updated.project_id);
        } else if updated.status != previous_status {
            consistency::refresh_project_task_counts(self.kv, &updated.project_id);
        }

        tracing::info!(task_id = %updated.id, status = updated.status.as_str(), "Task updated");
        Ok(Some(updated))
    }

    /// Delete a task and drop it from every other task's dependencies.
    ///
    /// Returns `false` when the task does not exist.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut tasks: Vec<Task> = load_strict(self.kv, TASKS_KEY)?;
        let Some(index) = tasks.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        let removed = tasks.remove(index);

        let now = Utc::now();
        for task in tasks.iter_mut() {
            if task.dependencies.remove(id) {
                task.updated_at = now;
            }
        }
        save(self.kv, TASKS_KEY, &tasks)?;

        consistency::refresh_project_task_counts(self.kv, &removed.project_id);

        tracing::info!(task_id = id, "Task deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::test_db;
    use crate::types::{NewClient, NewProject, Project};
    use crate::{ClientStore, ProjectStore};
    use chrono::Duration;
    use std::collections::BTreeSet;

    fn project(db: &dyn KeyValueStore) -> Project {
        let client = ClientStore::new(db)
            .add(NewClient::new("Acme", "ops@acme.test"))
            .unwrap();
        ProjectStore::new(db)
            .add(NewProject::new("Site", &client.id))
            .unwrap()
    }

    fn counts(db: &dyn KeyValueStore, project_id: &str) -> (u32, u32) {
        let p = ProjectStore::new(db).get_by_id(project_id).unwrap();
        (p.task_count, p.completed_tasks)
    }

    #[test]
    fn test_task_counts_follow_status_changes() {
        let db = test_db();
        let project = project(&db);
        let store = TaskStore::new(&db);

        let a = store.add(NewTask::new("A", &project.id)).unwrap();
        store
            .add(NewTask::new("B", &project.id).with_status(TaskStatus::Completed))
            .unwrap();
        assert_eq!(counts(&db, &project.id), (2, 1));

        store
            .update(
                &a.id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(counts(&db, &project.id), (2, 2));

        store.delete(&a.id).unwrap();
        assert_eq!(counts(&db, &project.id), (1, 1));
    }

    #[test]
    fn test_completed_at_tracks_transitions() {
        let db = test_db();
        let project = project(&db);
        let store = TaskStore::new(&db);

        let task = store.add(NewTask::new("A", &project.id)).unwrap();
        assert!(task.completed_at.is_none());

        let done = store
            .update(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        let completed_at = done.completed_at.expect("completed_at set on completion");

        // Editing a completed task keeps the original completion time
        let renamed = store
            .update(
                &task.id,
                TaskUpdate {
                    title: Some("A2".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(renamed.completed_at, Some(completed_at));

        let reopened = store
            .update(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(reopened.completed_at.is_none());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let db = test_db();
        let project = project(&db);
        let store = TaskStore::new(&db);
        let task = store.add(NewTask::new("A", &project.id)).unwrap();

        let result = store.update(
            &task.id,
            TaskUpdate {
                dependencies: Some(BTreeSet::from([task.id.clone()])),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_delete_removes_from_dependencies() {
        let db = test_db();
        let project = project(&db);
        let store = TaskStore::new(&db);
        let a = store.add(NewTask::new("A", &project.id)).unwrap();
        let mut new_b = NewTask::new("B", &project.id);
        new_b.dependencies.insert(a.id.clone());
        let b = store.add(new_b).unwrap();

        assert!(store.delete(&a.id).unwrap());
        let b = store.get_by_id(&b.id).unwrap();
        assert!(b.dependencies.is_empty());
    }

    #[test]
    fn test_missing_task_returns_none_and_false() {
        let db = test_db();
        let store = TaskStore::new(&db);
        assert!(store.update("nope", TaskUpdate::default()).unwrap().is_none());
        assert!(!store.delete("nope").unwrap());
    }

    #[test]
    fn test_moving_task_between_projects() {
        let db = test_db();
        let first = project(&db);
        let second = project(&db);
        let store = TaskStore::new(&db);
        let task = store.add(NewTask::new("A", &first.id)).unwrap();

        store
            .update(
                &task.id,
                TaskUpdate {
                    project_id: Some(second.id.clone()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(counts(&db, &first.id), (0, 0));
        assert_eq!(counts(&db, &second.id), (1, 0));
    }

    #[test]
    fn test_queries() {
        let db = test_db();
        let project = project(&db);
        let store = TaskStore::new(&db);
        let now = Utc::now();

        store
            .add(
                NewTask::new("Late", &project.id)
                    .with_due_date(now - Duration::days(2))
                    .assigned("u1"),
            )
            .unwrap();
        store
            .add(
                NewTask::new("Late but done", &project.id)
                    .with_due_date(now - Duration::days(2))
                    .with_status(TaskStatus::Completed),
            )
            .unwrap();
        store
            .add(NewTask::new("Future", &project.id).with_due_date(now + Duration::days(2)))
            .unwrap();

        assert_eq!(store.get_overdue(now).len(), 1);
        assert_eq!(store.get_by_assignee("u1").len(), 1);
        assert_eq!(store.get_by_status(TaskStatus::Todo).len(), 2);
        assert_eq!(store.get_by_project(&project.id).len(), 3);
    }

    #[test]
    fn test_update_clears_due_date_and_rejects_blank_title() {
        let db = test_db();
        let project = project(&db);
        let store = TaskStore::new(&db);
        let task = store
            .add(NewTask::new("A", &project.id).with_due_date(Utc::now() + Duration::days(3)))
            .unwrap();

        let unchanged = store
            .update(&task.id, TaskUpdate::default())
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.due_date, task.due_date);

        let cleared = store
            .update(
                &task.id,
                TaskUpdate {
                    due_date: Some(None),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(cleared.due_date.is_none());

        let result = store.update(
            &task.id,
            TaskUpdate {
                title: Some("   ".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.get_by_id(&task.id).unwrap().title, "A");
    }
}
