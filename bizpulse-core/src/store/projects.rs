//! Project record store

use super::{load, load_strict, new_id, require_non_negative, save, CLIENTS_KEY, PROJECTS_KEY};
use crate::consistency;
use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use crate::types::{Client, NewProject, Project, ProjectStatus, ProjectUpdate};
use chrono::Utc;

/// Repository over the project collection.
pub struct ProjectStore<'a> {
    kv: &'a dyn KeyValueStore,
}

impl<'a> ProjectStore<'a> {
    pub fn new(kv: &'a dyn KeyValueStore) -> Self {
        Self { kv }
    }

    /// All projects in insertion order; empty if storage cannot be read.
    pub fn get_all(&self) -> Vec<Project> {
        load(self.kv, PROJECTS_KEY)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Project> {
        self.get_all().into_iter().find(|p| p.id == id)
    }

    pub fn get_by_client(&self, client_id: &str) -> Vec<Project> {
        self.get_all()
            .into_iter()
            .filter(|p| p.client_id == client_id)
            .collect()
    }

    pub fn get_by_status(&self, status: ProjectStatus) -> Vec<Project> {
        self.get_all()
            .into_iter()
            .filter(|p| p.status == status)
            .collect()
    }

    fn client_name(&self, client_id: &str) -> Result<String> {
        let clients: Vec<Client> = load_strict(self.kv, CLIENTS_KEY)?;
        clients
            .into_iter()
            .find(|c| c.id == client_id)
            .map(|c| c.name)
            .ok_or_else(|| Error::ClientNotFound(client_id.to_string()))
    }

    /// Create a project for an existing client.
    pub fn add(&self, new: NewProject) -> Result<Project> {
        if new.title.trim().is_empty() {
            return Err(Error::Validation("project title must not be empty".to_string()));
        }
        validate_amounts(
            new.budget,
            new.total_spent,
            new.hourly_rate,
            new.estimated_hours,
        )?;
        let client_name = self.client_name(&new.client_id)?;

        let mut projects: Vec<Project> = load_strict(self.kv, PROJECTS_KEY)?;
        let now = Utc::now();
        let project = Project {
            id: new_id(),
            title: new.title,
            description: new.description,
            client_id: new.client_id,
            client_name,
            status: new.status,
            priority: new.priority,
            budget: new.budget,
            total_spent: new.total_spent,
            hourly_rate: new.hourly_rate,
            estimated_hours: new.estimated_hours,
            task_count: 0,
            completed_tasks: 0,
            start_date: new.start_date,
            end_date: new.end_date,
            deadline: new.deadline,
            created_at: now,
            updated_at: now,
        };
        projects.push(project.clone());
        save(self.kv, PROJECTS_KEY, &projects)?;

        consistency::refresh_client_project_count(self.kv, &project.client_id);

        tracing::info!(project_id = %project.id, client_id = %project.client_id, "Project created");
        Ok(project)
    }

    /// Apply a partial update. Moving to another client re-caches its name
    /// and recomputes both clients' project counts.
    pub fn update(&self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let moved_to = match update.client_id.as_deref() {
            Some(client_id) => Some((client_id.to_string(), self.client_name(client_id)?)),
            None => None,
        };

        let mut projects: Vec<Project> = load_strict(self.kv, PROJECTS_KEY)?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;
        let previous_client = project.client_id.clone();

        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(Error::Validation("project title must not be empty".to_string()));
            }
            project.title = title;
        }
        if let Some(description) = update.description {
            project.description = Some(description);
        }
        if let Some((client_id, client_name)) = moved_to {
            project.client_id = client_id;
            project.client_name = client_name;
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        if let Some(priority) = update.priority {
            project.priority = priority;
        }
        if let Some(budget) = update.budget {
            project.budget = budget;
        }
        if let Some(total_spent) = update.total_spent {
            project.total_spent = total_spent;
        }
        if let Some(hourly_rate) = update.hourly_rate {
            project.hourly_rate = hourly_rate;
        }
        if let Some(estimated_hours) = update.estimated_hours {
            project.estimated_hours = estimated_hours;
        }
        if let Some(start_date) = update.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            project.end_date = end_date;
        }
        if let Some(deadline) = update.deadline {
            project.deadline = deadline;
        }
        validate_amounts(
            project.budget,
            project.total_spent,
            project.hourly_rate,
            project.estimated_hours,
        )?;
        project.updated_at = Utc::now();
        let updated = project.clone();
        save(self.kv, PROJECTS_KEY, &projects)?;

        if updated.client_id != previous_client {
            consistency::refresh_client_project_count(self.kv, &previous_client);
            consistency::refresh_client_project_count(self.kv, &updated.client_id);
        }

        tracing::info!(project_id = %updated.id, "Project updated");
        Ok(updated)
    }

    /// Delete a project. Its tasks and time entries are left in place.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut projects: Vec<Project> = load_strict(self.kv, PROJECTS_KEY)?;
        let index = projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;
        let removed = projects.remove(index);
        save(self.kv, PROJECTS_KEY, &projects)?;

        consistency::refresh_client_project_count(self.kv, &removed.client_id);

        tracing::info!(project_id = id, "Project deleted");
        Ok(())
    }

    /// Overwrite the cached client name on every project of `client_id`.
    pub fn resync_client_name(&self, client_id: &str, name: &str) {
        consistency::resync_client_name(self.kv, client_id, name);
    }
}

fn validate_amounts(budget: f64, total_spent: f64, hourly_rate: f64, hours: f64) -> Result<()> {
    require_non_negative("budget", budget)?;
    require_non_negative("total_spent", total_spent)?;
    require_non_negative("hourly_rate", hourly_rate)?;
    require_non_negative("estimated_hours", hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::test_db;
    use crate::types::NewClient;
    use crate::ClientStore;

    fn client(db: &dyn KeyValueStore, name: &str) -> Client {
        ClientStore::new(db)
            .add(NewClient::new(name, format!("{}@example.test", name)))
            .unwrap()
    }

    #[test]
    fn test_add_caches_client_name_and_counts() {
        let db = test_db();
        let acme = client(&db, "acme");
        let store = ProjectStore::new(&db);

        let project = store.add(NewProject::new("Site", &acme.id)).unwrap();
        assert_eq!(project.client_name, "acme");
        assert_eq!(project.task_count, 0);

        let acme = ClientStore::new(&db).get_by_id(&acme.id).unwrap();
        assert_eq!(acme.project_count, 1);
    }

    #[test]
    fn test_add_for_unknown_client_fails() {
        let db = test_db();
        let result = ProjectStore::new(&db).add(NewProject::new("Site", "ghost"));
        assert!(matches!(result, Err(Error::ClientNotFound(_))));
        assert!(ProjectStore::new(&db).get_all().is_empty());
    }

    #[test]
    fn test_moving_project_updates_both_clients() {
        let db = test_db();
        let acme = client(&db, "acme");
        let globex = client(&db, "globex");
        let store = ProjectStore::new(&db);
        let project = store.add(NewProject::new("Site", &acme.id)).unwrap();

        let moved = store
            .update(
                &project.id,
                ProjectUpdate {
                    client_id: Some(globex.id.clone()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(moved.client_name, "globex");

        let clients = ClientStore::new(&db);
        assert_eq!(clients.get_by_id(&acme.id).unwrap().project_count, 0);
        assert_eq!(clients.get_by_id(&globex.id).unwrap().project_count, 1);
    }

    #[test]
    fn test_update_and_delete_missing_project() {
        let db = test_db();
        let store = ProjectStore::new(&db);
        assert!(matches!(
            store.update("nope", ProjectUpdate::default()),
            Err(Error::ProjectNotFound(_))
        ));
        assert!(matches!(store.delete("nope"), Err(Error::ProjectNotFound(_))));
    }

    #[test]
    fn test_negative_budget_rejected() {
        let db = test_db();
        let acme = client(&db, "acme");
        let mut new = NewProject::new("Site", &acme.id);
        new.budget = -10.0;
        assert!(matches!(
            ProjectStore::new(&db).add(new),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_get_by_client_and_status() {
        let db = test_db();
        let acme = client(&db, "acme");
        let store = ProjectStore::new(&db);
        let a = store.add(NewProject::new("A", &acme.id)).unwrap();
        store.add(NewProject::new("B", &acme.id)).unwrap();
        store
            .update(
                &a.id,
                ProjectUpdate {
                    status: Some(ProjectStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.get_by_client(&acme.id).len(), 2);
        assert_eq!(store.get_by_status(ProjectStatus::Completed).len(), 1);
        assert_eq!(store.get_by_status(ProjectStatus::Active).len(), 1);
    }

    #[test]
    fn test_update_sets_and_clears_dates() {
        let db = test_db();
        let acme = client(&db, "acme");
        let store = ProjectStore::new(&db);
        let project = store.add(NewProject::new("Site", &acme.id)).unwrap();
        let deadline = Utc::now() + chrono::Duration::days(30);

        let dated = store
            .update(
                &project.id,
                ProjectUpdate {
                    start_date: Some(Some(project.created_at)),
                    deadline: Some(Some(deadline)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(dated.deadline, Some(deadline));
        assert_eq!(dated.start_date, Some(project.created_at));

        let cleared = store
            .update(
                &project.id,
                ProjectUpdate {
                    deadline: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(cleared.deadline.is_none());
        assert_eq!(cleared.start_date, Some(project.created_at));
    }
}
