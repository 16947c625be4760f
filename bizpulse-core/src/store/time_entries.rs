//! Time entry record store and the single active timer

use super::{load, load_strict, new_id, require_non_negative, save, ACTIVE_TIMER_KEY, TIME_ENTRIES_KEY};
use crate::consistency;
use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use crate::types::{minutes_between, ActiveTimer, NewTimeEntry, StartTimer, TimeEntry, TimeEntryUpdate};
use chrono::{DateTime, Utc};

/// Repository over the time entry collection.
pub struct TimeEntryStore<'a> {
    kv: &'a dyn KeyValueStore,
}

impl<'a> TimeEntryStore<'a> {
    pub fn new(kv: &'a dyn KeyValueStore) -> Self {
        Self { kv }
    }

    /// All entries in insertion order; empty if storage cannot be read.
    pub fn get_all(&self) -> Vec<TimeEntry> {
        load(self.kv, TIME_ENTRIES_KEY)
    }

    pub fn get_by_id(&self, id: &str) -> Option<TimeEntry> {
        self.get_all().into_iter().find(|e| e.id == id)
    }

    pub fn get_by_task(&self, task_id: &str) -> Vec<TimeEntry> {
        self.get_all()
            .into_iter()
            .filter(|e| e.task_id == task_id)
            .collect()
    }

    pub fn get_by_project(&self, project_id: &str) -> Vec<TimeEntry> {
        self.get_all()
            .into_iter()
            .filter(|e| e.project_id == project_id)
            .collect()
    }

    pub fn get_by_user(&self, user_id: &str) -> Vec<TimeEntry> {
        self.get_all()
            .into_iter()
            .filter(|e| e.user_id == user_id)
            .collect()
    }

    /// Entries whose start time falls in `[start, end]`.
    pub fn get_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<TimeEntry> {
        self.get_all()
            .into_iter()
            .filter(|e| e.start_time >= start && e.start_time <= end)
            .collect()
    }

    pub fn add(&self, new: NewTimeEntry) -> Result<TimeEntry> {
        if new.end_time < new.start_time {
            return Err(Error::Validation(
                "time entry cannot end before it starts".to_string(),
            ));
        }
        require_non_negative("hourly_rate", new.hourly_rate)?;

        let now = Utc::now();
        let entry = TimeEntry {
            id: new_id(),
            task_id: new.task_id,
            project_id: new.project_id,
            user_id: new.user_id,
            description: new.description,
            start_time: new.start_time,
            end_time: new.end_time,
            duration: minutes_between(new.start_time, new.end_time),
            billable: new.billable,
            hourly_rate: if new.billable { new.hourly_rate } else { 0.0 },
            tags: new.tags,
            is_running: false,
            created_at: now,
            updated_at: now,
        };
        self.insert(entry)
    }

    fn insert(&self, entry: TimeEntry) -> Result<TimeEntry> {
        let mut entries: Vec<TimeEntry> = load_strict(self.kv, TIME_ENTRIES_KEY)?;
        // Ids are unique; a repeated id replaces the stored entry
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        save(self.kv, TIME_ENTRIES_KEY, &entries)?;

        consistency::refresh_task_actual_hours(self.kv, &entry.task_id);

        tracing::info!(
            entry_id = %entry.id,
            task_id = %entry.task_id,
            duration = entry.duration,
            "Time entry created"
        );
        Ok(entry)
    }

    /// Apply a partial update; `Ok(None)` when the entry does not exist.
    pub fn update(&self, id: &str, update: TimeEntryUpdate) -> Result<Option<TimeEntry>> {
        let mut entries: Vec<TimeEntry> = load_strict(self.kv, TIME_ENTRIES_KEY)?;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        let previous_task = entry.task_id.clone();

        if let Some(task_id) = update.task_id {
            entry.task_id = task_id;
        }
        if let Some(project_id) = update.project_id {
            entry.project_id = project_id;
        }
        if let Some(description) = update.description {
            entry.description = description;
        }
        if let Some(start_time) = update.start_time {
            entry.start_time = start_time;
        }
        if let Some(end_time) = update.end_time {
            entry.end_time = end_time;
        }
        if entry.end_time < entry.start_time {
            return Err(Error::Validation(
                "time entry cannot end before it starts".to_string(),
            ));
        }
        entry.duration = minutes_between(entry.start_time, entry.end_time);
        if let Some(billable) = update.billable {
            entry.billable = billable;
        }
        if let Some(hourly_rate) = update.hourly_rate {
            require_non_negative("hourly_rate", hourly_rate)?;
            entry.hourly_rate = hourly_rate;
        }
        if !entry.billable {
            entry.hourly_rate = 0.0;
        }
        if let Some(tags) = update.tags {
            entry.tags = tags;
        }
        entry.updated_at = Utc::now();

        let updated = entry.clone();
        save(self.kv, TIME_ENTRIES_KEY, &entries)?;

        consistency::refresh_task_actual_hours(self.kv, &updated.task_id);
        if updated.task_id != previous_task {
            consistency::refresh_task_actual_hours(self.kv, &previous_task);
        }

        tracing::info!(entry_id = %updated.id, "Time entry updated");
        Ok(Some(updated))
    }

    /// Delete an entry; `false` when it does not exist.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut entries: Vec<TimeEntry> = load_strict(self.kv, TIME_ENTRIES_KEY)?;
        let Some(index) = entries.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        let removed = entries.remove(index);
        save(self.kv, TIME_ENTRIES_KEY, &entries)?;

        consistency::refresh_task_actual_hours(self.kv, &removed.task_id);

        tracing::info!(entry_id = id, "Time entry deleted");
        Ok(true)
    }

    // ============================================
    // Timer
    // ============================================

    /// The running timer, if any.
    pub fn get_active_timer(&self) -> Option<ActiveTimer> {
        let raw = match self.kv.get(ACTIVE_TIMER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read active timer");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(error = %e, "Discarding unreadable active timer"))
            .ok()
    }

    pub fn start_timer(&self, request: StartTimer) -> Result<ActiveTimer> {
        self.start_timer_at(request, Utc::now())
    }

    /// Start a timer at `now`, first stopping any timer already running.
    pub fn start_timer_at(&self, request: StartTimer, now: DateTime<Utc>) -> Result<ActiveTimer> {
        require_non_negative("hourly_rate", request.hourly_rate)?;

        if self.get_active_timer().is_some() {
            let stopped = self.stop_timer_at(now)?;
            tracing::info!(entry_id = %stopped.id, "Stopped running timer before starting a new one");
        }

        let timer = ActiveTimer {
            time_entry_id: new_id(),
            task_id: request.task_id,
            project_id: request.project_id,
            user_id: request.user_id,
            start_time: now,
            description: request.description,
            tags: request.tags,
            billable: request.billable,
            hourly_rate: if request.billable { request.hourly_rate } else { 0.0 },
        };
        let raw = serde_json::to_string(&timer)?;
        self.kv
            .set(ACTIVE_TIMER_KEY, &raw)
            .map_err(|e| Error::Storage(format!("failed to save active timer: {}", e)))?;

        tracing::info!(task_id = %timer.task_id, "Timer started");
        Ok(timer)
    }

    pub fn stop_timer(&self) -> Result<TimeEntry> {
        self.stop_timer_at(Utc::now())
    }

    /// Stop the running timer at `now` and materialise it as a time entry.
    ///
    /// The timer is cleared before the entry is written and put back if the
    /// write fails, so a failed stop can be retried without duplicating time.
    pub fn stop_timer_at(&self, now: DateTime<Utc>) -> Result<TimeEntry> {
        let timer = self.get_active_timer().ok_or(Error::NoActiveTimer)?;
        let end_time = now.max(timer.start_time);

        self.kv
            .remove(ACTIVE_TIMER_KEY)
            .map_err(|e| Error::Storage(format!("failed to clear active timer: {}", e)))?;

        let entry = TimeEntry {
            id: timer.time_entry_id.clone(),
            task_id: timer.task_id.clone(),
            project_id: timer.project_id.clone(),
            user_id: timer.user_id.clone(),
            description: timer.description.clone(),
            start_time: timer.start_time,
            end_time,
            duration: minutes_between(timer.start_time, end_time),
            billable: timer.billable,
            hourly_rate: timer.hourly_rate,
            tags: timer.tags.clone(),
            is_running: false,
            created_at: now,
            updated_at: now,
        };
        let entry = match self.insert(entry) {
            Ok(entry) => entry,
            Err(e) => {
                self.restore_timer(&timer);
                return Err(e);
            }
        };

        tracing::info!(entry_id = %entry.id, duration = entry.duration, "Timer stopped");
        Ok(entry)
    }

    fn restore_timer(&self, timer: &ActiveTimer) {
        let restored = serde_json::to_string(timer)
            .map_err(Error::from)
            .and_then(|raw| self.kv.set(ACTIVE_TIMER_KEY, &raw));
        if let Err(e) = restored {
            tracing::error!(
                entry_id = %timer.time_entry_id,
                error = %e,
                "Failed to restore active timer after a failed stop"
            );
        }
    }
}
