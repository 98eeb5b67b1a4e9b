use jiff::Timestamp;
use jiff::civil::{Date, DateTime};
use tracing::{debug, info, warn};

use crate::{
    models::{
        expiry::classify,
        store::Store,
        task::{Task, TaskId, next_task_id, normalize_tag},
    },
    storage::{Storage, StorageError},
};

/// Days a task may stay overdue before the sweep removes it
pub const DEFAULT_EXPIRY_THRESHOLD_DAYS: i64 = 3;

/// Owns the task collection and writes it back after every change.
///
/// Operations on an id that does not exist are no-ops and return `None` (or
/// `false`); only persistence failures are reported as errors. The in-memory
/// collection keeps a mutation even when saving it fails.
pub struct TaskRepository<S: Storage> {
    storage: S,
    store: Store,
    /// Set while the last save failed
    unsaved: bool,
}

impl<S: Storage> TaskRepository<S> {
    pub fn open(storage: S) -> Result<Self, StorageError> {
        let store = storage.load()?;
        debug!(tasks = store.tasks.len(), "opened task repository");
        Ok(Self {
            storage,
            store,
            unsaved: false,
        })
    }

    /// Replaces the in-memory collection with what the storage currently holds.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.store = self.storage.load()?;
        self.unsaved = false;
        Ok(())
    }

    /// Shuts the repository down. If the last save did not go through, the
    /// collection is written once more.
    pub fn close(self) -> Result<(), StorageError> {
        if self.unsaved {
            debug!("writing unsaved changes on close");
            self.storage.save(&self.store)?;
        }
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.store.tasks
    }

    pub fn len(&self) -> usize {
        self.store.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.store.get_task(id)
    }

    pub fn add(
        &mut self,
        text: &str,
        tag: Option<&str>,
        deadline: Option<Date>,
    ) -> Result<Option<Task>, StorageError> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring add with empty text");
            return Ok(None);
        }

        let now = Timestamp::now();
        let Some(id) = next_task_id(now, self.store.last_task_id()) else {
            warn!("no task id left above the largest stored id, task not added");
            return Ok(None);
        };
        let task = Task::new(id, text.to_string(), normalize_tag(tag), deadline, now);

        self.store.tasks.push(task.clone());
        self.persist()?;
        debug!(id, "added task");
        Ok(Some(task))
    }

    pub fn update(
        &mut self,
        id: TaskId,
        text: &str,
        tag: Option<&str>,
        deadline: Option<Date>,
    ) -> Result<Option<Task>, StorageError> {
        let text = text.trim();
        if text.is_empty() {
            debug!(id, "ignoring update with empty text");
            return Ok(None);
        }

        let Some(task) = self.store.get_task_mut(id) else {
            return Ok(None);
        };
        task.text = text.to_string();
        task.tag = normalize_tag(tag);
        task.deadline = deadline;
        task.updated_at = Some(Timestamp::now());

        let updated = task.clone();
        self.persist()?;
        debug!(id, "updated task");
        Ok(Some(updated))
    }

    pub fn delete(&mut self, id: TaskId) -> Result<Option<Task>, StorageError> {
        let Some(index) = self.store.tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };

        let removed = self.store.tasks.remove(index);
        self.persist()?;
        debug!(id, "deleted task");
        Ok(Some(removed))
    }

    pub fn toggle_completed(&mut self, id: TaskId) -> Result<Option<Task>, StorageError> {
        self.modify(id, |task| task.completed = !task.completed)
    }

    pub fn toggle_pinned(&mut self, id: TaskId) -> Result<Option<Task>, StorageError> {
        self.modify(id, |task| task.is_pinned = !task.is_pinned)
    }

    /// Removes every task. Returns how many were removed.
    pub fn clear_all(&mut self) -> Result<usize, StorageError> {
        let count = self.store.tasks.len();
        self.store.tasks.clear();
        self.persist()?;
        debug!(count, "cleared all tasks");
        Ok(count)
    }

    /// Removes tasks that have been overdue for more than `threshold_days`.
    pub fn sweep_expired(
        &mut self,
        now: DateTime,
        threshold_days: i64,
    ) -> Result<Vec<Task>, StorageError> {
        let (expired, kept): (Vec<Task>, Vec<Task>) =
            std::mem::take(&mut self.store.tasks)
                .into_iter()
                .partition(|task| {
                    classify(task.deadline, now)
                        .is_some_and(|status| status.days_remaining < -threshold_days)
                });
        self.store.tasks = kept;

        if !expired.is_empty() {
            self.persist()?;
            info!(count = expired.len(), threshold_days, "swept expired tasks");
        }
        Ok(expired)
    }

    /// Reloads the collection and sweeps it. Nothing is swept, and nothing
    /// written, when the reload fails.
    pub fn refresh(
        &mut self,
        now: DateTime,
        threshold_days: i64,
    ) -> Result<Vec<Task>, StorageError> {
        self.reload()?;
        self.sweep_expired(now, threshold_days)
    }

    fn modify(
        &mut self,
        id: TaskId,
        change: impl FnOnce(&mut Task),
    ) -> Result<Option<Task>, StorageError> {
        let Some(task) = self.store.get_task_mut(id) else {
            return Ok(None);
        };
        change(task);

        let modified = task.clone();
        self.persist()?;
        Ok(Some(modified))
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let result = self.storage.save(&self.store);
        self.unsaved = result.is_err();
        result
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
