//! Task store over the active and archived collections.
//!
//! # Responsibility
//! - Persist the two task collections as one JSON blob each.
//! - Provide mechanical add/update/delete/archive/restore operations.
//!
//! # Invariants
//! - A task id exists in at most one collection after any operation.
//! - Write paths call `Task::validate()` before touching storage.
//! - Collection reads never fail; they degrade to empty and log.

use crate::model::task::{Task, TaskId, TaskValidationError};
use crate::storage::{keys, StorageBackend, StorageError};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store mutations.
#[derive(Debug)]
pub enum StoreError {
    Validation(TaskValidationError),
    /// Id already present in the active or archived collection.
    DuplicateId(TaskId),
    NotFound(TaskId),
    Storage(StorageError),
    Encode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "task id already exists: {id}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode collection: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::DuplicateId(_) => None,
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Store over the active/archived task collections.
pub struct TaskStore<'a, S: StorageBackend> {
    backend: &'a S,
}

impl<'a, S: StorageBackend> TaskStore<'a, S> {
    pub fn new(backend: &'a S) -> Self {
        Self { backend }
    }

    /// Reads the active collection. Total; degrades to empty on failure.
    pub fn active(&self) -> Vec<Task> {
        self.read_collection(keys::ACTIVE_TASKS)
    }

    /// Reads the archived collection. Total; degrades to empty on failure.
    pub fn archived(&self) -> Vec<Task> {
        self.read_collection(keys::ARCHIVED_TASKS)
    }

    /// Looks a task up across both collections.
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.active()
            .into_iter()
            .chain(self.archived())
            .find(|task| task.id == id)
    }

    /// Appends a task to the active collection.
    ///
    /// Rejects ids already present in either collection.
    pub fn add(&self, task: Task) -> StoreResult<()> {
        task.validate()?;

        let mut active = self.active();
        let id_taken = active.iter().any(|existing| existing.id == task.id)
            || self.archived().iter().any(|existing| existing.id == task.id);
        if id_taken {
            return Err(StoreError::DuplicateId(task.id));
        }

        active.push(task);
        self.write_collection(keys::ACTIVE_TASKS, &active)
    }

    /// Replaces a task in place in whichever collection holds it.
    pub fn update(&self, task: Task) -> StoreResult<()> {
        task.validate()?;

        let mut active = self.active();
        if let Some(index) = active.iter().position(|existing| existing.id == task.id) {
            active[index] = task;
            return self.write_collection(keys::ACTIVE_TASKS, &active);
        }

        let mut archived = self.archived();
        if let Some(index) = archived.iter().position(|existing| existing.id == task.id) {
            archived[index] = task;
            return self.write_collection(keys::ARCHIVED_TASKS, &archived);
        }

        Err(StoreError::NotFound(task.id))
    }

    /// Removes a task from whichever collection holds it.
    pub fn delete(&self, id: TaskId) -> StoreResult<()> {
        let mut active = self.active();
        if let Some(index) = active.iter().position(|existing| existing.id == id) {
            active.remove(index);
            return self.write_collection(keys::ACTIVE_TASKS, &active);
        }

        let mut archived = self.archived();
        if let Some(index) = archived.iter().position(|existing| existing.id == id) {
            archived.remove(index);
            return self.write_collection(keys::ARCHIVED_TASKS, &archived);
        }

        Err(StoreError::NotFound(id))
    }

    /// Moves a task from the active to the archived collection.
    ///
    /// Mechanical only: the completed-tasks-only policy lives in the
    /// lifecycle service.
    pub fn archive(&self, id: TaskId, archived_at: i64) -> StoreResult<()> {
        let mut active = self.active();
        let Some(index) = active.iter().position(|existing| existing.id == id) else {
            return Err(StoreError::NotFound(id));
        };

        let mut task = active.remove(index);
        task.archived = true;
        task.archived_at = Some(archived_at);

        let mut archived = self.archived();
        archived.push(task);
        // Destination first: a failed second write leaves a duplicate, not a
        // lost task.
        self.write_collection(keys::ARCHIVED_TASKS, &archived)?;
        self.write_collection(keys::ACTIVE_TASKS, &active)
    }

    /// Moves a task from the archived to the active collection.
    ///
    /// Membership only: `completed` is preserved, the archive stamp is
    /// cleared.
    pub fn restore(&self, id: TaskId) -> StoreResult<()> {
        let mut archived = self.archived();
        let Some(index) = archived.iter().position(|existing| existing.id == id) else {
            return Err(StoreError::NotFound(id));
        };

        let mut task = archived.remove(index);
        task.archived = false;
        task.archived_at = None;

        let mut active = self.active();
        active.push(task);
        self.write_collection(keys::ACTIVE_TASKS, &active)?;
        self.write_collection(keys::ARCHIVED_TASKS, &archived)
    }

    fn read_collection(&self, key: &str) -> Vec<Task> {
        match self.backend.get(key) {
            Ok(None) => Vec::new(),
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(tasks) => tasks,
                Err(err) => {
                    error!(
                        "event=collection_read module=repo status=error key={key} error={err}"
                    );
                    Vec::new()
                }
            },
            Err(err) => {
                error!(
                    "event=collection_read module=repo status=error key={key} error={err}"
                );
                Vec::new()
            }
        }
    }

    fn write_collection(&self, key: &str, tasks: &[Task]) -> StoreResult<()> {
        let blob = serde_json::to_string(tasks)?;
        self.backend.set(key, &blob)?;
        Ok(())
    }
}
