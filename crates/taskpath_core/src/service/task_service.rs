//! Task lifecycle service.
//!
//! # Responsibility
//! - Govern Active-Incomplete / Active-Completed / Archived transitions.
//! - Gate completion on the predecessor graph and reject cycle-forming
//!   predecessor writes before any mutation.
//! - Keep reminder schedules aligned with task changes.
//!
//! # Invariants
//! - Completion is refused while a resolvable predecessor is incomplete;
//!   the refusal carries every blocking task's id and title.
//! - Only completed active tasks can be archived.
//! - Restore changes collection membership only; `completed` is preserved.

use crate::graph::{incomplete_predecessors, would_create_cycle};
use crate::model::category::CategoryId;
use crate::model::task::{Priority, Repetition, Task, TaskId, TaskValidationError};
use crate::notify::{NotificationScheduler, ReminderPlanner};
use crate::repo::task_store::{StoreError, TaskStore};
use crate::storage::StorageBackend;
use chrono::Utc;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One unmet predecessor in a refused completion, with the display title
/// callers surface to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedPredecessor {
    pub id: TaskId,
    pub title: String,
}

/// Errors from lifecycle operations.
#[derive(Debug)]
pub enum TaskServiceError {
    Validation(TaskValidationError),
    NotFound(TaskId),
    DuplicateId(TaskId),
    /// The proposed predecessor set would close a cycle.
    CycleDetected(TaskId),
    /// Completion refused; every unmet predecessor is listed.
    CompletionBlocked { blocking: Vec<BlockedPredecessor> },
    /// Archive refused because the task is not completed.
    ArchiveIncomplete { task_id: TaskId, title: String },
    Store(StoreError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::DuplicateId(id) => write!(f, "task id already exists: {id}"),
            Self::CycleDetected(id) => {
                write!(f, "predecessors would create a cycle through task {id}")
            }
            Self::CompletionBlocked { blocking } => {
                let titles: Vec<&str> =
                    blocking.iter().map(|entry| entry.title.as_str()).collect();
                write!(f, "completion blocked by: {}", titles.join(", "))
            }
            Self::ArchiveIncomplete { title, .. } => {
                write!(f, "cannot archive incomplete task: {title}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TaskServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::DuplicateId(id) => Self::DuplicateId(id),
            other => Self::Store(other),
        }
    }
}

/// Request model for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Option<CategoryId>,
    /// Due instant in epoch milliseconds.
    pub due_date: i64,
    pub predecessor_ids: Vec<TaskId>,
    pub repetition: Option<Repetition>,
    pub reminder_at: Option<i64>,
}

/// Result of a completion toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub task: Task,
    /// True when the auto-archive sweep moved the task in the same call.
    pub auto_archived: bool,
}

/// Lifecycle service over the task store.
pub struct TaskService<'a, S: StorageBackend> {
    store: TaskStore<'a, S>,
    reminders: ReminderPlanner<'a>,
}

impl<'a, S: StorageBackend> TaskService<'a, S> {
    /// Creates a service without reminder plumbing.
    pub fn new(backend: &'a S) -> Self {
        Self {
            store: TaskStore::new(backend),
            reminders: ReminderPlanner::disabled(),
        }
    }

    /// Creates a service that emits reminder requests to `scheduler`.
    pub fn with_scheduler(backend: &'a S, scheduler: &'a dyn NotificationScheduler) -> Self {
        Self {
            store: TaskStore::new(backend),
            reminders: ReminderPlanner::new(scheduler),
        }
    }

    /// Reads the active collection.
    pub fn active(&self) -> Vec<Task> {
        self.store.active()
    }

    /// Reads the archived collection.
    pub fn archived(&self) -> Vec<Task> {
        self.store.archived()
    }

    /// Looks a task up across both collections.
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.store.get(id)
    }

    /// Creates a task in the active collection.
    pub fn create_task(&self, draft: NewTask) -> Result<Task, TaskServiceError> {
        let title = normalize_title(&draft.title)?;
        let predecessor_ids = dedupe_predecessors(draft.predecessor_ids);

        let task = Task {
            id: TaskId::new_v4(),
            title,
            description: draft.description,
            priority: draft.priority,
            category: draft.category,
            due_date: draft.due_date,
            created_at: now_ms(),
            completed: false,
            archived: false,
            archived_at: None,
            predecessor_ids,
            repetition: draft.repetition,
            reminder_at: draft.reminder_at,
        };

        if would_create_cycle(task.id, &task.predecessor_ids, &self.all_tasks()) {
            return Err(TaskServiceError::CycleDetected(task.id));
        }

        self.store.add(task.clone())?;
        self.reminders.sync(&task);
        info!(
            "event=task_create module=service status=ok task_id={} predecessors={}",
            task.id,
            task.predecessor_ids.len()
        );
        Ok(task)
    }

    /// Updates task fields in place.
    ///
    /// The predecessor set is re-checked against the graph; a cycle-forming
    /// update is refused before any mutation.
    pub fn update_task(&self, mut task: Task) -> Result<Task, TaskServiceError> {
        task.title = normalize_title(&task.title)?;
        task.predecessor_ids = dedupe_predecessors(task.predecessor_ids);

        let existing = self
            .store
            .get(task.id)
            .ok_or(TaskServiceError::NotFound(task.id))?;

        if would_create_cycle(task.id, &task.predecessor_ids, &self.all_tasks()) {
            return Err(TaskServiceError::CycleDetected(task.id));
        }

        // Creation stamp, completion, and archive state are not
        // caller-mutable; completion moves only through the toggle.
        task.created_at = existing.created_at;
        task.completed = existing.completed;
        task.archived = existing.archived;
        task.archived_at = existing.archived_at;

        self.store.update(task.clone())?;
        if task.due_date != existing.due_date || task.reminder_at != existing.reminder_at {
            self.reminders.sync(&task);
        }
        Ok(task)
    }

    /// Replaces a task's predecessor set.
    ///
    /// Self-references and cycle-forming sets are refused; on refusal no
    /// task's predecessors change.
    pub fn set_predecessors(
        &self,
        id: TaskId,
        predecessor_ids: Vec<TaskId>,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self
            .store
            .get(id)
            .ok_or(TaskServiceError::NotFound(id))?;
        let predecessor_ids = dedupe_predecessors(predecessor_ids);

        if would_create_cycle(id, &predecessor_ids, &self.all_tasks()) {
            return Err(TaskServiceError::CycleDetected(id));
        }

        task.predecessor_ids = predecessor_ids;
        self.store.update(task.clone())?;
        Ok(task)
    }

    /// Toggles completion.
    ///
    /// Completing is gated on the predecessor graph; the refusal lists every
    /// unmet predecessor and mutates nothing. Un-completing has no
    /// precondition. With `auto_archive_enabled`, a newly completed task is
    /// swept to the archive in the same call.
    pub fn toggle_completion(
        &self,
        id: TaskId,
        auto_archive_enabled: bool,
    ) -> Result<ToggleOutcome, TaskServiceError> {
        let active = self.store.active();
        let task = active
            .iter()
            .find(|task| task.id == id)
            .ok_or(TaskServiceError::NotFound(id))?;

        if !task.completed {
            let all = self.all_tasks();
            let blocking: Vec<BlockedPredecessor> = incomplete_predecessors(task, &all)
                .into_iter()
                .map(|predecessor| BlockedPredecessor {
                    id: predecessor.id,
                    title: predecessor.title.clone(),
                })
                .collect();
            if !blocking.is_empty() {
                info!(
                    "event=task_toggle module=service status=blocked task_id={id} blockers={}",
                    blocking.len()
                );
                return Err(TaskServiceError::CompletionBlocked { blocking });
            }

            let mut updated = task.clone();
            updated.completed = true;
            self.store.update(updated.clone())?;
            self.reminders.cancel(id);
            info!("event=task_toggle module=service status=ok task_id={id} completed=true");

            if auto_archive_enabled {
                let stamp = now_ms();
                self.store.archive(id, stamp)?;
                updated.archived = true;
                updated.archived_at = Some(stamp);
                return Ok(ToggleOutcome {
                    task: updated,
                    auto_archived: true,
                });
            }

            return Ok(ToggleOutcome {
                task: updated,
                auto_archived: false,
            });
        }

        let mut updated = task.clone();
        updated.completed = false;
        self.store.update(updated.clone())?;
        info!("event=task_toggle module=service status=ok task_id={id} completed=false");
        Ok(ToggleOutcome {
            task: updated,
            auto_archived: false,
        })
    }

    /// Archives one completed active task.
    pub fn archive_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        let active = self.store.active();
        let task = active
            .iter()
            .find(|task| task.id == id)
            .ok_or(TaskServiceError::NotFound(id))?;
        if !task.completed {
            return Err(TaskServiceError::ArchiveIncomplete {
                task_id: id,
                title: task.title.clone(),
            });
        }
        self.store.archive(id, now_ms())?;
        Ok(())
    }

    /// Sweeps every completed active task to the archive.
    ///
    /// Returns the ids that moved, in collection order.
    pub fn archive_completed(&self) -> Result<Vec<TaskId>, TaskServiceError> {
        let completed: Vec<TaskId> = self
            .store
            .active()
            .iter()
            .filter(|task| task.completed)
            .map(|task| task.id)
            .collect();

        let stamp = now_ms();
        for id in &completed {
            self.store.archive(*id, stamp)?;
        }
        info!(
            "event=archive_sweep module=service status=ok moved={}",
            completed.len()
        );
        Ok(completed)
    }

    /// Restores an archived task to the active collection.
    ///
    /// Membership only: `completed` keeps whatever value it had at archive
    /// time, and the archive stamp is cleared.
    pub fn restore_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.store.restore(id)?;
        Ok(())
    }

    /// Deletes a task from whichever collection holds it.
    ///
    /// Permitted from any state. Other tasks' predecessor lists are not
    /// repaired; dangling references become vacuously satisfied.
    pub fn delete_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.reminders.cancel(id);
        self.store.delete(id)?;
        Ok(())
    }

    fn all_tasks(&self) -> Vec<Task> {
        let mut all = self.store.active();
        all.extend(self.store.archived());
        all
    }
}

fn normalize_title(value: &str) -> Result<String, TaskServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskServiceError::Validation(TaskValidationError::BlankTitle));
    }
    Ok(trimmed.to_string())
}

fn dedupe_predecessors(ids: Vec<TaskId>) -> Vec<TaskId> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
