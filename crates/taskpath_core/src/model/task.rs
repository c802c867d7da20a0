//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by every core subsystem.
//! - Validate structural rules before any write reaches storage.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `completed` is mutated only through the lifecycle service.
//! - `predecessor_ids` never contains the task's own id or duplicates.

use crate::model::category::CategoryId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a task.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// Task priority.
///
/// Declaration order doubles as sort rank: `High` sorts before `Normal`
/// sorts before `Low`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

/// Recurrence cadence for a repetition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatKind {
    Daily,
    Weekly,
    Monthly,
}

/// Recurrence rule attached to a task.
///
/// Instance generation happens above this crate; the rule is validated
/// structurally and carried through store and import/export unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repetition {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: RepeatKind,
    /// Cadence multiplier, e.g. every 2 weeks. Must be at least 1.
    pub interval: u32,
    /// Weekday selection for weekly rules, 0 = Sunday through 6 = Saturday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<BTreeSet<u8>>,
}

/// Structural validation failures for a task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming.
    BlankTitle,
    /// A task may not name itself as a predecessor.
    SelfPredecessor(TaskId),
    /// The same predecessor id appears more than once.
    DuplicatePredecessor(TaskId),
    /// Repetition interval must be at least 1.
    ZeroRepetitionInterval,
    /// Weekday values must be in 0..=6.
    InvalidWeekday(u8),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::SelfPredecessor(id) => {
                write!(f, "task may not be its own predecessor: {id}")
            }
            Self::DuplicatePredecessor(id) => {
                write!(f, "duplicate predecessor id: {id}")
            }
            Self::ZeroRepetitionInterval => {
                write!(f, "repetition interval must be at least 1")
            }
            Self::InvalidWeekday(value) => {
                write!(f, "repetition weekday must be 0..=6, got {value}")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// Serialized with camelCase keys to match the collection blobs and export
/// files produced by the mobile app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable global id used for predecessor links and import matching.
    pub id: TaskId,
    /// Display title. Trimmed and non-empty.
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    /// Category reference. Not enforced referentially; a dangling id is
    /// rendered as "Uncategorized".
    #[serde(default)]
    pub category: Option<CategoryId>,
    /// Due instant in epoch milliseconds.
    pub due_date: i64,
    /// Creation instant in epoch milliseconds. Set once, never mutated.
    pub created_at: i64,
    #[serde(default)]
    pub completed: bool,
    /// Mirrors which collection currently holds the task.
    #[serde(default)]
    pub archived: bool,
    /// Archive bookkeeping stamp, cleared on restore.
    #[serde(default)]
    pub archived_at: Option<i64>,
    /// Tasks that must be completed before this one can complete.
    /// Order is user-facing only; it carries no dependency semantics.
    #[serde(default)]
    pub predecessor_ids: Vec<TaskId>,
    #[serde(default)]
    pub repetition: Option<Repetition>,
    /// Reminder fire instant in epoch milliseconds.
    #[serde(default)]
    pub reminder_at: Option<i64>,
}

impl Task {
    /// Creates a new task with a generated stable id.
    pub fn new(title: impl Into<String>, due_date: i64, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), title, due_date, created_at)
    }

    /// Creates a task with a caller-provided stable id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: TaskId,
        title: impl Into<String>,
        due_date: i64,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            priority: Priority::Normal,
            category: None,
            due_date,
            created_at,
            completed: false,
            archived: false,
            archived_at: None,
            predecessor_ids: Vec::new(),
            repetition: None,
            reminder_at: None,
        }
    }

    /// Checks structural rules that must hold before any persisted write.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }

        let mut seen = HashSet::new();
        for id in &self.predecessor_ids {
            if *id == self.id {
                return Err(TaskValidationError::SelfPredecessor(*id));
            }
            if !seen.insert(*id) {
                return Err(TaskValidationError::DuplicatePredecessor(*id));
            }
        }

        if let Some(repetition) = &self.repetition {
            if repetition.interval == 0 {
                return Err(TaskValidationError::ZeroRepetitionInterval);
            }
            if let Some(days) = &repetition.days_of_week {
                if let Some(bad) = days.iter().find(|day| **day > 6) {
                    return Err(TaskValidationError::InvalidWeekday(*bad));
                }
            }
        }

        Ok(())
    }

    /// Returns whether the task is past due and still open.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.due_date < now_ms && !self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, RepeatKind, Repetition, Task, TaskValidationError};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    #[test]
    fn new_task_starts_open_and_unarchived() {
        let task = Task::new("Water plants", 1_000, 500);
        assert!(!task.completed);
        assert!(!task.archived);
        assert!(task.archived_at.is_none());
        assert!(task.predecessor_ids.is_empty());
        assert_eq!(task.priority, Priority::Normal);
    }

    #[test]
    fn validate_rejects_blank_title() {
        let task = Task::new("   ", 1_000, 500);
        assert_eq!(task.validate(), Err(TaskValidationError::BlankTitle));
    }

    #[test]
    fn validate_rejects_self_and_duplicate_predecessors() {
        let mut task = Task::new("Pack bags", 1_000, 500);
        task.predecessor_ids = vec![task.id];
        assert!(matches!(
            task.validate(),
            Err(TaskValidationError::SelfPredecessor(id)) if id == task.id
        ));

        let other = Uuid::new_v4();
        task.predecessor_ids = vec![other, other];
        assert!(matches!(
            task.validate(),
            Err(TaskValidationError::DuplicatePredecessor(id)) if id == other
        ));
    }

    #[test]
    fn validate_checks_repetition_rule() {
        let mut task = Task::new("Stretch", 1_000, 500);
        task.repetition = Some(Repetition {
            enabled: true,
            kind: RepeatKind::Weekly,
            interval: 0,
            days_of_week: None,
        });
        assert_eq!(
            task.validate(),
            Err(TaskValidationError::ZeroRepetitionInterval)
        );

        task.repetition = Some(Repetition {
            enabled: true,
            kind: RepeatKind::Weekly,
            interval: 1,
            days_of_week: Some(BTreeSet::from([1, 9])),
        });
        assert_eq!(task.validate(), Err(TaskValidationError::InvalidWeekday(9)));
    }

    #[test]
    fn overdue_requires_past_due_and_open() {
        let mut task = Task::new("Pay rent", 1_000, 500);
        assert!(task.is_overdue(2_000));
        assert!(!task.is_overdue(999));

        task.completed = true;
        assert!(!task.is_overdue(2_000));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let task = Task::new("Read", 1_000, 500);
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"dueDate\":1000"));
        assert!(json.contains("\"createdAt\":500"));
        assert!(json.contains("\"predecessorIds\":[]"));
    }

    #[test]
    fn priority_sorts_high_first() {
        let mut priorities = vec![Priority::Low, Priority::High, Priority::Normal];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![Priority::High, Priority::Normal, Priority::Low]
        );
    }
}
