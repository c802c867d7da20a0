//! Reminder scheduling plumbing.
//!
//! # Responsibility
//! - Define the scheduler seam the platform notification service plugs into.
//! - Track the live schedule per task so stale requests are cancelled before
//!   new ones are issued.
//!
//! # Invariants
//! - At most one pending schedule exists per task id.
//! - Core only emits schedule/cancel requests; delivery belongs to the
//!   platform.

use crate::model::task::{Task, TaskId};
use log::info;
use std::cell::RefCell;
use std::collections::HashMap;

/// Opaque handle for a scheduled notification.
pub type ScheduleId = u64;

/// Fire-and-forget notification scheduler seam.
pub trait NotificationScheduler {
    fn schedule(&self, fire_at_epoch_ms: i64, title: &str, body: &str) -> ScheduleId;
    fn cancel(&self, schedule_id: ScheduleId);
}

/// Per-task reminder bookkeeping over a scheduler.
///
/// Constructed without a scheduler when reminders are disabled; every
/// operation is then a no-op.
pub struct ReminderPlanner<'a> {
    scheduler: Option<&'a dyn NotificationScheduler>,
    pending: RefCell<HashMap<TaskId, ScheduleId>>,
}

impl<'a> ReminderPlanner<'a> {
    /// Creates a planner that emits requests to `scheduler`.
    pub fn new(scheduler: &'a dyn NotificationScheduler) -> Self {
        Self {
            scheduler: Some(scheduler),
            pending: RefCell::new(HashMap::new()),
        }
    }

    /// Creates a planner that never emits requests.
    pub fn disabled() -> Self {
        Self {
            scheduler: None,
            pending: RefCell::new(HashMap::new()),
        }
    }

    /// Aligns the pending schedule with the task's current reminder state.
    ///
    /// Cancels any prior request for the task first; completed tasks and
    /// tasks without a reminder end up with no pending schedule.
    pub fn sync(&self, task: &Task) {
        self.cancel(task.id);

        let Some(scheduler) = self.scheduler else {
            return;
        };
        let Some(fire_at) = task.reminder_at else {
            return;
        };
        if task.completed {
            return;
        }

        let body = task
            .description
            .clone()
            .unwrap_or_else(|| "Task is due".to_string());
        let schedule_id = scheduler.schedule(fire_at, &task.title, &body);
        self.pending.borrow_mut().insert(task.id, schedule_id);
        info!(
            "event=reminder_schedule module=notify status=ok task_id={} fire_at={fire_at}",
            task.id
        );
    }

    /// Cancels the pending schedule for a task, if any.
    pub fn cancel(&self, task_id: TaskId) {
        let previous = self.pending.borrow_mut().remove(&task_id);
        if let (Some(scheduler), Some(schedule_id)) = (self.scheduler, previous) {
            scheduler.cancel(schedule_id);
        }
    }
}
