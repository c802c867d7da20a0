//! Core domain logic for TaskPath.
//! This crate is the single source of truth for business invariants.

pub mod graph;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod storage;
pub mod transfer;

pub use graph::{incomplete_predecessors, predecessors_satisfied, would_create_cycle};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{default_categories, Category, CategoryId, UNCATEGORIZED_NAME};
pub use model::settings::Settings;
pub use model::task::{
    Priority, RepeatKind, Repetition, Task, TaskId, TaskValidationError,
};
pub use notify::{NotificationScheduler, ReminderPlanner, ScheduleId};
pub use repo::side_store::{CategoryStore, SettingsStore};
pub use repo::task_store::{StoreError, StoreResult, TaskStore};
pub use service::category_service::{CategoryService, CategoryServiceError};
pub use service::task_service::{
    BlockedPredecessor, NewTask, TaskService, TaskServiceError, ToggleOutcome,
};
pub use storage::{
    keys, MemoryStorage, SqliteStorage, StorageBackend, StorageError, StorageResult,
};
pub use transfer::{
    ExportData, ExportMetadata, ExportSnapshot, ImportPolicy, ImportSummary, TransferError,
    TransferService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
