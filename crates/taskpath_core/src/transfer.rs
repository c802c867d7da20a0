//! Snapshot export and merge/replace import.
//!
//! # Responsibility
//! - Produce the export file format consumed by backup/share flows.
//! - Reconcile an external bundle against local collections.
//!
//! # Invariants
//! - Export never mutates local state.
//! - Import validates the whole bundle before the first write; a malformed
//!   payload leaves every collection untouched.

use crate::model::category::Category;
use crate::model::settings::Settings;
use crate::model::task::{Task, TaskValidationError};
use crate::repo::side_store::{CategoryStore, SettingsStore};
use crate::repo::task_store::{StoreError, TaskStore};
use crate::storage::{keys, StorageBackend};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from import/export operations.
#[derive(Debug)]
pub enum TransferError {
    /// Payload did not decode to a bundle with a well-formed tasks array.
    MalformedBundle(String),
    /// A bundle task failed structural validation.
    InvalidTask(TaskValidationError),
    Encode(serde_json::Error),
    Store(StoreError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedBundle(message) => {
                write!(f, "malformed import bundle: {message}")
            }
            Self::InvalidTask(err) => write!(f, "invalid task in bundle: {err}"),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedBundle(_) => None,
            Self::InvalidTask(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Export snapshot metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub version: String,
    #[serde(rename = "exportDate")]
    pub export_date: String,
    pub platform: String,
}

/// Payload section of a snapshot.
///
/// `categories` and `settings` are optional on input so minimal bundles
/// import cleanly; export always emits all three sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportData {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub settings: Option<Settings>,
}

/// Full export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub metadata: ExportMetadata,
    pub data: ExportData,
}

/// Reconciliation policy for imported tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPolicy {
    /// Union by id; the imported copy wins collisions, local-only tasks
    /// are preserved.
    Merge,
    /// Local collections are fully overwritten by the bundle.
    Replace,
}

/// Counts describing what an import did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub replaced: usize,
    pub preserved: usize,
}

/// Import/export service over the stores.
pub struct TransferService<'a, S: StorageBackend> {
    backend: &'a S,
    tasks: TaskStore<'a, S>,
    categories: CategoryStore<'a, S>,
    settings: SettingsStore<'a, S>,
}

impl<'a, S: StorageBackend> TransferService<'a, S> {
    pub fn new(backend: &'a S) -> Self {
        Self {
            backend,
            tasks: TaskStore::new(backend),
            categories: CategoryStore::new(backend),
            settings: SettingsStore::new(backend),
        }
    }

    /// Builds a pretty-printed snapshot of the full local state.
    ///
    /// Read-only; tasks are the union of both collections, each carrying
    /// its `archived` flag.
    pub fn export_snapshot(&self, platform: &str) -> Result<String, TransferError> {
        let mut tasks = self.tasks.active();
        tasks.extend(self.tasks.archived());

        let snapshot = ExportSnapshot {
            metadata: ExportMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                export_date: Utc::now().to_rfc3339(),
                platform: platform.to_string(),
            },
            data: ExportData {
                tasks,
                categories: self.categories.all(),
                settings: Some(self.settings.load()),
            },
        };

        let payload =
            serde_json::to_string_pretty(&snapshot).map_err(TransferError::Encode)?;
        info!(
            "event=export_build module=transfer status=ok tasks={}",
            snapshot.data.tasks.len()
        );
        Ok(payload)
    }

    /// Applies an external bundle under the given policy.
    ///
    /// Accepts a full snapshot or a bare `{tasks, categories, settings}`
    /// bundle. All validation happens before the first write.
    pub fn import(
        &self,
        payload: &str,
        policy: ImportPolicy,
    ) -> Result<ImportSummary, TransferError> {
        let bundle = decode_bundle(payload)?;
        for task in &bundle.tasks {
            task.validate().map_err(TransferError::InvalidTask)?;
        }
        let incoming = dedupe_last_wins(bundle.tasks);

        let summary = match policy {
            ImportPolicy::Replace => self.apply_replace(&incoming)?,
            ImportPolicy::Merge => self.apply_merge(&incoming)?,
        };

        if !bundle.categories.is_empty() {
            self.merge_categories(bundle.categories, policy)?;
        }
        if let Some(settings) = &bundle.settings {
            self.settings.save(settings)?;
        }

        info!(
            "event=import_apply module=transfer status=ok policy={policy:?} added={} replaced={} preserved={}",
            summary.added, summary.replaced, summary.preserved
        );
        Ok(summary)
    }

    fn apply_replace(&self, incoming: &[Task]) -> Result<ImportSummary, TransferError> {
        let local_ids: std::collections::HashSet<_> = self
            .tasks
            .active()
            .iter()
            .chain(self.tasks.archived().iter())
            .map(|task| task.id)
            .collect();

        let (active, archived) = split_by_archived(incoming.to_vec());
        self.write_task_collections(&active, &archived)?;

        let replaced = incoming
            .iter()
            .filter(|task| local_ids.contains(&task.id))
            .count();
        Ok(ImportSummary {
            added: incoming.len() - replaced,
            replaced,
            preserved: 0,
        })
    }

    fn apply_merge(&self, incoming: &[Task]) -> Result<ImportSummary, TransferError> {
        let mut active = self.tasks.active();
        let mut archived = self.tasks.archived();
        let mut summary = ImportSummary {
            preserved: active.len() + archived.len(),
            ..ImportSummary::default()
        };

        for task in incoming {
            let in_active = active.iter().position(|local| local.id == task.id);
            let in_archived = archived.iter().position(|local| local.id == task.id);

            match (in_active, in_archived) {
                (Some(index), _) if !task.archived => active[index] = task.clone(),
                (Some(index), _) => {
                    active.remove(index);
                    archived.push(task.clone());
                }
                (None, Some(index)) if task.archived => archived[index] = task.clone(),
                (None, Some(index)) => {
                    archived.remove(index);
                    active.push(task.clone());
                }
                (None, None) => {
                    if task.archived {
                        archived.push(task.clone());
                    } else {
                        active.push(task.clone());
                    }
                    summary.added += 1;
                    continue;
                }
            }
            summary.replaced += 1;
            summary.preserved -= 1;
        }

        self.write_task_collections(&active, &archived)?;
        Ok(summary)
    }

    fn merge_categories(
        &self,
        incoming: Vec<Category>,
        policy: ImportPolicy,
    ) -> Result<(), TransferError> {
        let merged = match policy {
            ImportPolicy::Replace => incoming,
            ImportPolicy::Merge => {
                let mut merged = self.categories.all();
                for category in incoming {
                    match merged.iter().position(|local| local.id == category.id) {
                        Some(index) => merged[index] = category,
                        None => merged.push(category),
                    }
                }
                merged
            }
        };
        self.categories.save(&merged)?;
        Ok(())
    }

    fn write_task_collections(
        &self,
        active: &[Task],
        archived: &[Task],
    ) -> Result<(), TransferError> {
        let active_blob =
            serde_json::to_string(active).map_err(TransferError::Encode)?;
        let archived_blob =
            serde_json::to_string(archived).map_err(TransferError::Encode)?;
        self.backend
            .set(keys::ACTIVE_TASKS, &active_blob)
            .map_err(StoreError::Storage)?;
        self.backend
            .set(keys::ARCHIVED_TASKS, &archived_blob)
            .map_err(StoreError::Storage)?;
        Ok(())
    }
}

fn decode_bundle(payload: &str) -> Result<ExportData, TransferError> {
    #[derive(Deserialize)]
    struct SnapshotDoc {
        data: ExportData,
    }

    if let Ok(doc) = serde_json::from_str::<SnapshotDoc>(payload) {
        return Ok(doc.data);
    }

    serde_json::from_str::<ExportData>(payload)
        .map_err(|err| TransferError::MalformedBundle(err.to_string()))
}

/// Keeps the last occurrence of every id, preserving first-seen order.
fn dedupe_last_wins(tasks: Vec<Task>) -> Vec<Task> {
    let mut result: Vec<Task> = Vec::with_capacity(tasks.len());
    for task in tasks {
        if let Some(index) = result.iter().position(|seen| seen.id == task.id) {
            result[index] = task;
        } else {
            result.push(task);
        }
    }
    result
}

fn split_by_archived(tasks: Vec<Task>) -> (Vec<Task>, Vec<Task>) {
    let mut active = Vec::new();
    let mut archived = Vec::new();
    for mut task in tasks {
        if task.archived {
            archived.push(task);
        } else {
            // Normalize stragglers: membership is the source of truth.
            task.archived_at = None;
            active.push(task);
        }
    }
    (active, archived)
}
