//! Category and settings side collections.
//!
//! Tasks reference these by id but do not own them. Both persist as one
//! JSON blob per collection, read total and written whole, like the task
//! collections.

use crate::model::category::Category;
use crate::model::settings::Settings;
use crate::repo::task_store::StoreResult;
use crate::storage::{keys, StorageBackend};
use log::error;

/// Store over the category collection.
pub struct CategoryStore<'a, S: StorageBackend> {
    backend: &'a S,
}

impl<'a, S: StorageBackend> CategoryStore<'a, S> {
    pub fn new(backend: &'a S) -> Self {
        Self { backend }
    }

    /// Reads all categories. Total; degrades to empty on failure.
    pub fn all(&self) -> Vec<Category> {
        match self.backend.get(keys::CATEGORIES) {
            Ok(None) => Vec::new(),
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(categories) => categories,
                Err(err) => {
                    error!(
                        "event=collection_read module=repo status=error key={} error={err}",
                        keys::CATEGORIES
                    );
                    Vec::new()
                }
            },
            Err(err) => {
                error!(
                    "event=collection_read module=repo status=error key={} error={err}",
                    keys::CATEGORIES
                );
                Vec::new()
            }
        }
    }

    /// Replaces the whole collection.
    pub fn save(&self, categories: &[Category]) -> StoreResult<()> {
        let blob = serde_json::to_string(categories)?;
        self.backend.set(keys::CATEGORIES, &blob)?;
        Ok(())
    }
}

/// Store over the settings blob.
pub struct SettingsStore<'a, S: StorageBackend> {
    backend: &'a S,
}

impl<'a, S: StorageBackend> SettingsStore<'a, S> {
    pub fn new(backend: &'a S) -> Self {
        Self { backend }
    }

    /// Reads settings. Total; degrades to defaults on failure.
    pub fn load(&self) -> Settings {
        match self.backend.get(keys::SETTINGS) {
            Ok(None) => Settings::default(),
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(settings) => settings,
                Err(err) => {
                    error!(
                        "event=collection_read module=repo status=error key={} error={err}",
                        keys::SETTINGS
                    );
                    Settings::default()
                }
            },
            Err(err) => {
                error!(
                    "event=collection_read module=repo status=error key={} error={err}",
                    keys::SETTINGS
                );
                Settings::default()
            }
        }
    }

    /// Replaces the settings blob.
    pub fn save(&self, settings: &Settings) -> StoreResult<()> {
        let blob = serde_json::to_string(settings)?;
        self.backend.set(keys::SETTINGS, &blob)?;
        Ok(())
    }
}
