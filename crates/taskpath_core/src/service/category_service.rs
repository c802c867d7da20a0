//! Category service.
//!
//! # Responsibility
//! - Category CRUD with seeded immutable defaults.
//! - Resolve task category references for display.
//!
//! # Invariants
//! - Names are unique case-insensitively, trimmed, non-empty.
//! - Default categories are never edited or deleted.
//! - Deleting a category does not cascade to tasks; dangling references
//!   render as "Uncategorized".

use crate::model::category::{default_categories, Category, CategoryId, UNCATEGORIZED_NAME};
use crate::repo::side_store::CategoryStore;
use crate::repo::task_store::StoreError;
use crate::storage::StorageBackend;
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from category operations.
#[derive(Debug)]
pub enum CategoryServiceError {
    /// Name is blank after trimming.
    InvalidName,
    /// Another category already uses the name (case-insensitive).
    DuplicateName(String),
    /// Seeded defaults cannot be edited or deleted.
    DefaultImmutable(CategoryId),
    NotFound(CategoryId),
    Store(StoreError),
}

impl Display for CategoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "category name must not be blank"),
            Self::DuplicateName(name) => {
                write!(f, "category name already in use: {name}")
            }
            Self::DefaultImmutable(id) => {
                write!(f, "default category cannot be changed: {id}")
            }
            Self::NotFound(id) => write!(f, "category not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CategoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CategoryServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Category service over the side store.
pub struct CategoryService<'a, S: StorageBackend> {
    store: CategoryStore<'a, S>,
}

impl<'a, S: StorageBackend> CategoryService<'a, S> {
    pub fn new(backend: &'a S) -> Self {
        Self {
            store: CategoryStore::new(backend),
        }
    }

    /// Lists categories, seeding the defaults on first access.
    pub fn list(&self) -> Vec<Category> {
        let categories = self.store.all();
        if !categories.is_empty() {
            return categories;
        }

        let defaults = default_categories();
        if let Err(err) = self.store.save(&defaults) {
            error!("event=category_seed module=service status=error error={err}");
        }
        defaults
    }

    /// Creates a user category.
    pub fn create(
        &self,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<Category, CategoryServiceError> {
        let name = normalize_name(name.into())?;
        let mut categories = self.list();
        ensure_name_free(&categories, &name, None)?;

        let category = Category::new(name, icon.into(), color.into());
        categories.push(category.clone());
        self.store.save(&categories)?;
        Ok(category)
    }

    /// Updates a user category's name, icon, or color.
    pub fn update(&self, updated: Category) -> Result<Category, CategoryServiceError> {
        let name = normalize_name(updated.name.clone())?;
        let mut categories = self.list();
        let Some(index) = categories
            .iter()
            .position(|category| category.id == updated.id)
        else {
            return Err(CategoryServiceError::NotFound(updated.id));
        };
        if categories[index].is_default {
            return Err(CategoryServiceError::DefaultImmutable(updated.id));
        }
        ensure_name_free(&categories, &name, Some(updated.id))?;

        // The stored flag wins; callers cannot promote a category to
        // default.
        let is_default = categories[index].is_default;
        categories[index] = Category {
            name,
            is_default,
            ..updated
        };
        let result = categories[index].clone();
        self.store.save(&categories)?;
        Ok(result)
    }

    /// Deletes a user category. Tasks referencing it are left untouched.
    pub fn delete(&self, id: CategoryId) -> Result<(), CategoryServiceError> {
        let mut categories = self.list();
        let Some(index) = categories.iter().position(|category| category.id == id) else {
            return Err(CategoryServiceError::NotFound(id));
        };
        if categories[index].is_default {
            return Err(CategoryServiceError::DefaultImmutable(id));
        }
        categories.remove(index);
        self.store.save(&categories)?;
        Ok(())
    }

    /// Resolves a task's category reference to a display name.
    ///
    /// `None` and dangling ids both resolve to "Uncategorized".
    pub fn display_name(&self, reference: Option<CategoryId>) -> String {
        let Some(id) = reference else {
            return UNCATEGORIZED_NAME.to_string();
        };
        self.list()
            .into_iter()
            .find(|category| category.id == id)
            .map(|category| category.name)
            .unwrap_or_else(|| UNCATEGORIZED_NAME.to_string())
    }
}

fn normalize_name(value: String) -> Result<String, CategoryServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CategoryServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}

fn ensure_name_free(
    categories: &[Category],
    name: &str,
    exclude: Option<CategoryId>,
) -> Result<(), CategoryServiceError> {
    let clash = categories.iter().any(|category| {
        Some(category.id) != exclude && category.name.eq_ignore_ascii_case(name)
    });
    if clash {
        return Err(CategoryServiceError::DuplicateName(name.to_string()));
    }
    Ok(())
}
