//! Category domain model and seeded defaults.
//!
//! # Responsibility
//! - Define the category record tasks reference by id.
//! - Provide the built-in default set seeded on first access.
//!
//! # Invariants
//! - Default categories keep fixed ids across installs and are immutable.
//! - Category names are unique case-insensitively within the collection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a category.
pub type CategoryId = Uuid;

/// Display name used when a task has no category or a dangling reference.
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

/// Fixed ids for the seeded default categories.
///
/// Fixed values keep references valid when data moves between devices
/// through export/import.
pub const DEFAULT_WORK_ID: CategoryId = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);
pub const DEFAULT_PERSONAL_ID: CategoryId =
    Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0002);
pub const DEFAULT_SHOPPING_ID: CategoryId =
    Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0003);
pub const DEFAULT_HEALTH_ID: CategoryId =
    Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0004);

/// Category record referenced by tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    /// Unique case-insensitively. Trimmed and non-empty.
    pub name: String,
    pub icon: String,
    pub color: String,
    /// Seeded defaults cannot be edited or deleted.
    #[serde(default)]
    pub is_default: bool,
}

impl Category {
    /// Creates a user category with a generated id.
    pub fn new(
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
            is_default: false,
        }
    }

    fn seeded(
        id: CategoryId,
        name: &str,
        icon: &str,
        color: &str,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            is_default: true,
        }
    }
}

/// Returns the built-in default categories seeded on first access.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::seeded(DEFAULT_WORK_ID, "Work", "briefcase", "#4A6FA5"),
        Category::seeded(DEFAULT_PERSONAL_ID, "Personal", "home", "#6B8E5A"),
        Category::seeded(DEFAULT_SHOPPING_ID, "Shopping", "cart", "#C98A3D"),
        Category::seeded(DEFAULT_HEALTH_ID, "Health", "heart", "#B5556B"),
    ]
}

#[cfg(test)]
mod tests {
    use super::{default_categories, Category};
    use std::collections::HashSet;

    #[test]
    fn defaults_have_unique_fixed_ids_and_names() {
        let first = default_categories();
        let second = default_categories();
        assert_eq!(first, second);

        let ids: HashSet<_> = first.iter().map(|category| category.id).collect();
        assert_eq!(ids.len(), first.len());
        assert!(first.iter().all(|category| category.is_default));
    }

    #[test]
    fn user_categories_are_not_default() {
        let category = Category::new("Garden", "leaf", "#2F4F2F");
        assert!(!category.is_default);
    }
}
