//! User settings shared with the lifecycle and transfer subsystems.

use crate::model::category::CategoryId;
use serde::{Deserialize, Serialize};

/// Mutable user settings.
///
/// Every field has a serde default so partial or legacy blobs deserialize
/// safely. Callers read the current value and pass the relevant flags into
/// lifecycle operations explicitly; nothing in core consults settings
/// ambiently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// When enabled, newly completed tasks are swept to the archive
    /// immediately.
    pub auto_archive_enabled: bool,
    /// When disabled, callers construct services without a scheduler and no
    /// reminder requests are emitted.
    pub reminders_enabled: bool,
    /// Category preselected for new tasks.
    pub default_category: Option<CategoryId>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_archive_enabled: false,
            reminders_enabled: true,
            default_category: None,
        }
    }
}
