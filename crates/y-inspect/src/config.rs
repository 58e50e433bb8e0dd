//! Inspector settings.

use serde::{Deserialize, Serialize};

/// Settings for an [`Inspector`](crate::Inspector) session.
///
/// Missing keys fall back to their defaults when loaded from TOML:
///
/// ```toml
/// gc = true
/// ignore_remote_changes = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Show deleted item content as tombstones.
    pub gc: bool,
    /// Keep updates tagged remote out of the undo history.
    pub ignore_remote_changes: bool,
    /// Group structs into causal chains in reports.
    pub group_structs: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            gc: false,
            ignore_remote_changes: true,
            group_structs: true,
        }
    }
}

impl InspectorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
