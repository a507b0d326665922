//! Project metadata (data dictionary) types.

use serde::{Deserialize, Serialize};

/// One row of a project's data dictionary.
///
/// REDCap returns every column as a string. The columns this crate reads are
/// typed fields; the rest (validation, branching logic, choices, ...) are
/// kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// The variable name used in records and filter logic.
    pub field_name: String,

    /// The instrument the field belongs to.
    #[serde(default)]
    pub form_name: String,

    /// REDCap field type (`text`, `radio`, `calc`, ...).
    #[serde(default)]
    pub field_type: String,

    #[serde(default)]
    pub field_label: String,

    /// All other data dictionary columns.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FieldMetadata {
    /// Returns a data dictionary column that has no typed field.
    pub fn column(&self, name: &str) -> Option<&str> {
        self.extra.get(name)?.as_str()
    }
}
