//! Shapes shared by several Asana resources

use serde::{Deserialize, Serialize};

/// Compact reference to another resource (`{"gid", "resource_type", "name"}`)
///
/// Asana returns these wherever a resource points at another one (assignee,
/// parent, workspace, owner...). Which keys are present depends on the
/// requested `opt_fields`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(default)]
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ResourceRef {
    /// Name when known, gid otherwise
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.gid)
    }
}

/// Joins `opt_fields` entries into the comma separated query value
pub(crate) fn opt_fields(fields: &[&str]) -> String {
    fields.join(",")
}
