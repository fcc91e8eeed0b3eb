//! Editor configuration

use serde::{Deserialize, Serialize};

use crate::constants::{ADMIN_GROUP_NAME, ROUTE_BASE};
use crate::error::Result;
use crate::topology::Group;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Prefix of every navigation route
    pub route_base: String,
    /// Group shown read-only regardless of its `editable` flag
    pub admin_group_name: String,
    /// Reject snapshots that break the tree invariants when a session starts
    pub validate_on_load: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            route_base: ROUTE_BASE.to_string(),
            admin_group_name: ADMIN_GROUP_NAME.to_string(),
            validate_on_load: false,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply the configured admin name to a group list
    pub fn normalize_groups(&self, groups: Vec<Group>) -> Vec<Group> {
        groups
            .into_iter()
            .map(|mut g| {
                if g.name == self.admin_group_name {
                    g.editable = false;
                }
                g
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let c = EditorConfig::from_json(r#"{"validate_on_load": true}"#).unwrap();
        assert!(c.validate_on_load);
        assert_eq!(c.route_base, "/admin/permissions");
        assert_eq!(c.admin_group_name, "Administrators");
    }

    #[test]
    fn admin_group_is_forced_read_only() {
        let c = EditorConfig { admin_group_name: "Root".into(), ..Default::default() };
        let groups = c.normalize_groups(vec![
            Group { id: 1, name: "Root".into(), editable: true },
            Group { id: 2, name: "Sales".into(), editable: true },
        ]);
        assert!(!groups[0].editable);
        assert!(groups[1].editable);
    }
}
