//! Diff between two permission snapshots, for confirmation before saving.
//!
//! Table changes are classified by their *new* value: a table whose access
//! changed to `none` is revoked, any other change is a grant. Unchanged
//! tables, databases and groups are pruned.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::Access;
use crate::read::{fields_access, native_access};
use crate::topology::{Database, DatabaseId, Group, GroupId, TableId};
use crate::tree::PermissionsState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDiff {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDiff {
    pub name: String,
    /// New native access, only when it changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<Access>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub granted_tables: BTreeMap<TableId, TableDiff>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub revoked_tables: BTreeMap<TableId, TableDiff>,
}

impl DatabaseDiff {
    pub fn is_empty(&self) -> bool {
        self.native.is_none() && self.granted_tables.is_empty() && self.revoked_tables.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDiff {
    pub name: String,
    pub databases: BTreeMap<DatabaseId, DatabaseDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsDiff {
    pub groups: BTreeMap<GroupId, GroupDiff>,
}

fn diff_database(db: &Database, group: GroupId, new: &PermissionsState, old: &PermissionsState) -> DatabaseDiff {
    let mut out = DatabaseDiff { name: db.name.clone(), ..Default::default() };

    let (was, now) = (native_access(old, group, db.id), native_access(new, group, db.id));
    if was != now {
        out.native = Some(now);
    }

    for t in &db.tables {
        let was = fields_access(old, group, db.id, t.schema_name(), t.id);
        let now = fields_access(new, group, db.id, t.schema_name(), t.id);
        if was == now {
            continue;
        }
        let entry = TableDiff { name: t.display_name.clone() };
        if now.is_none() {
            out.revoked_tables.insert(t.id, entry);
        } else {
            out.granted_tables.insert(t.id, entry);
        }
    }
    out
}

/// Diff `new` against `old` for every group and database
pub fn diff(
    groups: &[Group],
    databases: &[Database],
    new: &PermissionsState,
    old: &PermissionsState,
) -> PermissionsDiff {
    let mut out = PermissionsDiff::default();
    for g in groups {
        let changed: BTreeMap<_, _> = databases
            .iter()
            .map(|db| (db.id, diff_database(db, g.id, new, old)))
            .filter(|(_, d)| !d.is_empty())
            .collect();
        if !changed.is_empty() {
            out.groups.insert(g.id, GroupDiff { name: g.name.clone(), databases: changed });
        }
    }
    out
}

fn tables(n: usize) -> String {
    if n == 1 {
        "1 table".to_string()
    } else {
        format!("{} tables", n)
    }
}

impl PermissionsDiff {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Human-readable sentences describing every change
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for g in self.groups.values() {
            for db in g.databases.values() {
                let mut parts = Vec::new();
                if !db.granted_tables.is_empty() {
                    parts.push(format!("will be given access to {}", tables(db.granted_tables.len())));
                }
                if !db.revoked_tables.is_empty() {
                    parts.push(format!("will be denied access to {}", tables(db.revoked_tables.len())));
                }
                if !parts.is_empty() {
                    lines.push(format!("{} {} in {}.", g.name, parts.join(" and "), db.name));
                }
                match db.native {
                    Some(Access::None) => {
                        lines.push(format!("{} will no longer be able to run native queries for {}.", g.name, db.name))
                    }
                    Some(native) => {
                        lines.push(format!("{} will now be able to {} native queries for {}.", g.name, native, db.name))
                    }
                    None => {}
                }
            }
        }
        lines
    }
}

impl fmt::Display for PermissionsDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.summary() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Table;

    fn db() -> Database {
        Database {
            id: 1,
            name: "Sample".into(),
            tables: vec![
                Table { id: 10, display_name: "Orders".into(), schema: Some("public".into()) },
                Table { id: 11, display_name: "People".into(), schema: Some("public".into()) },
            ],
        }
    }

    #[test]
    fn pluralizes_tables() {
        assert_eq!(tables(1), "1 table");
        assert_eq!(tables(0), "0 tables");
        assert_eq!(tables(2), "2 tables");
    }

    #[test]
    fn controlled_to_all_at_schema_level_reports_only_real_changes() {
        let groups = vec![Group::new(1, "Analysts")];
        let old = PermissionsState::from_json(r#"{"1": {"1": {"schemas": {"public": {"10": "all"}}}}}"#).unwrap();
        let new = PermissionsState::from_json(r#"{"1": {"1": {"schemas": "all"}}}"#).unwrap();
        let d = diff(&groups, &[db()], &new, &old);
        let dbd = &d.groups[&1].databases[&1];
        assert_eq!(dbd.granted_tables.keys().copied().collect::<Vec<_>>(), vec![11]);
        assert!(dbd.revoked_tables.is_empty());
    }

    #[test]
    fn serialized_diff_omits_empty_parts() {
        let groups = vec![Group::new(1, "Analysts")];
        let old = PermissionsState::new();
        let new = PermissionsState::from_json(r#"{"1": {"1": {"native": "read", "schemas": "all"}}}"#).unwrap();
        let d = diff(&groups, &[db()], &new, &old);
        let v = serde_json::to_value(&d).unwrap();
        let dbv = &v["groups"]["1"]["databases"]["1"];
        assert_eq!(dbv["native"], "read");
        assert!(dbv.get("revokedTables").is_none());
        assert_eq!(dbv["grantedTables"]["10"]["name"], "Orders");
    }
}
