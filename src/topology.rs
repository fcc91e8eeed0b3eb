//! Database/schema/table hierarchy and the groups permissions are granted to.
//!
//! The topology is supplied by the surrounding application and is read-only
//! here. Ids are stable external identifiers; nothing in this crate invents
//! or renumbers them.

use serde::{Deserialize, Serialize};

use crate::constants::{ADMIN_GROUP_NAME, DEFAULT_GROUP_NAME, NO_SCHEMA};
use crate::error::Result;

pub type GroupId = u64;
pub type DatabaseId = u64;
pub type TableId = u64;
pub type SchemaName = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub display_name: String,
    #[serde(default)]
    pub schema: Option<String>,
}

impl Table {
    /// Schema key for this table, `""` when it has none
    #[inline]
    pub fn schema_name(&self) -> &str {
        self.schema.as_deref().unwrap_or(NO_SCHEMA)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: DatabaseId,
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Database {
    /// Distinct schema names in first-seen order
    pub fn schema_names(&self) -> Vec<SchemaName> {
        let mut names: Vec<SchemaName> = Vec::new();
        for t in &self.tables {
            let n = t.schema_name();
            if !names.iter().any(|x| x == n) {
                names.push(n.to_string());
            }
        }
        names
    }

    pub fn tables_in_schema<'a>(&'a self, schema: &'a str) -> impl Iterator<Item = &'a Table> + 'a {
        self.tables.iter().filter(move |t| t.schema_name() == schema)
    }

    pub fn table_ids_in_schema(&self, schema: &str) -> Vec<TableId> {
        self.tables_in_schema(schema).map(|t| t.id).collect()
    }

    pub fn has_schema(&self, schema: &str) -> bool {
        self.tables.iter().any(|t| t.schema_name() == schema)
    }
}

/// Read-only source of the database hierarchy
pub trait TopologyProvider {
    fn databases(&self) -> &[Database];

    fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.databases().iter().find(|d| d.id == id)
    }

    /// Schema names of a database, empty when the database is unknown
    fn schema_names_of(&self, id: DatabaseId) -> Vec<SchemaName> {
        self.database(id).map(Database::schema_names).unwrap_or_default()
    }

    fn table_ids_of(&self, id: DatabaseId, schema: &str) -> Vec<TableId> {
        self.database(id).map(|d| d.table_ids_in_schema(schema)).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub databases: Vec<Database>,
}

impl Topology {
    pub fn new(databases: Vec<Database>) -> Self {
        Topology { databases }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TopologyProvider for Topology {
    fn databases(&self) -> &[Database] {
        &self.databases
    }
}

/// A named set of users sharing one permission set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default = "editable_default")]
    pub editable: bool,
}

fn editable_default() -> bool {
    true
}

impl Group {
    /// Build a group, deriving `editable` from its name
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        let name = name.into();
        let editable = name != ADMIN_GROUP_NAME;
        Group { id, name, editable }
    }
}

pub fn is_admin_group(group: &Group) -> bool {
    group.name == ADMIN_GROUP_NAME
}

pub fn is_default_group(group: &Group) -> bool {
    group.name == DEFAULT_GROUP_NAME
}

/// Whether the group's cells accept edits. The admin lock lives in
/// `editable`, set by [`Group::new`] or `EditorConfig::normalize_groups`.
pub fn can_edit_permissions(group: &Group) -> bool {
    group.editable
}

pub fn can_edit_membership(group: &Group) -> bool {
    !is_default_group(group)
}
