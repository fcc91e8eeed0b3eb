//! Typed key paths into a permission snapshot

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::Level;
use crate::topology::{DatabaseId, GroupId, SchemaName, TableId};

/// Location of one permission value: group, database, then the level keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum PermissionPath {
    Native { group: GroupId, database: DatabaseId },
    Schemas { group: GroupId, database: DatabaseId },
    Tables { group: GroupId, database: DatabaseId, schema: SchemaName },
    Fields { group: GroupId, database: DatabaseId, schema: SchemaName, table: TableId },
}

impl PermissionPath {
    pub fn native(group: GroupId, database: DatabaseId) -> Self {
        PermissionPath::Native { group, database }
    }

    pub fn schemas(group: GroupId, database: DatabaseId) -> Self {
        PermissionPath::Schemas { group, database }
    }

    pub fn tables(group: GroupId, database: DatabaseId, schema: impl Into<SchemaName>) -> Self {
        PermissionPath::Tables { group, database, schema: schema.into() }
    }

    pub fn fields(group: GroupId, database: DatabaseId, schema: impl Into<SchemaName>, table: TableId) -> Self {
        PermissionPath::Fields { group, database, schema: schema.into(), table }
    }

    pub fn level(&self) -> Level {
        match self {
            PermissionPath::Native { .. } => Level::Native,
            PermissionPath::Schemas { .. } => Level::Schemas,
            PermissionPath::Tables { .. } => Level::Tables,
            PermissionPath::Fields { .. } => Level::Fields,
        }
    }

    pub fn group(&self) -> GroupId {
        match self {
            PermissionPath::Native { group, .. }
            | PermissionPath::Schemas { group, .. }
            | PermissionPath::Tables { group, .. }
            | PermissionPath::Fields { group, .. } => *group,
        }
    }

    pub fn database(&self) -> DatabaseId {
        match self {
            PermissionPath::Native { database, .. }
            | PermissionPath::Schemas { database, .. }
            | PermissionPath::Tables { database, .. }
            | PermissionPath::Fields { database, .. } => *database,
        }
    }
}

impl fmt::Display for PermissionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionPath::Native { group, database } => write!(f, "{}/{}/native", group, database),
            PermissionPath::Schemas { group, database } => write!(f, "{}/{}/schemas", group, database),
            PermissionPath::Tables { group, database, schema } => {
                write!(f, "{}/{}/schemas/{:?}", group, database, schema)
            }
            PermissionPath::Fields { group, database, schema, table } => {
                write!(f, "{}/{}/schemas/{:?}/{}", group, database, schema, table)
            }
        }
    }
}
