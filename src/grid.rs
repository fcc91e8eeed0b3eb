//! Grid projection of a permission snapshot.
//!
//! Rows are the entities of one scope (databases, the schemas of one
//! database, or the tables of one schema), columns are groups, and each cell
//! carries one value per permission column together with the values it may
//! be switched to. Navigation is only ever requested, never performed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::{Access, Level};
use crate::constants::{NO_SCHEMA, ROUTE_BASE, VIEW_SCHEMAS, VIEW_TABLES};
use crate::error::{PermsError, Result};
use crate::path::PermissionPath;
use crate::read::resolve;
use crate::topology::{
    can_edit_permissions, Database, DatabaseId, Group, GroupId, SchemaName, TableId, TopologyProvider,
};
use crate::tree::PermissionsState;
use crate::write::{allowed_values, update_at};

/// Which slice of the hierarchy a grid shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GridScope {
    Databases,
    Schemas { database: DatabaseId },
    Tables { database: DatabaseId, schema: SchemaName },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridKind {
    Database,
    Schema,
    Table,
}

/// Identity of a grid row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Table { database: DatabaseId, schema: SchemaName, table: TableId },
    Schema { database: DatabaseId, schema: SchemaName },
    Database { database: DatabaseId },
}

impl EntityId {
    pub fn database(&self) -> DatabaseId {
        match self {
            EntityId::Database { database } | EntityId::Schema { database, .. } | EntityId::Table { database, .. } => {
                *database
            }
        }
    }

    /// Path of one permission column of this entity for a group
    pub fn path(&self, group: GroupId, level: Level) -> Result<PermissionPath> {
        let p = match (self, level) {
            (EntityId::Database { database }, Level::Native) => PermissionPath::native(group, *database),
            (EntityId::Database { database }, Level::Schemas) => PermissionPath::schemas(group, *database),
            (EntityId::Schema { database, schema }, Level::Tables) => {
                PermissionPath::tables(group, *database, schema.clone())
            }
            (EntityId::Table { database, schema, table }, Level::Fields) => {
                PermissionPath::fields(group, *database, schema.clone(), *table)
            }
            (e, l) => return Err(PermsError::path(format!("{:?} has no {} column", e, l))),
        };
        Ok(p)
    }
}

/// Admin page a grid row links to or an update asks to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "lowercase")]
pub enum Route {
    Databases,
    Schemas { database: DatabaseId },
    Tables { database: DatabaseId, schema: SchemaName },
}

impl Route {
    /// URL of the page under `base`
    pub fn to_path(&self, base: &str) -> String {
        match self {
            Route::Databases => format!("{}/databases", base),
            Route::Schemas { database } => format!("{}/databases/{}/schemas", base, database),
            Route::Tables { database, schema } if schema == NO_SCHEMA => {
                format!("{}/databases/{}/tables", base, database)
            }
            Route::Tables { database, schema } => {
                format!("{}/databases/{}/schemas/{}/tables", base, database, encode_component(schema))
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path(ROUTE_BASE))
    }
}

/// Percent-encode a path segment the way JavaScript's `encodeURIComponent` does:
/// ASCII alphanumerics and `-_.!~*'()` pass through, every other byte becomes `%XX`.
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInfo {
    pub value: Access,
    pub title: String,
}

/// One permission column as rendered in the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionColumn {
    pub level: Level,
    pub header: String,
    pub options: Vec<OptionInfo>,
}

impl PermissionColumn {
    fn new(level: Level) -> Self {
        let options = level
            .options()
            .iter()
            .map(|v| OptionInfo { value: *v, title: level.title(*v).unwrap_or_default().to_string() })
            .collect();
        PermissionColumn { level, header: level.header().to_string(), options }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub level: Level,
    pub value: Access,
    /// Values the cell may be switched to right now
    pub options: Vec<Access>,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCells {
    pub group: GroupId,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    pub entity: GridEntity,
    /// One entry per group, in group order
    pub groups: Vec<GroupCells>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsGrid {
    pub kind: GridKind,
    pub groups: Vec<Group>,
    pub permissions: Vec<PermissionColumn>,
    pub rows: Vec<GridRow>,
}

impl PermissionsGrid {
    pub fn row(&self, id: &EntityId) -> Option<&GridRow> {
        self.rows.iter().find(|r| &r.entity.id == id)
    }

    /// Cell for one entity, group and column
    pub fn cell(&self, id: &EntityId, group: GroupId, level: Level) -> Option<&Cell> {
        self.row(id)?
            .groups
            .iter()
            .find(|g| g.group == group)?
            .cells
            .iter()
            .find(|c| c.level == level)
    }
}

/// Side effect an update asks the caller to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostAction {
    Navigate(Route),
}

/// Result of a cell edit
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub state: PermissionsState,
    pub post_action: Option<PostAction>,
}

fn require_database<T: TopologyProvider + ?Sized>(topology: &T, id: DatabaseId) -> Result<&Database> {
    topology
        .database(id)
        .ok_or_else(|| PermsError::path(format!("unknown database {}", id)))
}

fn row(state: &PermissionsState, groups: &[Group], entity: GridEntity, levels: &[Level]) -> Result<GridRow> {
    let mut out = Vec::with_capacity(groups.len());
    for g in groups {
        let editable = can_edit_permissions(g);
        let mut cells = Vec::with_capacity(levels.len());
        for level in levels {
            let path = entity.id.path(g.id, *level)?;
            cells.push(Cell {
                level: *level,
                value: resolve(state, &path),
                options: allowed_values(state, &path),
                editable,
            });
        }
        out.push(GroupCells { group: g.id, cells });
    }
    Ok(GridRow { entity, groups: out })
}

fn database_link(db: &Database) -> Link {
    let schemas = db.schema_names();
    match schemas.as_slice() {
        [only] => Link {
            name: VIEW_TABLES.to_string(),
            route: Route::Tables { database: db.id, schema: only.clone() },
        },
        _ => Link { name: VIEW_SCHEMAS.to_string(), route: Route::Schemas { database: db.id } },
    }
}

/// Build the grid for `scope`
pub fn build_grid<T: TopologyProvider + ?Sized>(
    topology: &T,
    groups: &[Group],
    state: &PermissionsState,
    scope: &GridScope,
) -> Result<PermissionsGrid> {
    let (kind, levels, rows): (GridKind, &[Level], Vec<GridEntity>) = match scope {
        GridScope::Databases => (
            GridKind::Database,
            &[Level::Native, Level::Schemas],
            topology
                .databases()
                .iter()
                .map(|db| GridEntity {
                    id: EntityId::Database { database: db.id },
                    name: db.name.clone(),
                    link: Some(database_link(db)),
                })
                .collect(),
        ),
        GridScope::Schemas { database } => {
            let db = require_database(topology, *database)?;
            let rows = db
                .schema_names()
                .into_iter()
                .map(|schema| GridEntity {
                    id: EntityId::Schema { database: db.id, schema: schema.clone() },
                    name: schema.clone(),
                    link: Some(Link {
                        name: VIEW_TABLES.to_string(),
                        route: Route::Tables { database: db.id, schema },
                    }),
                })
                .collect();
            (GridKind::Schema, &[Level::Tables], rows)
        }
        GridScope::Tables { database, schema } => {
            let db = require_database(topology, *database)?;
            if !db.has_schema(schema) {
                return Err(PermsError::path(format!("database {} has no schema {:?}", db.id, schema)));
            }
            let rows = db
                .tables_in_schema(schema)
                .map(|t| GridEntity {
                    id: EntityId::Table { database: db.id, schema: schema.clone(), table: t.id },
                    name: t.display_name.clone(),
                    link: None,
                })
                .collect();
            (GridKind::Table, &[Level::Fields], rows)
        }
    };

    let rows = rows
        .into_iter()
        .map(|e| row(state, groups, e, levels))
        .collect::<Result<Vec<_>>>()?;

    Ok(PermissionsGrid {
        kind,
        groups: groups.to_vec(),
        permissions: levels.iter().map(|l| PermissionColumn::new(*l)).collect(),
        rows,
    })
}

/// Apply a cell edit through the matching level updater
pub fn apply_update<T: TopologyProvider + ?Sized>(
    state: &PermissionsState,
    topology: &T,
    groups: &[Group],
    group: GroupId,
    entity: &EntityId,
    level: Level,
    value: Access,
) -> Result<Applied> {
    let g = groups
        .iter()
        .find(|g| g.id == group)
        .ok_or_else(|| PermsError::path(format!("unknown group {}", group)))?;
    if !can_edit_permissions(g) {
        return Err(PermsError::ReadOnlyGroup(group));
    }

    let path = entity.path(group, level)?;
    let state = update_at(state, topology, &path, value)?;

    let post_action = match (&path, value) {
        (PermissionPath::Schemas { database, .. }, Access::Controlled) => {
            Some(PostAction::Navigate(Route::Schemas { database: *database }))
        }
        (PermissionPath::Tables { database, schema, .. }, Access::Controlled) => {
            Some(PostAction::Navigate(Route::Tables { database: *database, schema: schema.clone() }))
        }
        _ => None,
    };
    Ok(Applied { state, post_action })
}
