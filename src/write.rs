//! Write operations. Every updater takes a snapshot by reference and returns
//! a new one; the input is never touched.
//!
//! Cascades keep the native column consistent with schema access:
//! - `native = write` forces `schemas = all`
//! - `schemas = none` forces `native = none`
//! - splitting schema access per schema drops `native = write` to `read`

use log::debug;

use crate::access::{Access, Level};
use crate::error::{PermsError, Result};
use crate::path::PermissionPath;
use crate::read::{resolve, schemas_access};
use crate::topology::{Database, DatabaseId, GroupId, SchemaName, TableId, TopologyProvider};
use crate::tree::{Node, PermissionsState};

/// Child keys used to seed a level when it switches to `controlled`
#[derive(Debug, Clone, Copy)]
pub enum ChildIds<'a> {
    Schemas(&'a [SchemaName]),
    Tables(&'a [TableId]),
}

/// What storage holds at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    Stored(Access),
    Expanded,
    Absent,
    /// Nothing stored because an ancestor is a scalar
    Inherited(Access),
}

impl Current {
    fn effective(self) -> Access {
        match self {
            Current::Stored(a) | Current::Inherited(a) => a,
            Current::Expanded => Access::Controlled,
            Current::Absent => Access::None,
        }
    }
}

fn current(state: &PermissionsState, path: &PermissionPath) -> Current {
    let Some(db) = state.database(path.group(), path.database()) else {
        return Current::Absent;
    };
    let of = |n: &Node<_, _>| match n {
        Node::Scalar(a) => Current::Stored(*a),
        Node::Expanded(_) => Current::Expanded,
    };
    match path {
        PermissionPath::Native { .. } => Current::Stored(db.native),
        PermissionPath::Schemas { .. } => match &db.schemas {
            Node::Scalar(a) => Current::Stored(*a),
            Node::Expanded(_) => Current::Expanded,
        },
        PermissionPath::Tables { schema, .. } => match &db.schemas {
            Node::Scalar(a) => Current::Inherited(*a),
            Node::Expanded(m) => m.get(schema).map(of).unwrap_or(Current::Absent),
        },
        PermissionPath::Fields { schema, table, .. } => match &db.schemas {
            Node::Scalar(a) => Current::Inherited(*a),
            Node::Expanded(m) => match m.get(schema) {
                None => Current::Absent,
                Some(Node::Scalar(a)) => Current::Inherited(*a),
                Some(Node::Expanded(t)) => t.get(table).map(|a| Current::Stored(*a)).unwrap_or(Current::Absent),
            },
        },
    }
}

fn build<K: Ord + Clone, C: crate::tree::Resolve + From<Access>>(
    value: Access,
    seed: Access,
    keys: Option<&[K]>,
) -> Node<K, C> {
    match (value, keys) {
        (Access::Controlled, Some(keys)) => Node::seeded(keys, seed),
        (Access::Controlled, None) => Node::Expanded(Default::default()),
        (v, _) => Node::Scalar(v),
    }
}

fn invalid(level: Level, value: Access, allowed: &[Access]) -> PermsError {
    PermsError::InvalidTransition { level, value, allowed: allowed.to_vec() }
}

/// In-place form of [`update_permission`]. Returns whether anything changed.
pub(crate) fn apply(
    state: &mut PermissionsState,
    path: &PermissionPath,
    value: Access,
    children: Option<ChildIds<'_>>,
) -> Result<bool> {
    let level = path.level();
    if !level.accepts(value) {
        return Err(invalid(level, value, level.options()));
    }

    let cur = current(state, path);
    let unchanged = match cur {
        Current::Expanded => value == Access::Controlled,
        _ => cur.effective() == value,
    };
    if unchanged {
        debug!("{} already {}, nothing to do", path, value);
        return Ok(false);
    }
    let seed = cur.effective();

    let db = state.database_mut(path.group(), path.database());
    match path {
        PermissionPath::Native { .. } => db.native = value,
        PermissionPath::Schemas { .. } => {
            let keys = match children {
                Some(ChildIds::Schemas(k)) => Some(k),
                Some(ChildIds::Tables(_)) => {
                    return Err(PermsError::path(format!("{}: table ids given for schemas", path)))
                }
                None => None,
            };
            db.schemas = build(value, seed, keys);
        }
        PermissionPath::Tables { schema, .. } => {
            let keys = match children {
                Some(ChildIds::Tables(k)) => Some(k),
                Some(ChildIds::Schemas(_)) => {
                    return Err(PermsError::path(format!("{}: schema names given for tables", path)))
                }
                None => None,
            };
            db.schemas.expand_mut().insert(schema.clone(), build(value, seed, keys));
        }
        PermissionPath::Fields { schema, table, .. } => {
            db.schemas
                .expand_mut()
                .entry(schema.clone())
                .or_default()
                .expand_mut()
                .insert(*table, value);
        }
    }
    debug!("{} {} -> {}", path, seed, value);
    Ok(true)
}

/// Set the value at `path`.
///
/// Writing the value already in effect is a no-op. Switching a scalar to
/// `controlled` seeds one child per id in `children` with the previous
/// value. Scalar ancestors of `path` are replaced by empty maps so the write
/// has somewhere to live; seeding their other children is the caller's job
/// (the level updaters below do it).
pub fn update_permission(
    state: &PermissionsState,
    path: &PermissionPath,
    value: Access,
    children: Option<ChildIds<'_>>,
) -> Result<PermissionsState> {
    let mut next = state.clone();
    apply(&mut next, path, value, children)?;
    Ok(next)
}

/// Values a cell may currently be set to
pub fn allowed_values(state: &PermissionsState, path: &PermissionPath) -> Vec<Access> {
    match path {
        PermissionPath::Native { group, database } if schemas_access(state, *group, *database) == Access::None => {
            vec![Access::None]
        }
        _ => path.level().options().to_vec(),
    }
}

/// Validates `value` for the cell; `Ok(false)` when it is already in effect
fn require_value(state: &PermissionsState, path: &PermissionPath, value: Access) -> Result<bool> {
    if resolve(state, path) == value {
        debug!("{} already resolves to {}", path, value);
        return Ok(false);
    }
    let allowed = allowed_values(state, path);
    if allowed.contains(&value) {
        Ok(true)
    } else {
        Err(invalid(path.level(), value, &allowed))
    }
}

fn require_database<T: TopologyProvider + ?Sized>(topology: &T, db: DatabaseId) -> Result<&Database> {
    topology
        .database(db)
        .ok_or_else(|| PermsError::path(format!("unknown database {}", db)))
}

fn require_schema<'a>(db: &'a Database, schema: &str) -> Result<&'a Database> {
    if db.has_schema(schema) {
        Ok(db)
    } else {
        Err(PermsError::path(format!("database {} has no schema {:?}", db.id, schema)))
    }
}

/// Split schema access per schema, seeding every schema with the prior value
fn expand_schemas(state: &mut PermissionsState, group: GroupId, db: &Database) -> Result<()> {
    let names = db.schema_names();
    apply(state, &PermissionPath::schemas(group, db.id), Access::Controlled, Some(ChildIds::Schemas(&names)))?;
    demote_write(state, group, db.id)
}

// Write access is only expressible alongside full schema access
fn demote_write(state: &mut PermissionsState, group: GroupId, db: DatabaseId) -> Result<()> {
    if schemas_access(state, group, db) != Access::All {
        let native = PermissionPath::native(group, db);
        if current(state, &native).effective() == Access::Write {
            debug!("{}: schemas no longer all, write -> read", native);
            apply(state, &native, Access::Read, None)?;
        }
    }
    Ok(())
}

/// Set native query access. Granting `write` first opens every schema.
pub fn update_native<T: TopologyProvider + ?Sized>(
    state: &PermissionsState,
    topology: &T,
    group: GroupId,
    db: DatabaseId,
    value: Access,
) -> Result<PermissionsState> {
    require_database(topology, db)?;
    let path = PermissionPath::native(group, db);
    if !require_value(state, &path, value)? {
        return Ok(state.clone());
    }

    let mut next = state.clone();
    if value == Access::Write {
        apply(&mut next, &PermissionPath::schemas(group, db), Access::All, None)?;
    }
    apply(&mut next, &path, value, None)?;
    Ok(next)
}

/// Set schema access for a whole database. Revoking it also revokes native access.
pub fn update_schemas<T: TopologyProvider + ?Sized>(
    state: &PermissionsState,
    topology: &T,
    group: GroupId,
    db: DatabaseId,
    value: Access,
) -> Result<PermissionsState> {
    let database = require_database(topology, db)?;
    let path = PermissionPath::schemas(group, db);
    if !require_value(state, &path, value)? {
        return Ok(state.clone());
    }

    let mut next = state.clone();
    if value == Access::None {
        apply(&mut next, &PermissionPath::native(group, db), Access::None, None)?;
    }
    if value == Access::Controlled {
        expand_schemas(&mut next, group, database)?;
    } else {
        apply(&mut next, &path, value, None)?;
    }
    Ok(next)
}

/// Set table access within one schema, splitting schema access if needed
pub fn update_tables<T: TopologyProvider + ?Sized>(
    state: &PermissionsState,
    topology: &T,
    group: GroupId,
    db: DatabaseId,
    schema: &str,
    value: Access,
) -> Result<PermissionsState> {
    let database = require_schema(require_database(topology, db)?, schema)?;
    let path = PermissionPath::tables(group, db, schema);
    if !require_value(state, &path, value)? {
        return Ok(state.clone());
    }

    let mut next = state.clone();
    expand_schemas(&mut next, group, database)?;
    let ids = database.table_ids_in_schema(schema);
    apply(&mut next, &path, value, Some(ChildIds::Tables(&ids)))?;
    Ok(next)
}

/// Set access to one table, splitting schema and table access if needed
pub fn update_fields<T: TopologyProvider + ?Sized>(
    state: &PermissionsState,
    topology: &T,
    group: GroupId,
    db: DatabaseId,
    schema: &str,
    table: TableId,
    value: Access,
) -> Result<PermissionsState> {
    let database = require_database(topology, db)?;
    if !database.tables_in_schema(schema).any(|t| t.id == table) {
        return Err(PermsError::path(format!("database {} has no table {} in schema {:?}", db, table, schema)));
    }
    let path = PermissionPath::fields(group, db, schema, table);
    if !require_value(state, &path, value)? {
        return Ok(state.clone());
    }

    let mut next = state.clone();
    expand_schemas(&mut next, group, database)?;
    let ids = database.table_ids_in_schema(schema);
    apply(&mut next, &PermissionPath::tables(group, db, schema), Access::Controlled, Some(ChildIds::Tables(&ids)))?;
    apply(&mut next, &path, value, None)?;
    Ok(next)
}

/// Dispatch to the level updater matching `path`
pub fn update_at<T: TopologyProvider + ?Sized>(
    state: &PermissionsState,
    topology: &T,
    path: &PermissionPath,
    value: Access,
) -> Result<PermissionsState> {
    match path {
        PermissionPath::Native { group, database } => update_native(state, topology, *group, *database, value),
        PermissionPath::Schemas { group, database } => update_schemas(state, topology, *group, *database, value),
        PermissionPath::Tables { group, database, schema } => {
            update_tables(state, topology, *group, *database, schema, value)
        }
        PermissionPath::Fields { group, database, schema, table } => {
            update_fields(state, topology, *group, *database, schema, *table, value)
        }
    }
}
