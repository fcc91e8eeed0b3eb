//! Read operations: resolve the effective access at any level.
//!
//! Absent values resolve to `none`, expanded maps to `controlled`, scalars to
//! themselves. A level below a non-`controlled` ancestor inherits that
//! ancestor's value instead of reading storage.

use crate::access::Access;
use crate::path::PermissionPath;
use crate::tree::{PermissionsState, Resolve};
use crate::topology::{DatabaseId, GroupId, TableId};

/// Native (raw query) access of a group on a database
#[inline]
pub fn native_access(state: &PermissionsState, group: GroupId, db: DatabaseId) -> Access {
    state.database(group, db).map(|d| d.native).unwrap_or(Access::None)
}

/// Schema access of a group on a database
#[inline]
pub fn schemas_access(state: &PermissionsState, group: GroupId, db: DatabaseId) -> Access {
    state.database(group, db).map(|d| d.schemas.access()).unwrap_or(Access::None)
}

/// Table access of a group within one schema
pub fn tables_access(state: &PermissionsState, group: GroupId, db: DatabaseId, schema: &str) -> Access {
    match schemas_access(state, group, db) {
        Access::Controlled => state
            .database(group, db)
            .and_then(|d| d.schemas.child(schema).map(Resolve::access))
            .unwrap_or(Access::None),
        inherited => inherited,
    }
}

/// Access of a group to one table's fields
pub fn fields_access(state: &PermissionsState, group: GroupId, db: DatabaseId, schema: &str, table: TableId) -> Access {
    match tables_access(state, group, db, schema) {
        Access::Controlled => state
            .database(group, db)
            .and_then(|d| d.schemas.child(schema))
            .and_then(|t| t.child(&table).copied())
            .unwrap_or(Access::None),
        inherited => inherited,
    }
}

/// Effective access at any path
pub fn resolve(state: &PermissionsState, path: &PermissionPath) -> Access {
    match path {
        PermissionPath::Native { group, database } => native_access(state, *group, *database),
        PermissionPath::Schemas { group, database } => schemas_access(state, *group, *database),
        PermissionPath::Tables { group, database, schema } => tables_access(state, *group, *database, schema),
        PermissionPath::Fields { group, database, schema, table } => {
            fields_access(state, *group, *database, schema, *table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(json: &str) -> PermissionsState {
        PermissionsState::from_json(json).unwrap()
    }

    #[test]
    fn absent_everything_is_none() {
        let s = PermissionsState::new();
        assert_eq!(native_access(&s, 1, 1), Access::None);
        assert_eq!(schemas_access(&s, 1, 1), Access::None);
        assert_eq!(tables_access(&s, 1, 1, "public"), Access::None);
        assert_eq!(fields_access(&s, 1, 1, "public", 3), Access::None);
    }

    #[test]
    fn scalar_ancestor_is_inherited() {
        let s = state(r#"{"1": {"1": {"native": "read", "schemas": "all"}}}"#);
        assert_eq!(tables_access(&s, 1, 1, "anything"), Access::All);
        assert_eq!(fields_access(&s, 1, 1, "anything", 42), Access::All);
    }

    #[test]
    fn controlled_descends_per_key() {
        let s = state(r#"{"1": {"1": {"schemas": {"a": "all", "b": {"5": "all"}}}}}"#);
        assert_eq!(schemas_access(&s, 1, 1), Access::Controlled);
        assert_eq!(tables_access(&s, 1, 1, "a"), Access::All);
        assert_eq!(tables_access(&s, 1, 1, "b"), Access::Controlled);
        assert_eq!(tables_access(&s, 1, 1, "c"), Access::None);
        assert_eq!(fields_access(&s, 1, 1, "a", 9), Access::All);
        assert_eq!(fields_access(&s, 1, 1, "b", 5), Access::All);
        assert_eq!(fields_access(&s, 1, 1, "b", 6), Access::None);
    }

    #[test]
    fn resolve_matches_level_getters() {
        let s = state(r#"{"1": {"1": {"native": "write", "schemas": "all"}}}"#);
        assert_eq!(resolve(&s, &PermissionPath::native(1, 1)), Access::Write);
        assert_eq!(resolve(&s, &PermissionPath::fields(1, 1, "", 2)), Access::All);
    }
}
