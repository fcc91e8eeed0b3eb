//! permtree - hierarchical group permissions for databases, schemas and tables
//!
//! A snapshot maps group -> database -> `{ native, schemas }`, where schema
//! and table access are sparse: a scalar applies to every child, a map
//! lists children individually. All operations are pure functions over
//! snapshots; [`PermissionsEditor`] wraps them into an editing session.

pub mod access;
pub mod config;
pub mod constants;
pub mod diff;
pub mod error;
pub mod grid;
pub mod path;
pub mod read;
pub mod session;
pub mod topology;
pub mod tree;
pub mod write;

// Types
pub use access::{access_to_names, names_to_access, Access, Level};
pub use config::EditorConfig;
pub use error::{PermsError, Result};
pub use path::PermissionPath;
pub use topology::{
    can_edit_membership, can_edit_permissions, is_admin_group, is_default_group, Database, DatabaseId, Group,
    GroupId, SchemaName, Table, TableId, Topology, TopologyProvider,
};
pub use tree::{
    validate_changes, validate_database, validate_state, DatabasePermissions, GroupPermissions, Node, PermissionsState,
    Resolve,
};

// Reads
pub use read::{fields_access, native_access, resolve, schemas_access, tables_access};

// Writes
pub use write::{
    allowed_values, update_at, update_fields, update_native, update_permission, update_schemas, update_tables,
    ChildIds,
};

// Grid, diff, session
pub use diff::{diff, DatabaseDiff, GroupDiff, PermissionsDiff, TableDiff};
pub use grid::{
    apply_update, build_grid, Applied, Cell, EntityId, GridEntity, GridKind, GridRow, GridScope, GroupCells, Link,
    PermissionColumn, PermissionsGrid, PostAction, Route,
};
pub use session::PermissionsEditor;
