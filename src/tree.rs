//! Sparse permission tree storage.
//!
//! Each level is either a scalar that applies uniformly to every child, or an
//! expanded map with one entry per child. The two are never mixed at one
//! node; an expanded node resolves to `controlled`.
//!
//! JSON shape (as served by the permissions endpoint):
//! `{ "<group>": { "<db>": { "native": "write", "schemas": "all" | { "<schema>": "all" | { "<table>": "all" } } } } }`

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::access::{Access, Level};
use crate::error::{PermsError, Result};
use crate::topology::{DatabaseId, GroupId, SchemaName, TableId};

/// Anything that resolves to an access value on its own
pub trait Resolve {
    fn access(&self) -> Access;
}

impl Resolve for Access {
    #[inline]
    fn access(&self) -> Access {
        *self
    }
}

/// One level of the tree: uniform scalar or per-child map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node<K, C> {
    Scalar(Access),
    Expanded(BTreeMap<K, C>),
}

pub type TablesNode = Node<TableId, Access>;
pub type SchemasNode = Node<SchemaName, TablesNode>;

impl<K, C> Default for Node<K, C> {
    fn default() -> Self {
        Node::Scalar(Access::None)
    }
}

impl<K, C> From<Access> for Node<K, C> {
    fn from(a: Access) -> Self {
        Node::Scalar(a)
    }
}

impl<K, C> Resolve for Node<K, C> {
    #[inline]
    fn access(&self) -> Access {
        match self {
            Node::Scalar(a) => *a,
            Node::Expanded(_) => Access::Controlled,
        }
    }
}

impl<K: Ord, C> Node<K, C> {
    pub fn is_expanded(&self) -> bool {
        matches!(self, Node::Expanded(_))
    }

    /// Stored child, `None` when absent or when this node is a scalar
    pub fn child<Q>(&self, key: &Q) -> Option<&C>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            Node::Expanded(m) => m.get(key),
            Node::Scalar(_) => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<K, C>> {
        match self {
            Node::Expanded(m) => Some(m),
            Node::Scalar(_) => None,
        }
    }

    /// Expanded map of this node, replacing a scalar with an empty map first
    pub(crate) fn expand_mut(&mut self) -> &mut BTreeMap<K, C> {
        if let Node::Scalar(_) = self {
            *self = Node::Expanded(BTreeMap::new());
        }
        match self {
            Node::Expanded(m) => m,
            Node::Scalar(_) => unreachable!("node was just expanded"),
        }
    }
}

impl<K: Ord + Clone, C: Resolve + From<Access>> Node<K, C> {
    /// Effective access of one child. Children of a scalar inherit it;
    /// absent children of a map are `none`.
    pub fn child_access<Q>(&self, key: &Q) -> Access
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            Node::Scalar(a) => *a,
            Node::Expanded(m) => m.get(key).map(Resolve::access).unwrap_or(Access::None),
        }
    }

    /// Map with every key seeded to `value`
    pub(crate) fn seeded(keys: &[K], value: Access) -> Self {
        Node::Expanded(keys.iter().map(|k| (k.clone(), C::from(value))).collect())
    }
}

// Scalars arrive as strings, expanded nodes as objects. Integer map keys
// come through serde_json as strings, which rules out a derived untagged impl.
impl<'de, K, C> Deserialize<'de> for Node<K, C>
where
    K: Deserialize<'de> + Ord,
    C: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct NodeVisitor<K, C>(PhantomData<(K, C)>);

        impl<'de, K, C> Visitor<'de> for NodeVisitor<K, C>
        where
            K: Deserialize<'de> + Ord,
            C: Deserialize<'de>,
        {
            type Value = Node<K, C>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an access level string or a map of children")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                v.parse::<Access>().map(Node::Scalar).map_err(E::custom)
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(Node::Scalar(Access::None))
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(Node::Scalar(Access::None))
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> std::result::Result<Self::Value, M::Error> {
                let mut out = BTreeMap::new();
                while let Some((k, v)) = map.next_entry::<K, C>()? {
                    out.insert(k, v);
                }
                Ok(Node::Expanded(out))
            }
        }

        deserializer.deserialize_any(NodeVisitor(PhantomData))
    }
}

/// Grants of one group on one database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasePermissions {
    #[serde(default)]
    pub native: Access,
    #[serde(default)]
    pub schemas: SchemasNode,
}

pub type GroupPermissions = BTreeMap<DatabaseId, DatabasePermissions>;

/// Full permission snapshot: group -> database -> tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionsState(pub BTreeMap<GroupId, GroupPermissions>);

impl PermissionsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn group(&self, group: GroupId) -> Option<&GroupPermissions> {
        self.0.get(&group)
    }

    pub fn database(&self, group: GroupId, db: DatabaseId) -> Option<&DatabasePermissions> {
        self.0.get(&group).and_then(|g| g.get(&db))
    }

    /// Database entry, created with everything `none` when absent
    pub(crate) fn database_mut(&mut self, group: GroupId, db: DatabaseId) -> &mut DatabasePermissions {
        self.0.entry(group).or_default().entry(db).or_default()
    }

    /// Set a database entry wholesale, e.g. when loading fixtures
    pub fn insert(&mut self, group: GroupId, db: DatabaseId, perms: DatabasePermissions) {
        self.0.entry(group).or_default().insert(db, perms);
    }
}

fn check_scalar(level: Level, value: Access, at: impl FnOnce() -> String) -> Result<()> {
    // Controlled is only ever represented by an expanded map
    if value == Access::Controlled || !level.accepts(value) {
        return Err(PermsError::Inconsistent(format!("{} holds {} at {}", level, value, at())));
    }
    Ok(())
}

/// Check the structural invariants of a snapshot.
///
/// - every stored scalar is legal for its level and never `controlled`
/// - `native = write` requires `schemas = all`
/// - `schemas = none` requires `native = none`
pub fn validate_state(state: &PermissionsState) -> Result<()> {
    for (g, dbs) in &state.0 {
        for (d, perms) in dbs {
            validate_database(*g, *d, perms)?;
        }
    }
    Ok(())
}

/// Check the entries of `state` that differ from `baseline`.
///
/// Violations already present in the baseline are left to the server that
/// produced them.
pub fn validate_changes(state: &PermissionsState, baseline: &PermissionsState) -> Result<()> {
    for (g, dbs) in &state.0 {
        for (d, perms) in dbs {
            if baseline.database(*g, *d) != Some(perms) {
                validate_database(*g, *d, perms)?;
            }
        }
    }
    Ok(())
}

/// Invariants of one group's grants on one database
pub fn validate_database(group: GroupId, db: DatabaseId, perms: &DatabasePermissions) -> Result<()> {
    let at = || format!("group {} database {}", group, db);
    if !Level::Native.accepts(perms.native) {
        return Err(PermsError::Inconsistent(format!("native holds {} at {}", perms.native, at())));
    }
    match &perms.schemas {
        Node::Scalar(a) => check_scalar(Level::Schemas, *a, at)?,
        Node::Expanded(schemas) => {
            for (s, tables) in schemas {
                match tables {
                    Node::Scalar(a) => check_scalar(Level::Tables, *a, || format!("{} schema '{}'", at(), s))?,
                    Node::Expanded(t) => {
                        for (id, a) in t {
                            check_scalar(Level::Fields, *a, || format!("{} table {}", at(), id))?;
                        }
                    }
                }
            }
        }
    }
    let schemas = perms.schemas.access();
    if perms.native == Access::Write && schemas != Access::All {
        return Err(PermsError::Inconsistent(format!("native write with schemas {} at {}", schemas, at())));
    }
    if schemas == Access::None && perms.native != Access::None {
        let msg = format!("native {} without schema access at {}", perms.native, at());
        return Err(PermsError::Inconsistent(msg));
    }
    Ok(())
}
