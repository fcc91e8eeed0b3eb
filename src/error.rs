//! Error types for permtree

use thiserror::Error;

use crate::access::{Access, Level};
use crate::topology::GroupId;

/// The main error type for permission tree operations
#[derive(Debug, Error)]
pub enum PermsError {
    /// An update path names an entity the topology does not know about
    #[error("malformed path: {0}")]
    MalformedPath(String),

    /// The requested value is not in the cell's allowed option set
    #[error("cannot set {level} to {value}: allowed {}", names(.allowed))]
    InvalidTransition {
        level: Level,
        value: Access,
        allowed: Vec<Access>,
    },

    /// A snapshot breaks the tree invariants
    #[error("inconsistent permissions: {0}")]
    Inconsistent(String),

    /// The working copy no longer satisfies the tree invariants
    #[error("stale snapshot: {0}")]
    StaleSnapshot(String),

    /// Group is shown in the grid but its permissions are fixed
    #[error("group {0} is not editable")]
    ReadOnlyGroup(GroupId),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

fn names(values: &[Access]) -> String {
    crate::access::access_to_names(values).join("/")
}

impl PermsError {
    pub(crate) fn path(msg: impl Into<String>) -> Self {
        PermsError::MalformedPath(msg.into())
    }
}

/// Result type alias for permtree operations
pub type Result<T> = std::result::Result<T, PermsError>;
