//! Access values and the permission columns they live in

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Access level at any depth of the tree.
///
/// `Read`/`Write` only appear in the `native` column; `Controlled` only
/// ever shows up as a resolved value, never as a stored scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    None,
    All,
    Controlled,
    Read,
    Write,
}

impl Access {
    #[inline]
    pub fn is_none(self) -> bool {
        self == Access::None
    }
}

const NAMES: &[(&str, Access)] = &[
    ("none", Access::None),
    ("all", Access::All),
    ("controlled", Access::Controlled),
    ("read", Access::Read),
    ("write", Access::Write),
];

impl Access {
    pub fn name(self) -> &'static str {
        NAMES.iter().find(|(_, a)| *a == self).map(|(n, _)| *n).unwrap_or("none")
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(n, _)| *n == s)
            .map(|(_, a)| *a)
            .ok_or_else(|| format!("unknown access level '{}'", s))
    }
}

/// Convert a list of access values to their names
pub fn access_to_names(values: &[Access]) -> Vec<&'static str> {
    values.iter().map(|a| a.name()).collect()
}

/// Convert a list of names to access values, skipping unknown names
pub fn names_to_access(names: &[&str]) -> Vec<Access> {
    names.iter().filter_map(|n| n.parse().ok()).collect()
}

/// One permission column of the grid, i.e. one level of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Native,
    Schemas,
    Tables,
    Fields,
}

const NATIVE_OPTIONS: &[Access] = &[Access::Write, Access::Read, Access::None];
const TREE_OPTIONS: &[Access] = &[Access::All, Access::Controlled, Access::None];
const FIELD_OPTIONS: &[Access] = &[Access::All, Access::None];

impl Level {
    /// Every value the level can ever hold, in display order
    pub fn options(self) -> &'static [Access] {
        match self {
            Level::Native => NATIVE_OPTIONS,
            Level::Schemas | Level::Tables => TREE_OPTIONS,
            Level::Fields => FIELD_OPTIONS,
        }
    }

    #[inline]
    pub fn accepts(self, value: Access) -> bool {
        self.options().contains(&value)
    }

    /// Whether the level can be split per child
    #[inline]
    pub fn expandable(self) -> bool {
        matches!(self, Level::Schemas | Level::Tables)
    }

    pub fn header(self) -> &'static str {
        match self {
            Level::Native => "Raw Access",
            Level::Schemas => "Schema Access",
            Level::Tables | Level::Fields => "Table Access",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Native => "native",
            Level::Schemas => "schemas",
            Level::Tables => "tables",
            Level::Fields => "fields",
        }
    }

    /// Title of an option as shown to the user, `None` for values the level never holds
    pub fn title(self, value: Access) -> Option<&'static str> {
        let t = match (self, value) {
            (Level::Native, Access::Write) => "Write raw queries",
            (Level::Native, Access::Read) => "View raw queries",
            (Level::Native, Access::None) => "No access",
            (Level::Schemas, Access::All) => "Access all schemas",
            (Level::Schemas, Access::Controlled) => "Access some schemas",
            (Level::Tables, Access::All) => "Access all tables",
            (Level::Tables, Access::Controlled) => "Access some tables",
            (Level::Fields, Access::All) => "Access table",
            (Level::Schemas | Level::Tables | Level::Fields, Access::None) => "No access",
            _ => return None,
        };
        Some(t)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for (name, a) in NAMES {
            assert_eq!(name.parse::<Access>().unwrap(), *a);
            assert_eq!(a.to_string(), *name);
        }
        assert!("partial".parse::<Access>().is_err());
    }

    #[test]
    fn names_to_access_skips_unknown() {
        assert_eq!(names_to_access(&["all", "bogus", "none"]), vec![Access::All, Access::None]);
    }

    #[test]
    fn native_and_fields_never_accept_controlled() {
        assert!(!Level::Native.accepts(Access::Controlled));
        assert!(!Level::Fields.accepts(Access::Controlled));
        assert!(Level::Tables.accepts(Access::Controlled));
        assert!(!Level::Schemas.accepts(Access::Write));
    }

    #[test]
    fn every_option_has_a_title() {
        for level in [Level::Native, Level::Schemas, Level::Tables, Level::Fields] {
            for v in level.options() {
                assert!(level.title(*v).is_some(), "{} {}", level, v);
            }
        }
        assert_eq!(Level::Native.title(Access::All), None);
    }
}
