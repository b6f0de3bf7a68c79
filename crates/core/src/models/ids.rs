//! Identifier newtypes
//!
//! Backend identifiers are opaque strings. Each kind gets its own type so a
//! team id can never be passed where a slot id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// A collection of teams (one booking page)
    CollectionId
);
string_id!(
    /// A team or role bucket inside a collection
    TeamId
);
string_id!(
    /// A slot, unique within its team
    SlotId
);
string_id!(
    /// An authenticated participant
    ActorId
);

/// Full address of a slot within a collection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotKey {
    pub team_id: TeamId,
    pub slot_id: SlotId,
}

impl SlotKey {
    pub fn new(team_id: impl Into<TeamId>, slot_id: impl Into<SlotId>) -> Self {
        Self {
            team_id: team_id.into(),
            slot_id: slot_id.into(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.team_id, self.slot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = SlotId::new("s-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"s-1\"");
    }

    #[test]
    fn test_slot_key_display_and_order() {
        let a = SlotKey::new("alpha", "2");
        let b = SlotKey::new("beta", "1");
        assert_eq!(a.to_string(), "alpha/2");
        assert!(a < b);
    }
}
