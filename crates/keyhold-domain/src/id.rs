//! Newtype wrappers for domain identifiers.
//!
//! All entities are keyed by store-assigned 64-bit integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifies a user account (owner or guest).
    UserId
);
entity_id!(
    /// Identifies a property owned by an owner.
    PropertyId
);
entity_id!(
    /// Identifies a lock installed on a property.
    LockId
);
entity_id!(
    /// Identifies a time-windowed access grant.
    GrantId
);
entity_id!(
    /// Identifies an issued access token (not its shareable code).
    TokenId
);
entity_id!(
    /// Identifies an open-attempt log record.
    AttemptId
);
