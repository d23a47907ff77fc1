//! User domain types.

use serde::{Deserialize, Serialize};

/// Role of a user account.
///
/// Wire and storage format: `u8` (0 = Owner, 1 = Guest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Owns properties; may operate every lock on them at any time.
    Owner = 0,
    /// Operates locks only through grants or tokens.
    Guest = 1,
}

impl UserRole {
    /// Convert from `u8` storage value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Owner),
            1 => Some(Self::Guest),
            _ => None,
        }
    }

    /// Convert to `u8` storage value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
