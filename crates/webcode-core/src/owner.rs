//! Owner identity.
//!
//! Every persisted record belongs to exactly one owner, and every read or write
//! carries the owner explicitly. There is no ambient "current user".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebCodeError};

/// Username used when no identity is supplied.
pub const DEFAULT_OWNER: &str = "default";

/// Tenant-partition key for all stored records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    /// Creates an owner from a username, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the username is blank.
    pub fn new(username: impl AsRef<str>) -> Result<Self> {
        let trimmed = username.as_ref().trim();
        if trimmed.is_empty() {
            return Err(WebCodeError::invalid_argument("username must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The fallback owner (`"default"`).
    pub fn default_owner() -> Self {
        Self(DEFAULT_OWNER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::default_owner()
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Owner {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
