// Opaque 12-byte record identifiers rendered as 24 hex characters

use bson::oid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier shared by every stored entity
///
/// Wraps the hex form of a BSON object id: 4 bytes of big-endian unix
/// seconds, 5 bytes of per-process randomness and a 3 byte counter. Only the
/// hex form ever leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct ObjectId(String);

/// Error returned for strings that are not a 24 character hex id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid object id")]
pub struct InvalidObjectId(pub String);

impl ObjectId {
    /// Generate a fresh identifier stamped with the current time
    pub fn new() -> Self {
        ObjectId(oid::ObjectId::new().to_hex())
    }

    /// Parse a client supplied id, normalising to lowercase
    pub fn parse(value: &str) -> Result<Self, InvalidObjectId> {
        oid::ObjectId::parse_str(value)
            .map(|parsed| ObjectId(parsed.to_hex()))
            .map_err(|_| InvalidObjectId(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = InvalidObjectId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}
