use serde::{Deserialize, Serialize};

/// A single directory entry, as persisted on disk and returned by the API.
///
/// The email is the record's identifier: comparisons are exact and
/// case-sensitive, and uniqueness is enforced only when a record is created.
/// The `role` field is a free-text label serialized as `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: String,
    pub password: String,
}

impl UserRecord {
    pub fn new(name: String, email: String, role: String, password: String) -> Self {
        Self {
            name,
            email,
            role,
            password,
        }
    }
}
