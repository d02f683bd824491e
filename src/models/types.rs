use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary key of a registered user. Stored as a plain `UUID` column and
/// serialized as a plain UUID string.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ToSql, FromSql, Serialize, Deserialize)]
#[postgres(transparent)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
