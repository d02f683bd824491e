use crate::db::DbResult;
use crate::models::types::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_postgres::Row;

/// Shortest accepted username
pub const USERNAME_MIN_LEN: usize = 3;
/// Longest accepted username
pub const USERNAME_MAX_LEN: usize = 32;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap());

#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID
    pub id: UserId,
    /// Username (distinct, lowercase)
    pub username: String,
    /// Hashed password (argon2id, PHC string)
    pub password_hash: String,
    /// Site domain the account was created on
    pub domain: String,
    /// Score taken from the completed IQ test session
    pub iq: i32,
    /// Client address at signup (best effort)
    pub ip: String,
    pub user_agent: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Row shape for inserting a freshly registered user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub domain: String,
    pub iq: i32,
    pub ip: String,
    pub user_agent: String,
}

impl User {
    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get::<_, UserId>("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            domain: row.try_get("domain")?,
            iq: row.try_get("iq")?,
            ip: row.try_get("ip")?,
            user_agent: row.try_get("user_agent")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub fn from_new(new: NewUser, created_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id: new.id,
            username: new.username,
            password_hash: new.password_hash,
            domain: new.domain,
            iq: new.iq,
            ip: new.ip,
            user_agent: new.user_agent,
            created_at,
        }
    }
}

/// Username format check. Expects an already lowercased name.
pub fn validate_username(s: &str) -> bool {
    let len = s.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return false;
    }

    USERNAME_RE.is_match(s)
}
