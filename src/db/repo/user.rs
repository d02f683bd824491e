use crate::db::DbResult;
use crate::models::user::{NewUser, User};

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Exact (case sensitive) username lookup
    async fn get_by_username(&self, username: &str) -> DbResult<Option<User>>;
    /// Inserts a new user. Fails with `DbError::UniqueViolation` when the username is taken.
    async fn insert_user(&self, user: NewUser) -> DbResult<User>;
}
