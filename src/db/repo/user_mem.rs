use crate::db::DbResult;
use crate::db::error::DbError;
use crate::db::repo::user::UserRepo;
use crate::models::user::{NewUser, User};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Ephemeral user store, keyed by username.
#[derive(Default)]
pub struct MemUserRepository {
    users: DashMap<String, User>,
}

impl MemUserRepository {
    pub fn new() -> Self {
        Self { users: DashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepo for MemUserRepository {
    async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self.users.get(username).map(|u| u.value().clone()))
    }

    async fn insert_user(&self, user: NewUser) -> DbResult<User> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(DbError::UniqueViolation),
            Entry::Vacant(slot) => {
                let user = User::from_new(user, chrono::Utc::now());
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }
}
