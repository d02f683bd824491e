use crate::db::repo::user::UserRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::user::{NewUser, User};
use std::sync::Arc;

pub struct UserRepository {
    db: Arc<Db>,
}

impl UserRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl UserRepo for UserRepository {
    async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
            SELECT id, username, password_hash, domain, iq, ip, user_agent, created_at
            FROM users
            WHERE username = $1
            "#,
            )
            .await?;

        let row_opt = client.query_opt(&stmt, &[&username]).await?;
        map_row_opt(
            row_opt,
            User::try_from_row,
            &format!("UserRepo::get_by_username username={}", username),
        )
    }

    async fn insert_user(&self, user: NewUser) -> DbResult<User> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
            INSERT INTO users (id, username, password_hash, domain, iq, ip, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, password_hash, domain, iq, ip, user_agent, created_at
            "#,
            )
            .await?;

        // unique violations surface as DbError::UniqueViolation through From<tokio_postgres::Error>
        let row = client
            .query_one(
                &stmt,
                &[
                    &user.id,
                    &user.username,
                    &user.password_hash,
                    &user.domain,
                    &user.iq,
                    &user.ip,
                    &user.user_agent,
                ],
            )
            .await?;

        User::try_from_row(&row)
    }
}
