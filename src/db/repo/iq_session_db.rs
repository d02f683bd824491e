use crate::db::repo::iq_session::IqSessionRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::iq_session::IqSession;
use std::sync::Arc;

pub struct IqSessionRepository {
    db: Arc<Db>,
}

impl IqSessionRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl IqSessionRepo for IqSessionRepository {
    async fn get_session_score(&self, session_id: &str) -> DbResult<Option<i32>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT id, score, created_at FROM iq_sessions WHERE id = $1")
            .await?;

        let row_opt = client.query_opt(&stmt, &[&session_id]).await?;
        let session = map_row_opt(
            row_opt,
            IqSession::try_from_row,
            &format!("IqSessionRepo::get_session_score id={}", session_id),
        )?;

        Ok(session.and_then(|s| s.score))
    }

    async fn delete_session(&self, session_id: &str) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("DELETE FROM iq_sessions WHERE id = $1")
            .await?;
        client.execute(&stmt, &[&session_id]).await?;

        Ok(())
    }
}
