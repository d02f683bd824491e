use crate::db::DbResult;
use crate::db::repo::iq_session::IqSessionRepo;
use crate::models::iq_session::IqSession;
use async_trait::async_trait;
use dashmap::DashMap;

/// Ephemeral session store. Scores are seeded through `record_score` / `open_session`.
#[derive(Default)]
pub struct MemIqSessionRepository {
    sessions: DashMap<String, IqSession>,
}

impl MemIqSessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Registers a session that has not been completed yet.
    pub fn open_session(&self, session_id: &str) {
        self.sessions.insert(
            session_id.to_string(),
            IqSession {
                id: session_id.to_string(),
                score: None,
                created_at: chrono::Utc::now(),
            },
        );
    }

    /// Stores the final score for a session, creating the session if needed.
    pub fn record_score(&self, session_id: &str, score: i32) {
        self.sessions
            .entry(session_id.to_string())
            .and_modify(|s| s.score = Some(score))
            .or_insert_with(|| IqSession {
                id: session_id.to_string(),
                score: Some(score),
                created_at: chrono::Utc::now(),
            });
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }
}

#[async_trait]
impl IqSessionRepo for MemIqSessionRepository {
    async fn get_session_score(&self, session_id: &str) -> DbResult<Option<i32>> {
        Ok(self
            .sessions
            .get(session_id)
            .and_then(|s| s.score))
    }

    async fn delete_session(&self, session_id: &str) -> DbResult<()> {
        self.sessions.remove(session_id);
        Ok(())
    }
}
