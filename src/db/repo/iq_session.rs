use crate::db::DbResult;

/// Single-use store of IQ test scores, keyed by test session id.
#[async_trait::async_trait]
pub trait IqSessionRepo: Send + Sync {
    /// Score of a completed session. Unknown and not yet completed sessions both yield `None`.
    async fn get_session_score(&self, session_id: &str) -> DbResult<Option<i32>>;
    /// Removes the session. Removing an unknown session is not an error.
    async fn delete_session(&self, session_id: &str) -> DbResult<()>;
}
