use crate::db::DbResult;
use tokio_postgres::Row;

/// A finished (or in-progress) IQ test run. Created by the test flow, consumed by signup.
#[derive(Debug, Clone)]
pub struct IqSession {
    pub id: String,
    /// `None` until the test has been completed
    pub score: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl IqSession {
    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            score: row.try_get("score")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
