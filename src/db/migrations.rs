mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

use super::{Db, DbResult};

impl Db {
    /// Run embedded SQL migrations (idempotent).
    pub async fn init(&self) -> DbResult<()> {
        let mut client = self.pool.get().await?;
        let report = embedded::migrations::runner().run_async(&mut **client).await?;

        for m in report.applied_migrations() {
            tracing::info!(migration = %m.name(), version = m.version(), "applied migration");
        }

        Ok(())
    }
}
