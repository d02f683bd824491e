use crate::config::{Config, Storage};
use crate::db::Db;
use crate::db::repo::{IqSessionRepo, IqSessionRepository, MemIqSessionRepository, MemUserRepository};
use crate::db::repo::{UserRepo, UserRepository};
use crate::error::AppResult;
use crate::services::{ModerationChecker, PasswordHasher, SignupService, WordlistModerator};
use std::sync::Arc;

pub struct Repos {
    pub user: Arc<dyn UserRepo>,
    pub iq_session: Arc<dyn IqSessionRepo>,
}

impl Repos {
    pub fn postgres(db: Arc<Db>) -> Self {
        Self {
            user: Arc::new(UserRepository::new(db.clone())),
            iq_session: Arc::new(IqSessionRepository::new(db)),
        }
    }

    pub fn memory() -> Self {
        Self {
            user: Arc::new(MemUserRepository::new()),
            iq_session: Arc::new(MemIqSessionRepository::new()),
        }
    }
}

pub struct Services {
    pub signup: Arc<SignupService>,
}

pub struct Registry {
    pub repos: Arc<Repos>,
    pub services: Arc<Services>,
    pub config: Arc<Config>,
}

impl Registry {
    pub fn new(repos: Repos, moderation: Arc<dyn ModerationChecker>, config: Arc<Config>) -> AppResult<Self> {
        let repos = Arc::new(repos);

        let services = Arc::new(Services {
            signup: Arc::new(SignupService::new(
                repos.user.clone(),
                repos.iq_session.clone(),
                moderation,
                PasswordHasher::new()?,
                config.public_domain.clone(),
            )),
        });

        Ok(Self {
            repos,
            services,
            config,
        })
    }

    /// Wires up the configured storage backend and moderation list. Runs migrations for postgres.
    pub async fn from_config(config: Arc<Config>) -> AppResult<Self> {
        let repos = match config.storage {
            Storage::Postgres => {
                let db = Arc::new(Db::new(&config.database_url)?);
                db.init().await?;
                Repos::postgres(db)
            }
            Storage::Memory => {
                tracing::warn!("using in-memory storage, nothing will be persisted");
                Repos::memory()
            }
        };

        let moderation: Arc<dyn ModerationChecker> = match &config.blocked_terms_file {
            Some(path) => Arc::new(WordlistModerator::with_terms_file(path)?),
            None => Arc::new(WordlistModerator::default()),
        };

        Self::new(repos, moderation, config)
    }
}
