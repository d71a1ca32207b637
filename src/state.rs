use std::sync::Arc;

use crate::auth::repo::{PgTokenStore, PgUserStore, TokenStore, UserStore};
use crate::auth::services::AuthService;
use crate::auth::tokens::TokenRegistry;
use crate::config::AppConfig;
use crate::db;
use crate::memory::{MemoryNoteStore, MemoryTokenStore, MemoryUserStore};
use crate::notes::repo::{NoteStore, PgNoteStore};
use crate::notes::services::NoteService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub notes: NoteService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::connect(url).await?;
                db::migrate(&pool).await;
                tracing::info!("using postgres storage");
                Ok(Self::from_parts(
                    config,
                    Arc::new(PgUserStore::new(pool.clone())),
                    Arc::new(PgTokenStore::new(pool.clone())),
                    Arc::new(PgNoteStore::new(pool)),
                ))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory storage");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        let registry = TokenRegistry::new(tokens, config.tokens.ttl_minutes);
        Self {
            auth: AuthService::new(users, registry),
            notes: NoteService::new(notes, config.notes.clone()),
            config,
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        Self::from_parts(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTokenStore::new()),
            Arc::new(MemoryNoteStore::new()),
        )
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(Default::default())
    }

    #[cfg(test)]
    pub fn fake_with(notes: crate::config::NotesConfig) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            tokens: crate::config::TokenConfig { ttl_minutes: None },
            notes,
        });
        Self::in_memory(config)
    }
}
