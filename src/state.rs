use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::services::SessionStore;
use crate::catalog::repo::Catalog;
use crate::clock::{SystemClock, TokioDelay};
use crate::config::AppConfig;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionStore>,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let kv: Arc<dyn KeyValueStore> = match &config.store_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => {
                tracing::warn!("STORE_PATH not set; sessions live in memory only");
                Arc::new(MemoryStore::new())
            }
        };
        let sessions = Arc::new(SessionStore::new(
            kv,
            Arc::new(SystemClock),
            Arc::new(TokioDelay),
            config.auth.clone(),
        ));
        let catalog = Arc::new(Catalog::load()?);
        tracing::info!(
            entries = catalog.entries().len(),
            characters = catalog.characters().len(),
            "catalog loaded"
        );

        Ok(Self {
            config: Arc::new(config),
            sessions,
            catalog,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::clock::NoDelay;
        use crate::config::AuthConfig;

        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            store_path: None,
            auth: AuthConfig::instant(),
        };
        let sessions = Arc::new(SessionStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            Arc::new(NoDelay),
            config.auth.clone(),
        ));
        Self {
            config: Arc::new(config),
            sessions,
            catalog: Arc::new(Catalog::load().expect("seed catalog parses")),
        }
    }
}

impl FromRef<AppState> for Arc<SessionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}
