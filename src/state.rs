use crate::config::AppConfig;
use crate::db::{self, DbProbe, PgProbe};
use crate::usuarios::{PgUsuarioRepo, UsuarioStore};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<dyn DbProbe>,
    pub usuarios: UsuarioStore,
}

/// State plus the raw pool, which startup still needs for schema setup.
pub struct Bootstrap {
    pub state: AppState,
    pub pool: PgPool,
}

impl AppState {
    pub fn init() -> anyhow::Result<Bootstrap> {
        let config = Arc::new(AppConfig::from_env()?);
        tracing::debug!(database = ?config.database, "database config loaded");

        let pool = db::connect_pool(&config.database);
        let repo = Arc::new(PgUsuarioRepo::new(pool.clone()));
        let state = Self::from_parts(
            config.clone(),
            Arc::new(PgProbe::new(pool.clone())),
            UsuarioStore::new(repo, config.hash_cost),
        );
        Ok(Bootstrap { state, pool })
    }

    pub fn from_parts(config: Arc<AppConfig>, db: Arc<dyn DbProbe>, usuarios: UsuarioStore) -> Self {
        Self {
            config,
            db,
            usuarios,
        }
    }

    #[cfg(test)]
    pub fn fake(db_up: bool) -> Self {
        use crate::usuarios::repo::memory::MemoryUsuarioRepo;
        use async_trait::async_trait;

        struct FakeProbe(bool);
        #[async_trait]
        impl DbProbe for FakeProbe {
            async fn authenticate(&self) -> anyhow::Result<()> {
                if self.0 {
                    Ok(())
                } else {
                    anyhow::bail!("connect ECONNREFUSED 127.0.0.1:5432")
                }
            }
        }

        let config = Arc::new(
            AppConfig::from_lookup(|key| (key == "DB_NAME").then(|| "biblioteca_test".to_string()))
                .expect("static config is valid"),
        );
        let usuarios = UsuarioStore::new(Arc::new(MemoryUsuarioRepo::default()), config.hash_cost);
        Self::from_parts(config, Arc::new(FakeProbe(db_up)), usuarios)
    }
}
