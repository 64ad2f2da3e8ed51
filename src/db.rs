use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

use crate::config::DatabaseConfig;

const USUARIOS_DDL: &str = include_str!("../sql/usuarios.sql");

/// Connectivity check against the backing database.
#[async_trait]
pub trait DbProbe: Send + Sync {
    async fn authenticate(&self) -> anyhow::Result<()>;
}

/// Builds the bounded pool. Connections are opened lazily, on first use.
pub fn connect_pool(cfg: &DatabaseConfig) -> PgPool {
    let options = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(&cfg.name);

    PgPoolOptions::new()
        .max_connections(cfg.pool.max_connections)
        .min_connections(cfg.pool.min_connections)
        .acquire_timeout(cfg.pool.acquire_timeout)
        .idle_timeout(Some(cfg.pool.idle_timeout))
        .connect_lazy_with(options)
}

/// Creates the `usuarios` table if it does not exist yet.
pub async fn ensure_schema(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(USUARIOS_DDL)
        .execute(db)
        .await
        .context("create usuarios table")?;
    Ok(())
}

#[derive(Clone)]
pub struct PgProbe {
    db: PgPool,
}

impl PgProbe {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DbProbe for PgProbe {
    async fn authenticate(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.db)
            .await
            .context("database authenticate")?;
        Ok(())
    }
}
