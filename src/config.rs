use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

#[derive(Clone)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub pool: PoolConfig,
}

// Keeps the password out of logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Bounds of the shared connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

/// Argon2 cost parameters used when hashing new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub hash_cost: HashCost,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, fallback: &str| lookup(key).unwrap_or_else(|| fallback.into());

        let pool = PoolConfig {
            max_connections: parse_or(&lookup, "DB_POOL_MAX", 5)?,
            min_connections: parse_or(&lookup, "DB_POOL_MIN", 0)?,
            acquire_timeout: Duration::from_millis(parse_or(&lookup, "DB_POOL_ACQUIRE_MS", 30_000)?),
            idle_timeout: Duration::from_millis(parse_or(&lookup, "DB_POOL_IDLE_MS", 10_000)?),
        };
        anyhow::ensure!(
            pool.min_connections <= pool.max_connections,
            "DB_POOL_MIN must not exceed DB_POOL_MAX"
        );

        let database = DatabaseConfig {
            name: get("DB_NAME", "biblioteca_db"),
            user: get("DB_USER", "postgres"),
            password: get("DB_PASSWORD", ""),
            host: lookup("DB_HOST")
                .or_else(|| lookup("HOST"))
                .unwrap_or_else(|| "localhost".into()),
            port: parse_or(&lookup, "DB_PORT", 5432)?,
            pool,
        };

        let defaults = HashCost::default();
        let hash_cost = HashCost {
            memory_kib: parse_or(&lookup, "HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "HASH_PARALLELISM", defaults.parallelism)?,
        };

        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid APP_PORT/PORT value {raw:?}"))?,
            None => 3000,
        };

        Ok(Self {
            host: get("APP_HOST", "0.0.0.0"),
            port,
            database,
            hash_cost,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value {raw:?}")),
        None => Ok(default),
    }
}
