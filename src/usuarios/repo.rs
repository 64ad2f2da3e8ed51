use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewUsuario, Usuario, UsuarioPatch, UsuarioRow};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence seam for user accounts.
#[async_trait]
pub trait UsuarioRepo: Send + Sync {
    /// Inserts one row; the store assigns id and timestamps.
    async fn insert(&self, new: NewUsuario) -> Result<Usuario, RepoError>;
    /// Writes only the columns set in `patch` and bumps `updated_at`.
    async fn update(&self, id: i32, patch: UsuarioPatch) -> Result<Usuario, RepoError>;
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<Usuario>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Usuario>>;
}

#[derive(Clone)]
pub struct PgUsuarioRepo {
    db: PgPool,
}

impl PgUsuarioRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_err(e: sqlx::Error, what: &'static str) -> RepoError {
    // `email` is the only unique column on the table.
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepoError::DuplicateEmail;
        }
    }
    RepoError::Other(anyhow::Error::new(e).context(what))
}

#[async_trait]
impl UsuarioRepo for PgUsuarioRepo {
    async fn insert(&self, new: NewUsuario) -> Result<Usuario, RepoError> {
        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            INSERT INTO usuarios (nombre, email, password, rol, activo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nombre, email, password, rol, activo, created_at, updated_at
            "#,
        )
        .bind(&new.nombre)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.rol.as_str())
        .bind(new.activo)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_err(e, "insert usuario"))?;
        Ok(Usuario::try_from(row)?)
    }

    async fn update(&self, id: i32, patch: UsuarioPatch) -> Result<Usuario, RepoError> {
        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            UPDATE usuarios
               SET nombre   = COALESCE($2, nombre),
                   email    = COALESCE($3, email),
                   password = COALESCE($4, password),
                   rol      = COALESCE($5, rol),
                   activo   = COALESCE($6, activo),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, nombre, email, password, rol, activo, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.nombre)
        .bind(patch.email)
        .bind(patch.password_hash)
        .bind(patch.rol.map(|r| r.as_str()))
        .bind(patch.activo)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_write_err(e, "update usuario"))?
        .ok_or_else(|| anyhow::anyhow!("usuario {} not found", id))?;
        Ok(Usuario::try_from(row)?)
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<Usuario>> {
        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            SELECT id, nombre, email, password, rol, activo, created_at, updated_at
            FROM usuarios
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find usuario by id")?;
        row.map(Usuario::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Usuario>> {
        let row = sqlx::query_as::<_, UsuarioRow>(
            r#"
            SELECT id, nombre, email, password, rol, activo, created_at, updated_at
            FROM usuarios
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find usuario by email")?;
        row.map(Usuario::try_from).transpose()
    }
}
