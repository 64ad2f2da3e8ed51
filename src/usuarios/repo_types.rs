use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use super::validation::ValidationError;

/// Role stored on a user account. Not enforced anywhere yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Admin,
    Bibliotecario,
    #[default]
    Usuario,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Admin => "admin",
            Rol::Bibliotecario => "bibliotecario",
            Rol::Usuario => "usuario",
        }
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Rol::Admin),
            "bibliotecario" => Ok(Rol::Bibliotecario),
            "usuario" => Ok(Rol::Usuario),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }
}

/// A persisted user account. Not `Serialize`; responses go through `UsuarioSafe`.
#[derive(Clone, PartialEq, Eq)]
pub struct Usuario {
    pub id: i32,
    pub nombre: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string
    pub rol: Rol,
    pub activo: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl fmt::Debug for Usuario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Usuario")
            .field("id", &self.id)
            .field("nombre", &self.nombre)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("rol", &self.rol)
            .field("activo", &self.activo)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Raw `usuarios` row as returned by Postgres.
#[derive(FromRow)]
pub struct UsuarioRow {
    pub id: i32,
    pub nombre: String,
    pub email: String,
    pub password: String,
    pub rol: String,
    pub activo: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UsuarioRow> for Usuario {
    type Error = anyhow::Error;

    fn try_from(r: UsuarioRow) -> Result<Self, Self::Error> {
        let rol = r
            .rol
            .parse::<Rol>()
            .map_err(|e| anyhow::anyhow!("usuario {} has corrupt rol: {}", r.id, e))?;
        Ok(Self {
            id: r.id,
            nombre: r.nombre,
            email: r.email,
            password_hash: r.password,
            rol,
            activo: r.activo,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Columns to overwrite on update; `None` keeps the stored value.
#[derive(Clone, Default)]
pub struct UsuarioPatch {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
}

impl UsuarioPatch {
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.rol.is_none()
            && self.activo.is_none()
    }
}

/// Validated, already-hashed values for an insert.
#[derive(Clone)]
pub struct NewUsuario {
    pub nombre: String,
    pub email: String,
    pub password_hash: String,
    pub rol: Rol,
    pub activo: bool,
}
