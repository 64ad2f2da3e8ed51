use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Rol, Usuario};
use super::services::CreateUsuario;

/// Request body for `POST /api/test-usuarios`. A missing field becomes a validation error.
#[derive(Default, Deserialize)]
pub struct CreateUsuarioRequest {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub rol: Option<String>,
}

impl From<CreateUsuarioRequest> for CreateUsuario {
    fn from(r: CreateUsuarioRequest) -> Self {
        Self {
            nombre: r.nombre.unwrap_or_default(),
            email: r.email.unwrap_or_default(),
            password: r.password.unwrap_or_default(),
            rol: r.rol,
        }
    }
}

/// Outward-facing view of a user; has no password field at all.
#[derive(Debug, Clone, Serialize)]
pub struct UsuarioSafe {
    pub id: i32,
    pub nombre: String,
    pub email: String,
    pub rol: Rol,
    pub activo: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&Usuario> for UsuarioSafe {
    fn from(u: &Usuario) -> Self {
        Self {
            id: u.id,
            nombre: u.nombre.clone(),
            email: u.email.clone(),
            rol: u.rol,
            activo: u.activo,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedUsuarioResponse {
    pub status: u16,
    pub message: &'static str,
    pub usuario: UsuarioSafe,
}
