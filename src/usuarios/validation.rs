use lazy_static::lazy_static;
use regex::Regex;

use super::repo_types::Rol;

pub const NOMBRE_MIN: usize = 2;
pub const NOMBRE_MAX: usize = 100;
pub const EMAIL_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 255;

/// A single violated field rule. The message is what API clients see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("El nombre es requerido")]
    MissingNombre,
    #[error("El nombre debe tener entre 2 y 100 caracteres")]
    NombreLength,
    #[error("El email es requerido")]
    MissingEmail,
    #[error("Debe ser un email válido")]
    InvalidEmail,
    #[error("El email no puede superar 100 caracteres")]
    EmailTooLong,
    #[error("La contraseña es requerida")]
    MissingPassword,
    #[error("La contraseña debe tener al menos 6 caracteres")]
    PasswordTooShort,
    #[error("La contraseña no puede superar 255 caracteres")]
    PasswordTooLong,
    #[error("Rol inválido: {0}")]
    InvalidRole(String),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        // Domain: non-empty labels that neither start nor end with '-', then an alphabetic TLD.
        static ref EMAIL_RE: Regex = Regex::new(
            r"^[^@\s.][^@\s]*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
        )
        .expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

pub fn validate_nombre(nombre: &str) -> Result<String, ValidationError> {
    let nombre = nombre.trim();
    if nombre.is_empty() {
        return Err(ValidationError::MissingNombre);
    }
    let len = nombre.chars().count();
    if !(NOMBRE_MIN..=NOMBRE_MAX).contains(&len) {
        return Err(ValidationError::NombreLength);
    }
    Ok(nombre.to_string())
}

/// Returns the normalized (trimmed, lower-cased) address.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if email.chars().count() > EMAIL_MAX {
        return Err(ValidationError::EmailTooLong);
    }
    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

// Passwords are taken verbatim; whitespace is significant.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len == 0 {
        return Err(ValidationError::MissingPassword);
    }
    if len < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > PASSWORD_MAX {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// `None` falls back to the default role; anything else must be a known role.
pub fn validate_rol(rol: Option<&str>) -> Result<Rol, ValidationError> {
    match rol.map(str::trim) {
        None | Some("") => Ok(Rol::default()),
        Some(raw) => raw.to_lowercase().parse(),
    }
}
