use std::sync::Arc;

use tracing::{debug, info, warn};

use super::dto::UsuarioSafe;
use super::password::{hash_password_blocking, verify_password_blocking};
use super::repo::{RepoError, UsuarioRepo};
use super::repo_types::{NewUsuario, Rol, Usuario, UsuarioPatch};
use super::validation::{
    validate_email, validate_nombre, validate_password, validate_rol, ValidationError,
};
use crate::config::HashCost;

#[derive(Debug, thiserror::Error)]
pub enum UsuarioError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Este email ya está registrado")]
    DuplicateEmail,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for UsuarioError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::DuplicateEmail => UsuarioError::DuplicateEmail,
            RepoError::Other(e) => UsuarioError::Internal(e),
        }
    }
}

/// Raw fields for a new account, as received from a client.
#[derive(Clone, Default)]
pub struct CreateUsuario {
    pub nombre: String,
    pub email: String,
    pub password: String,
    pub rol: Option<String>,
}

/// Partial update. `None` leaves the stored value alone.
#[derive(Clone, Default)]
pub struct UsuarioChanges {
    pub nombre: Option<String>,
    pub email: Option<String>,
    /// Raw password; hashed here, never stored as given.
    pub password: Option<String>,
    pub rol: Option<Rol>,
    pub activo: Option<bool>,
}

/// Owns the credential rules: validation, hashing and the unique-email contract.
#[derive(Clone)]
pub struct UsuarioStore {
    repo: Arc<dyn UsuarioRepo>,
    cost: HashCost,
}

impl UsuarioStore {
    pub fn new(repo: Arc<dyn UsuarioRepo>, cost: HashCost) -> Self {
        Self { repo, cost }
    }

    pub async fn create(&self, input: CreateUsuario) -> Result<Usuario, UsuarioError> {
        let nombre = validate_nombre(&input.nombre)?;
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;
        let rol = validate_rol(input.rol.as_deref())?;

        let password_hash = hash_password_blocking(input.password, self.cost).await?;

        let usuario = self
            .repo
            .insert(NewUsuario {
                nombre,
                email,
                password_hash,
                rol,
                activo: true,
            })
            .await
            .map_err(|e| {
                if matches!(e, RepoError::DuplicateEmail) {
                    warn!("usuario create rejected: email already registered");
                }
                UsuarioError::from(e)
            })?;

        info!(usuario_id = usuario.id, rol = %usuario.rol, "usuario created");
        Ok(usuario)
    }

    pub async fn verify_password(
        &self,
        usuario: &Usuario,
        candidate: &str,
    ) -> Result<bool, UsuarioError> {
        let ok =
            verify_password_blocking(candidate.to_string(), usuario.password_hash.clone()).await?;
        debug!(usuario_id = usuario.id, ok, "password verified");
        Ok(ok)
    }

    pub fn to_safe_view(&self, usuario: &Usuario) -> UsuarioSafe {
        UsuarioSafe::from(usuario)
    }

    pub async fn update(
        &self,
        usuario: &Usuario,
        changes: UsuarioChanges,
    ) -> Result<Usuario, UsuarioError> {
        let mut patch = UsuarioPatch {
            nombre: changes.nombre.as_deref().map(validate_nombre).transpose()?,
            email: changes.email.as_deref().map(validate_email).transpose()?,
            password_hash: None,
            rol: changes.rol,
            activo: changes.activo,
        };

        if let Some(password) = changes.password {
            validate_password(&password)?;
            // `usuario` may be stale; compare against the stored hash.
            let stored = self
                .repo
                .find_by_id(usuario.id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("usuario {} not found", usuario.id))?;
            let unchanged = verify_password_blocking(password.clone(), stored.password_hash).await?;
            if !unchanged {
                patch.password_hash = Some(hash_password_blocking(password, self.cost).await?);
                debug!(usuario_id = usuario.id, "password rehashed");
            }
        }

        if patch.is_empty() {
            return self
                .repo
                .find_by_id(usuario.id)
                .await?
                .ok_or_else(|| {
                    UsuarioError::Internal(anyhow::anyhow!("usuario {} not found", usuario.id))
                });
        }

        let updated = self.repo.update(usuario.id, patch).await?;
        info!(usuario_id = updated.id, "usuario updated");
        Ok(updated)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Usuario>, UsuarioError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Usuario>, UsuarioError> {
        Ok(self.repo.find_by_email(&email.trim().to_lowercase()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usuarios::repo::memory::MemoryUsuarioRepo;

    fn store() -> (UsuarioStore, Arc<MemoryUsuarioRepo>) {
        let repo = Arc::new(MemoryUsuarioRepo::default());
        (UsuarioStore::new(repo.clone(), HashCost::default()), repo)
    }

    fn input(nombre: &str, email: &str, password: &str) -> CreateUsuario {
        CreateUsuario {
            nombre: nombre.into(),
            email: email.into(),
            password: password.into(),
            rol: None,
        }
    }

    #[tokio::test]
    async fn create_hashes_password_and_applies_defaults() {
        let (store, repo) = store();
        let u = store
            .create(input("Ana Li", "Ana@X.com", "secret1"))
            .await
            .expect("create");

        assert_eq!(u.id, 1);
        assert_eq!(u.nombre, "Ana Li");
        assert_eq!(u.email, "ana@x.com");
        assert_eq!(u.rol, Rol::Usuario);
        assert!(u.activo);
        assert_ne!(u.password_hash, "secret1");
        assert!(u.password_hash.starts_with("$argon2id$"));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn create_honours_valid_role_and_rejects_unknown() {
        let (store, repo) = store();
        let mut req = input("Bea", "bea@x.com", "secret1");
        req.rol = Some("bibliotecario".into());
        assert_eq!(store.create(req).await.unwrap().rol, Rol::Bibliotecario);

        let mut req = input("Carl", "carl@x.com", "secret1");
        req.rol = Some("user".into());
        let err = store.create(req).await.unwrap_err();
        assert!(matches!(
            err,
            UsuarioError::Validation(ValidationError::InvalidRole(_))
        ));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn verify_password_accepts_only_the_original() {
        let (store, _) = store();
        let u = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        assert!(store.verify_password(&u, "secret1").await.unwrap());
        assert!(!store.verify_password(&u, "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_keeps_one_row() {
        let (store, repo) = store();
        store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let err = store
            .create(input("Ana Otra", "ANA@x.com", "secret2"))
            .await
            .unwrap_err();

        assert!(matches!(err, UsuarioError::DuplicateEmail));
        assert_eq!(err.to_string(), "Este email ya está registrado");
        assert_eq!(repo.count_by_email("ana@x.com"), 1);
        let kept = store.find_by_email("ana@x.com").await.unwrap().unwrap();
        assert_eq!(kept.nombre, "Ana Li");
    }

    #[tokio::test]
    async fn length_boundaries() {
        let (store, repo) = store();

        let err = store.create(input("A", "a@x.com", "secret1")).await.unwrap_err();
        assert!(matches!(
            err,
            UsuarioError::Validation(ValidationError::NombreLength)
        ));

        let err = store.create(input("Al", "a@x.com", "12345")).await.unwrap_err();
        assert!(matches!(
            err,
            UsuarioError::Validation(ValidationError::PasswordTooShort)
        ));
        assert_eq!(repo.len(), 0);

        store
            .create(input("Al", "a@x.com", "123456"))
            .await
            .expect("boundary values are accepted");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn safe_view_never_carries_password() {
        let (store, _) = store();
        let u = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let json = serde_json::to_value(store.to_safe_view(&u)).unwrap();
        let obj = json.as_object().unwrap();

        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("password_hash"));
        assert!(!json.to_string().contains(&u.password_hash));
        assert_eq!(obj["email"], "ana@x.com");
    }

    #[tokio::test]
    async fn update_without_password_keeps_hash() {
        let (store, _) = store();
        let u = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let updated = store
            .update(
                &u,
                UsuarioChanges {
                    nombre: Some("Ana María".into()),
                    activo: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.nombre, "Ana María");
        assert!(!updated.activo);
        assert_eq!(updated.password_hash, u.password_hash);
        assert_eq!(updated.created_at, u.created_at);
    }

    #[tokio::test]
    async fn update_with_new_password_rehashes() {
        let (store, _) = store();
        let u = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let updated = store
            .update(
                &u,
                UsuarioChanges {
                    password: Some("secret2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_ne!(updated.password_hash, u.password_hash);
        assert_ne!(updated.password_hash, "secret2");
        assert!(store.verify_password(&updated, "secret2").await.unwrap());
        assert!(!store.verify_password(&updated, "secret1").await.unwrap());

        let stored = store.find_by_id(u.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, updated.password_hash);
    }

    #[tokio::test]
    async fn update_with_same_password_keeps_hash() {
        let (store, _) = store();
        let u = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let updated = store
            .update(
                &u,
                UsuarioChanges {
                    password: Some("secret1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.password_hash, u.password_hash);
    }

    #[tokio::test]
    async fn update_validates_and_enforces_unique_email() {
        let (store, _) = store();
        let ana = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        store
            .create(input("Bea", "bea@x.com", "secret1"))
            .await
            .unwrap();

        let err = store
            .update(
                &ana,
                UsuarioChanges {
                    email: Some("bea@x.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UsuarioError::DuplicateEmail));

        let err = store
            .update(
                &ana,
                UsuarioChanges {
                    password: Some("short".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UsuarioError::Validation(ValidationError::PasswordTooShort)
        ));

        let stored = store.find_by_id(ana.id).await.unwrap().unwrap();
        assert_eq!(stored, ana);
    }

    #[tokio::test]
    async fn stale_handle_cannot_roll_back_the_password() {
        let (store, _) = store();
        let stale = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let current = store
            .update(
                &stale,
                UsuarioChanges {
                    password: Some("secret2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let renamed = store
            .update(
                &stale,
                UsuarioChanges {
                    nombre: Some("Ana María".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(renamed.nombre, "Ana María");
        assert_eq!(renamed.password_hash, current.password_hash);
        assert!(store.verify_password(&renamed, "secret2").await.unwrap());
        assert!(!store.verify_password(&renamed, "secret1").await.unwrap());
    }

    #[tokio::test]
    async fn rehash_decision_uses_the_stored_hash() {
        let (store, _) = store();
        let stale = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        store
            .update(
                &stale,
                UsuarioChanges {
                    password: Some("secret2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // "secret1" matches the stale handle but not the stored row.
        let reverted = store
            .update(
                &stale,
                UsuarioChanges {
                    password: Some("secret1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(store.verify_password(&reverted, "secret1").await.unwrap());

        let stored = store.find_by_id(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, reverted.password_hash);
    }

    #[tokio::test]
    async fn empty_update_returns_the_stored_row() {
        let (store, _) = store();
        let stale = store
            .create(input("Ana Li", "ana@x.com", "secret1"))
            .await
            .unwrap();
        store
            .update(
                &stale,
                UsuarioChanges {
                    activo: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let same = store.update(&stale, UsuarioChanges::default()).await.unwrap();
        assert!(!same.activo);
    }
}
