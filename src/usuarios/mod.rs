use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validation;

pub use repo::{PgUsuarioRepo, UsuarioRepo};
pub use services::UsuarioStore;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::usuario_routes())
}
