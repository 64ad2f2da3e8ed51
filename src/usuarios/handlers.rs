use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    error::ApiError,
    state::AppState,
    system::handlers::route_not_found,
    usuarios::dto::{CreateUsuarioRequest, CreatedUsuarioResponse},
};

const MSG_CREATED: &str = "Usuario creado exitosamente";
const MSG_CREATE_FAILED: &str = "Error al crear el usuario";

pub fn usuario_routes() -> Router<AppState> {
    Router::new().route(
        "/api/test-usuarios",
        post(create_usuario).fallback(route_not_found),
    )
}

#[instrument(skip(state, payload))]
pub async fn create_usuario(
    State(state): State<AppState>,
    payload: Result<Json<CreateUsuarioRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedUsuarioResponse>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "malformed usuario payload");
        ApiError::bad_request(MSG_CREATE_FAILED, rejection.body_text())
    })?;

    let usuario = state
        .usuarios
        .create(payload.into())
        .await
        .map_err(|e| ApiError::from_usuario(MSG_CREATE_FAILED, e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedUsuarioResponse {
            status: StatusCode::CREATED.as_u16(),
            message: MSG_CREATED,
            usuario: state.usuarios.to_safe_view(&usuario),
        }),
    ))
}
