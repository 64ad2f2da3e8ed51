use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{error, instrument};

use super::dto::{DbCheckResponse, HealthResponse};
use crate::{error::ApiError, state::AppState};

const MSG_HEALTHY: &str = "El API está funcionando";
const MSG_DB_OK: &str = "Conexión a la base de datos establecida correctamente.";
const MSG_DB_FAILED: &str = "No se pudo conectar a la base de datos";

pub fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health).fallback(route_not_found))
        .route("/api/testmysql", get(test_db).fallback(route_not_found))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: StatusCode::OK.as_u16(),
        message: MSG_HEALTHY,
        timestamp: OffsetDateTime::now_utc(),
    })
}

#[instrument(skip(state))]
pub async fn test_db(State(state): State<AppState>) -> Result<Json<DbCheckResponse>, ApiError> {
    match state.db.authenticate().await {
        Ok(()) => Ok(Json(DbCheckResponse {
            status: StatusCode::OK.as_u16(),
            message: MSG_DB_OK,
            database: state.config.database.name.clone(),
            timestamp: OffsetDateTime::now_utc(),
        })),
        Err(e) => {
            error!(error = %format!("{e:#}"), "database check failed");
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_DB_FAILED)
                .with_detail(format!("{e:#}")))
        }
    }
}

/// Catch-all for unknown paths and unsupported methods.
pub async fn route_not_found() -> ApiError {
    ApiError::not_found()
}
