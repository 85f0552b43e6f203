use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::AppError;
use crate::router::AppState;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub database: String,
}

/// Liveness of the shared database session.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthBody>, AppError> {
    state.db.ping().await?;
    Ok(Json(HealthBody {
        status: "ok",
        database: state.db.info().database.clone(),
    }))
}
