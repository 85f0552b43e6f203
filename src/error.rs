use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

/// Coarse classification of startup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapErrorKind {
    Connection,
    Provisioning,
    Switch,
}

/// Failure of one step of the startup sequence. Every variant is fatal to the binary.
#[derive(Debug, ThisError)]
pub enum BootstrapError {
    #[error("error connecting to MySQL: {0}")]
    Connect(#[source] SqlxError),

    #[error("invalid database name {0:?}: expected 1-64 characters of [A-Za-z0-9_]")]
    InvalidDatabaseName(String),

    #[error("error creating database '{name}': {source}")]
    CreateDatabase {
        name: String,
        #[source]
        source: SqlxError,
    },

    #[error("error switching to database '{name}': {source}")]
    SwitchDatabase {
        name: String,
        #[source]
        source: SqlxError,
    },

    #[error("error creating users table: {0}")]
    CreateTable(#[source] SqlxError),
}

impl BootstrapError {
    pub fn kind(&self) -> BootstrapErrorKind {
        match self {
            BootstrapError::Connect(_) => BootstrapErrorKind::Connection,
            BootstrapError::InvalidDatabaseName(_)
            | BootstrapError::CreateDatabase { .. }
            | BootstrapError::CreateTable(_) => BootstrapErrorKind::Provisioning,
            BootstrapError::SwitchDatabase { .. } => BootstrapErrorKind::Switch,
        }
    }
}

#[derive(Debug, ThisError)]
pub enum AppError {
    #[error("a user with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no base URL source produced a usable value")]
    NoBaseUrl,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            AppError::Database(_) => {
                let status = StatusCode::SERVICE_UNAVAILABLE;
                let body = ApiErrorBody {
                    code: "DATABASE_UNAVAILABLE".to_string(),
                    message: "The database is unavailable.".to_string(),
                };
                (status, body)
            }
            AppError::DuplicateEmail(_) => {
                let status = StatusCode::CONFLICT;
                let body = ApiErrorBody {
                    code: "DUPLICATE_EMAIL".to_string(),
                    message: "A user with this email already exists.".to_string(),
                };
                (status, body)
            }
            AppError::Reqwest(_) | AppError::UrlParse(_) | AppError::NoBaseUrl => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "Upstream service is unavailable.".to_string(),
                };
                (status, body)
            }
            AppError::Json(_) | AppError::Io(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                };
                (status, body)
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
