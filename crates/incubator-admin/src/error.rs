use crate::config::ConfigError;
use crate::notifications::MailError;
use crate::telemetry::TelemetryError;
use crate::workflows::timeline::{RepositoryError, TimelineServiceError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Timeline(TimelineServiceError),
    Notification(MailError),
    InvalidRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Timeline(err) => write!(f, "timeline error: {}", err),
            AppError::Notification(err) => write!(f, "notification error: {}", err),
            AppError::InvalidRequest(reason) => write!(f, "invalid request: {}", reason),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Timeline(err) => Some(err),
            AppError::Notification(err) => Some(err),
            AppError::InvalidRequest(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeline(TimelineServiceError::Link(_))
            | AppError::Notification(MailError::NoRecipients(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Timeline(TimelineServiceError::Repository(RepositoryError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Timeline(TimelineServiceError::Repository(
                RepositoryError::Conflict | RepositoryError::VersionMismatch { .. },
            )) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Timeline(_)
            | AppError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<TimelineServiceError> for AppError {
    fn from(value: TimelineServiceError) -> Self {
        Self::Timeline(value)
    }
}

impl From<MailError> for AppError {
    fn from(value: MailError) -> Self {
        Self::Notification(value)
    }
}
