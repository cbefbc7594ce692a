use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::origination::router::service_error_response;
use crate::workflows::origination::{
    AuthError, DocumentError, EmiError, OriginationServiceError, RepositoryError, WizardError,
};
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
    Origination(OriginationServiceError),
    Wizard(WizardError),
    Document(DocumentError),
    Auth(AuthError),
    Emi(EmiError),
    Seed(RepositoryError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Origination(err) => write!(f, "origination error: {}", err),
            AppError::Wizard(err) => write!(f, "application wizard error: {}", err),
            AppError::Document(err) => write!(f, "document error: {}", err),
            AppError::Auth(err) => write!(f, "sign-in error: {}", err),
            AppError::Emi(err) => write!(f, "installment error: {}", err),
            AppError::Seed(err) => write!(f, "failed to seed demo data: {}", err),
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
            AppError::Origination(err) => Some(err),
            AppError::Wizard(err) => Some(err),
            AppError::Document(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Emi(err) => Some(err),
            AppError::Seed(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Origination(err) => return service_error_response(err),
            AppError::Wizard(_) | AppError::Document(_) | AppError::Emi(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Seed(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

impl From<OriginationServiceError> for AppError {
    fn from(value: OriginationServiceError) -> Self {
        Self::Origination(value)
    }
}

impl From<WizardError> for AppError {
    fn from(value: WizardError) -> Self {
        Self::Wizard(value)
    }
}

impl From<DocumentError> for AppError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<EmiError> for AppError {
    fn from(value: EmiError) -> Self {
        Self::Emi(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Seed(value)
    }
}
