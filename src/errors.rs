use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Could not register account")]
    DuplicateLogin,

    #[error("Unknown login")]
    UnknownLogin,

    #[error("Password does not match")]
    InvalidCredential,

    #[error("Not found")]
    NotFound,

    #[error("Password error: {0}")]
    PasswordError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] SqlxError),
}

impl AppError {
    /// Message shown to the client. Auth failures collapse to one text and
    /// server-side failures never expose their cause.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::DuplicateLogin | AppError::NotFound => self.to_string(),
            AppError::UnknownLogin | AppError::InvalidCredential => {
                "Invalid login or password".to_owned()
            }
            _ => "Internal server error".to_owned(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateLogin => StatusCode::BAD_REQUEST,
            AppError::UnknownLogin => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PasswordError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SqlxError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        HttpResponse::build(status).json(json!({ "message": self.public_message() }))
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}
