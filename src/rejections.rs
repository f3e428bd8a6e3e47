use std::collections::BTreeMap;

use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use thiserror::Error;

use crate::response::ApiResponse;

/// Field name -> messages, rendered under `errors` of a 400 envelope.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, errors: Value },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl AppError {
    pub fn invalid(errors: FieldErrors) -> Self {
        AppError::Validation {
            message: "Validation error.".to_string(),
            errors: json!(errors),
        }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::invalid(errors)
    }

    /// A 400 carrying only a message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            errors: Value::Null,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation { message, errors } => {
                let response = ApiResponse::bad_request(message);
                if errors.is_null() {
                    response.into_response()
                } else {
                    response.with_errors(errors).into_response()
                }
            }
            AppError::NotFound(message) => ApiResponse::not_found(message).into_response(),
            AppError::Unauthorized(message) => ApiResponse::unauthorized(message).into_response(),
            AppError::Internal(_) => {
                ApiResponse::internal("Internal server error.").into_response()
            }
        }
    }
}

pub trait ResultExt<T> {
    /// Log the underlying error and surface it as a 500.
    fn reject(self, message: &'static str) -> Result<T, AppError>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for Result<T, E> {
    fn reject(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{message}: {e:?}");
            AppError::Internal(message)
        })
    }
}
