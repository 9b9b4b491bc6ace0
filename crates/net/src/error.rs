use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;


/// Body of every `{ "msg": ... }` response, acknowledgements included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub msg: String,
}

impl Message {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct FieldErrors {
    errors: Vec<FieldError>,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("database error: {0}")]
    Database(#[from] libmdbx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProfileError {
    /// Flattens `validator` output, keeping the fields in `order` (declaration
    /// order of the request type). Unknown fields go last, by name.
    pub fn validation(errors: ValidationErrors, order: &[&str]) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, list)| {
                list.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();

        let rank = |field: &str| order.iter().position(|f| *f == field).unwrap_or(usize::MAX);
        fields.sort_by(|a, b| {
            rank(&a.field)
                .cmp(&rank(&b.field))
                .then_with(|| a.field.cmp(&b.field))
        });
        ProfileError::Validation(fields)
    }
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        match self {
            ProfileError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(FieldErrors { errors })).into_response()
            }
            ProfileError::MalformedBody(msg) => {
                (StatusCode::BAD_REQUEST, Json(Message::new(msg))).into_response()
            }
            ProfileError::NotFound(msg) => {
                (StatusCode::BAD_REQUEST, Json(Message::new(msg))).into_response()
            }
            ProfileError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(Message::new(msg))).into_response()
            }
            // the cause stays in the logs, callers only see a generic message
            ProfileError::Database(_) | ProfileError::Serialization(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response()
            }
        }
    }
}
