use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use warp::{http::StatusCode, reject::Reject};

pub type ApiResult<T> = Result<T, ApiError>;

/// Field name to the list of problems found with it, rendered as-is in 400 bodies.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> ApiResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0:?}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("Not found.")]
    NotFound,

    #[error("Invalid page.")]
    InvalidPage,

    #[error("Authentication credentials were not provided.")]
    Unauthorized,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("SQL failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache failed: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token error: {0}")]
    Token(String),
}

impl ApiError {
    /// Shorthand for a validation error on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    pub fn conflict(reason: &str) -> Self {
        Self::Conflict(reason.to_owned())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::InvalidPage => StatusCode::NOT_FOUND,
            ApiError::Unauthorized | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Database(_)
            | ApiError::Cache(_)
            | ApiError::Serialization(_)
            | ApiError::Io(_)
            | ApiError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::Conflict(reason) => json!({ "errors": reason }),
            ApiError::Database(_)
            | ApiError::Cache(_)
            | ApiError::Serialization(_)
            | ApiError::Io(_)
            | ApiError::Token(_) => json!({ "detail": "A server error occurred." }),
            other => json!({ "detail": other.to_string() }),
        }
    }
}

impl Reject for ApiError {}

const UNIQUE_VIOLATION: &str = "23505";

/// True when `err` is a unique-constraint violation on the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(e) => {
            e.code().as_deref() == Some(UNIQUE_VIOLATION) && e.constraint() == Some(constraint)
        }
        _ => false,
    }
}
