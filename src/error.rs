use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::domain::new_subscriber::NewSubscriberError;

#[derive(thiserror::Error)]
pub enum NewsletterError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("unsupported HTTP method: {0}")]
    MethodNotAllowed(String),
    #[error("error processing request: {0}")]
    Storage(#[source] sqlx::Error),
    #[error("database connection error: {source}")]
    Bootstrap {
        #[source]
        source: sqlx::Error,
        host: String,
        database: String,
    },
}

impl From<NewSubscriberError> for NewsletterError {
    fn from(err: NewSubscriberError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<sqlx::Error> for NewsletterError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err)
    }
}

impl std::fmt::Debug for NewsletterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for NewsletterError {
    fn status_code(&self) -> StatusCode {
        match self {
            NewsletterError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            NewsletterError::Conflict(_) => StatusCode::CONFLICT,
            NewsletterError::NotFound(_) => StatusCode::NOT_FOUND,
            NewsletterError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            NewsletterError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NewsletterError::Bootstrap { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "success": false,
            "message": self.to_string(),
        });

        if let NewsletterError::Bootstrap { host, database, .. } = self {
            body["debug_info"] = json!({
                "driver_loaded": true,
                "host": host,
                "database": database,
            });
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Writes the error followed by every error in its `source` chain.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
