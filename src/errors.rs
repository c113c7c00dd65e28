use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
///
/// Data-quality problems in sale records never end up here; they are
/// tolerated record by record. These variants cover malformed requests and
/// configuration bugs.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Bad request error (invalid input shape).
    BadRequest(String),
    /// Tier table violates its construction rules.
    InvalidTierTable(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InvalidTierTable(msg) => write!(f, "Invalid tier table: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Server-side failures are logged before the response is built.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidTierTable(msg) => {
                tracing::error!("Tier table misconfigured: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Journey configuration error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return (**source).clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_source() {
        let result: Result<(), AppError> =
            Err(AppError::InvalidTierTable("empty".to_string()));
        let err = result.context("loading JOURNEY_TIERS").unwrap_err();

        assert_eq!(
            err.to_string(),
            "loading JOURNEY_TIERS: Invalid tier table: empty"
        );
    }

    #[test]
    fn test_status_codes() {
        let bad = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let wrapped = AppError::WithContext {
            source: Box::new(AppError::InvalidTierTable("boom".to_string())),
            context: "ctx".to_string(),
        }
        .into_response();
        assert_eq!(wrapped.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
