// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for discovery, roulette and favorites

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;

/// Application-specific error types
/// DOCUMENTATION: Every failure the engine can report
/// Each variant maps to an HTTP status code and a JSON error body; none of
/// them is allowed to take the process down.
#[derive(Error, Debug)]
pub enum RouletteError {
    /// Geodata fetch or parse failure. The place provider recovers from it
    /// locally and surfaces an empty result set instead.
    #[error("Discovery failed: {0}")]
    DiscoveryFailure(String),

    #[error("No restaurants match right now. Try relaxing your filters or increasing your radius")]
    NoCandidates,

    #[error("You've used all {limit} spins for today")]
    QuotaExceeded { limit: u32 },

    /// A concurrent spin advanced the quota between read and write
    #[error("Your spin count changed while spinning, please try again")]
    StaleQuota,

    #[error("A spin is already in progress")]
    SpinInProgress,

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<StoreError> for RouletteError {
    fn from(err: StoreError) -> Self {
        RouletteError::PersistenceFailure(err.to_string())
    }
}

impl RouletteError {
    fn error_code(&self) -> &'static str {
        match self {
            RouletteError::DiscoveryFailure(_) => "DISCOVERY_FAILURE",
            RouletteError::NoCandidates => "NO_CANDIDATES",
            RouletteError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            RouletteError::StaleQuota => "STALE_QUOTA",
            RouletteError::SpinInProgress => "SPIN_IN_PROGRESS",
            RouletteError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            RouletteError::LocationUnavailable(_) => "LOCATION_UNAVAILABLE",
            RouletteError::AuthRequired => "AUTH_REQUIRED",
            RouletteError::InvalidInput(_) => "INVALID_INPUT",
            RouletteError::ValidationError(_) => "VALIDATION_ERROR",
        }
    }
}

/// Convert RouletteError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for RouletteError {
    fn error_response(&self) -> HttpResponse {
        let mut error = json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        if let RouletteError::QuotaExceeded { limit } = self {
            error["limit"] = json!(limit);
        }

        HttpResponse::build(self.status_code()).json(json!({ "error": error }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            RouletteError::DiscoveryFailure(_) => StatusCode::BAD_GATEWAY,
            RouletteError::NoCandidates => StatusCode::UNPROCESSABLE_ENTITY,
            RouletteError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            RouletteError::StaleQuota => StatusCode::CONFLICT,
            RouletteError::SpinInProgress => StatusCode::CONFLICT,
            RouletteError::PersistenceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            RouletteError::LocationUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RouletteError::AuthRequired => StatusCode::UNAUTHORIZED,
            RouletteError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RouletteError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RouletteError::QuotaExceeded { limit: 10 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(RouletteError::AuthRequired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            RouletteError::NoCandidates.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_quota_message_includes_limit() {
        let err = RouletteError::QuotaExceeded { limit: 10 };
        assert_eq!(err.to_string(), "You've used all 10 spins for today");
    }

    #[test]
    fn test_store_error_becomes_persistence_failure() {
        let err: RouletteError = StoreError::Backend("connection reset".to_string()).into();
        assert!(matches!(err, RouletteError::PersistenceFailure(_)));
    }
}
