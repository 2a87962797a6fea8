//! Maps DomainError onto HTTP status codes and `{ "error": message }` bodies.

use crate::domain::DomainError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::QuotaExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            DomainError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Upstream(_) | DomainError::MalformedResponse(_) | DomainError::Repo(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Storage details stay in the log.
    pub fn message(&self) -> String {
        match &self.0 {
            DomainError::Repo(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self.0, "request failed");
        } else {
            warn!(status = %status, error = %self.0, "request rejected");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_taxonomy() {
        let cases = [
            (DomainError::InvalidInput("x".into()), 400),
            (DomainError::Unauthorized("x".into()), 401),
            (DomainError::QuotaExceeded { limit: 3 }, 402),
            (DomainError::MalformedResponse("x".into()), 500),
            (DomainError::Upstream("x".into()), 500),
            (DomainError::Repo("x".into()), 500),
            (DomainError::UpstreamUnavailable("x".into()), 503),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError(err).status().as_u16(), code);
        }
    }

    #[test]
    fn repo_details_are_hidden() {
        let e = ApiError(DomainError::Repo("disk I/O error at /srv/data".into()));
        assert_eq!(e.message(), "Internal server error");
        let q = ApiError(DomainError::QuotaExceeded { limit: 3 });
        assert_eq!(
            q.message(),
            "Free AI uses exhausted. Upgrade to Premium for unlimited scheduling."
        );
    }
}
