//! Mapping from core errors and extractor rejections to HTTP responses.

use api_shared::{AuthError, ErrorBody};
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rentdesk_core::RentalError;

/// Every failure a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] RentalError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Unauthorised(#[from] AuthError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Core(RentalError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::with_errors("The given data was invalid.", errors.into_map()),
            ),
            ApiError::Core(RentalError::InvalidInput(message)) | ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(message))
            }
            ApiError::Core(err @ (RentalError::Id(_) | RentalError::Text(_))) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(err.to_string()))
            }
            ApiError::Core(err @ RentalError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, ErrorBody::new(err.to_string()))
            }
            ApiError::Core(RentalError::Conflict(message)) => {
                (StatusCode::CONFLICT, ErrorBody::new(message))
            }
            ApiError::Unauthorised(err) => {
                tracing::warn!("Rejected request: {}", err);
                (StatusCode::UNAUTHORIZED, ErrorBody::new("Unauthenticated."))
            }
            err => {
                tracing::error!("Request failed: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentdesk_core::ValidationErrors;

    #[test]
    fn statuses_follow_error_kind() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "The name field is required.");
        let cases = [
            (ApiError::from(RentalError::Validation(errors)), StatusCode::BAD_REQUEST),
            (
                RentalError::not_found("tenant", "abc").into(),
                StatusCode::NOT_FOUND,
            ),
            (RentalError::conflict("occupied").into(), StatusCode::CONFLICT),
            (AuthError::Missing.into(), StatusCode::UNAUTHORIZED),
            (RentalError::StorePoisoned.into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
