use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use donutwin_core::EngineError;
use donutwin_shared::{ApiError, ErrorBody};
use tracing::error;

/// `ApiError` rendered as a JSON response.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        if matches!(
            err,
            EngineError::DerivationExhaustion { .. } | EngineError::EntropyUnavailable(_)
        ) {
            error!(%err, "engine failure");
        }
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Fairness(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mismatch = match &self.0 {
            ApiError::Fairness(failure) => Some(failure.clone()),
            _ => None,
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
                mismatch,
            }),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
