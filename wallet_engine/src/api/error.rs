use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::EngineError;

pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.0 {
            EngineError::InsufficientFunds(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::InvalidCode => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::Expired => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::NonPositiveAmount => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::SelfTransfer => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::NoSuchUser(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::AlreadyExists(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::DuplicatePhone(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::InvalidData(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::NotOwner(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            EngineError::NotFound => (StatusCode::NOT_FOUND, self.0.to_string()),
            EngineError::Unauthorized => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            EngineError::Forbidden => (StatusCode::FORBIDDEN, self.0.to_string()),
            EngineError::Internal(ref e) => {
                tracing::error!("internal engine error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": error_message,
        }));

        (status, body).into_response()
    }
}
