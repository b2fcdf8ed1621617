use super::types::ErrorResponse;
use crate::persistence::PersistError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body was rejected before any state was touched.
    #[error("{0}")]
    BadRequest(String),

    /// The dataset could not be written to disk.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body used by the legacy `/save` endpoint.
    pub fn legacy_message(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            Self::Persist(_) => "Error saving file".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::BadRequest(message) => ErrorResponse {
                error: message.clone(),
                message: None,
            },
            Self::Persist(_) => ErrorResponse {
                error: "Error saving data".to_string(),
                message: None,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}
