//! Mapping of pipeline errors onto HTTP responses

use crate::error::{PredictionError, RenderError, ValidationError};
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

/// Error returned by a request handler
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    /// The request body could not be read as a form
    Form(FormRejection),
    Prediction(PredictionError),
    Render(RenderError),
    /// A blocking task panicked or was cancelled
    Internal(String),
}

/// JSON body sent for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ApiError {
    /// Stable identifier of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) | ApiError::Form(_) => "validation_error",
            ApiError::Prediction(e) if e.is_contract_violation() => "invalid_model_output",
            ApiError::Prediction(_) => "prediction_error",
            ApiError::Render(_) => "render_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Form(rejection) => rejection.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client
    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Form(rejection) => rejection.body_text(),
            ApiError::Prediction(PredictionError::Inference(_)) => {
                "the model failed to produce a prediction".to_string()
            }
            ApiError::Prediction(e) => e.to_string(),
            ApiError::Render(_) => "the report could not be generated".to_string(),
            ApiError::Internal(_) => "internal server error".to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.public_message(),
            field: match self {
                ApiError::Validation(e) => Some(e.field),
                _ => None,
            },
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Form(rejection)
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        ApiError::Prediction(e)
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        ApiError::Render(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(e) => warn!(field = e.field, error = %e, "Rejected form submission"),
            ApiError::Form(rejection) => warn!(error = %rejection, "Unreadable form submission"),
            ApiError::Prediction(e) => error!(kind = self.kind(), error = %e, "Prediction failed"),
            ApiError::Render(e) => error!(error = %e, "Report rendering failed"),
            ApiError::Internal(e) => error!(error = %e, "Request task failed"),
        }

        (self.status(), Json(self.body())).into_response()
    }
}
