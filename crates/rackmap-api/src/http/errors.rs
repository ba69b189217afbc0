//! RFC9457-style API error wrapper.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use rackmap_data::DataError;
use rackmap_model::ModelError;

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_CONFLICT, PROBLEM_INTERNAL, PROBLEM_NOT_FOUND,
    PROBLEM_SERVICE_UNAVAILABLE, PROBLEM_VALIDATION,
};
use crate::models::{ProblemDetails, ProblemInvalidParam};

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_invalid_params(mut self, params: Vec<ProblemInvalidParam>) -> Self {
        self.invalid_params = Some(params);
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }

    pub(crate) fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, PROBLEM_CONFLICT, "conflict").with_detail(detail)
    }

    pub(crate) fn validation_failed(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            PROBLEM_VALIDATION,
            "validation failed",
        )
        .with_detail(detail)
    }

    pub(crate) fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            PROBLEM_SERVICE_UNAVAILABLE,
            "service unavailable",
        )
        .with_detail(detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Map a model validation failure to a 422 with a field pointer.
pub(crate) fn map_validation_error(error: &ModelError) -> ApiError {
    ApiError::validation_failed(error.to_string()).with_invalid_params(vec![ProblemInvalidParam {
        pointer: format!("/{}", error.field()),
        message: error.to_string(),
    }])
}

/// Map a facade failure, surfacing unique violations as conflicts.
pub(crate) fn map_data_error(error: &anyhow::Error, fallback: &str) -> ApiError {
    if let Some(data_error) = error.downcast_ref::<DataError>()
        && data_error.is_unique_violation()
    {
        return ApiError::conflict("a record with this name already exists");
    }
    tracing::error!(error = %error, "{fallback}");
    ApiError::internal(fallback)
}
