//! JSON error responses.
//!
//! Every failure is rendered as `{"message": ..., "errors"?: [...]}`. Internal
//! detail is attached as `detail` only when running in development.

use std::fmt::{self, Display};

use salvo::{
    Response,
    http::StatusCode,
    oapi::{self, Components, EndpointOutRegister, Operation, ToSchema},
    writing::{Json, Scribe},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::observability::settings;

/// A problem with one field of a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct FieldError {
    /// The offending field, in request casing
    pub field: String,

    /// What is wrong with it
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    /// Human readable summary
    pub message: String,

    /// Field level validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,

    /// Internal detail, development only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// An HTTP failure with a status code and a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
    errors: Vec<FieldError>,
    detail: Option<String>,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
            detail: None,
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 400 carrying one entry per invalid field.
    pub(crate) fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            errors,
            ..Self::bad_request("Validation failed")
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 500 with a generic message. `source` is logged and only echoed back in
    /// development.
    pub(crate) fn internal(context: &str, source: &dyn Display) -> Self {
        error!("{context}: {source}");

        Self {
            detail: settings::expose_error_detail().then(|| format!("{context}: {source}")),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }

    #[must_use]
    pub(crate) fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    fn into_body(self) -> ErrorBody {
        ErrorBody {
            message: self.message,
            errors: self.errors,
            detail: self.detail,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl Scribe for ApiError {
    fn render(self, res: &mut Response) {
        res.status_code(self.status);
        res.render(Json(self.into_body()));
    }
}

impl EndpointOutRegister for ApiError {
    fn register(components: &mut Components, operation: &mut Operation) {
        for (status, description) in [
            (StatusCode::BAD_REQUEST, "Invalid request or business rule violation"),
            (StatusCode::UNAUTHORIZED, "Missing or invalid bearer token"),
            (StatusCode::FORBIDDEN, "Not allowed"),
            (StatusCode::NOT_FOUND, "Resource not found"),
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        ] {
            operation.responses.insert(
                status.as_str(),
                oapi::Response::new(description)
                    .add_content("application/json", ErrorBody::to_schema(components)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use super::*;

    #[handler]
    async fn invalid() -> Result<&'static str, ApiError> {
        Err(ApiError::validation(vec![FieldError::new(
            "quantity",
            "must be between 1 and 10",
        )]))
    }

    #[handler]
    async fn missing() -> Result<&'static str, ApiError> {
        Err(ApiError::not_found("Book not found"))
    }

    fn service() -> Service {
        Service::new(
            Router::new()
                .push(Router::with_path("invalid").get(invalid))
                .push(Router::with_path("missing").get(missing)),
        )
    }

    #[tokio::test]
    async fn validation_errors_list_each_field() -> TestResult {
        let mut res = TestClient::get("http://example.com/invalid")
            .send(&service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({
                "message": "Validation failed",
                "errors": [{ "field": "quantity", "message": "must be between 1 and 10" }],
            })
        );

        Ok(())
    }

    #[tokio::test]
    async fn plain_errors_omit_the_errors_list() -> TestResult {
        let mut res = TestClient::get("http://example.com/missing")
            .send(&service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({ "message": "Book not found" }));

        Ok(())
    }

    #[test]
    fn internal_errors_hide_detail_outside_development() {
        let error = ApiError::internal("failed to load book", &"connection reset");

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message(), "Internal server error");
        assert_eq!(error.into_body().detail, None);
    }
}
