use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::ServiceError;
use thiserror::Error;
use tracing::error;

/// JSON error body `{"error": title, "detail": message}` with a status code.
/// Auth failures also carry a numeric `code`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: String,
    pub detail: Option<String>,
    pub code: Option<u16>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, detail: Option<String>) -> Self {
        Self { status, error: error.into(), detail, code: None }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(detail.into()))
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.into()))
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden", Some(detail.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.error, detail = ?self.detail, "request failed");
        }
        let mut body = serde_json::json!({ "error": self.error, "detail": self.detail });
        if let Some(code) = self.code {
            body["code"] = code.into();
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let (status, title) = match &e {
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            ServiceError::InvalidState(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid State"),
            ServiceError::Upstream(_) => (StatusCode::BAD_GATEWAY, "Upstream Error"),
            ServiceError::Model(ModelError::Validation(_)) => (StatusCode::BAD_REQUEST, "Validation Error"),
            ServiceError::Db(_) | ServiceError::Model(ModelError::Db(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error")
            }
        };
        Self::new(status, title, Some(e.to_string()))
    }
}

impl From<ModelError> for JsonApiError {
    fn from(e: ModelError) -> Self {
        ServiceError::from(e).into()
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let (status, title) = match &e {
            AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
            AuthError::Conflict => (StatusCode::CONFLICT, "Conflict"),
            AuthError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            AuthError::Unauthorized | AuthError::TokenError(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::HashError(_) | AuthError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error"),
        };
        Self::new(status, title, Some(e.to_string())).with_code(e.code())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::InvalidState("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Upstream("x".into()), StatusCode::BAD_GATEWAY),
            (ServiceError::Db("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Model(ModelError::Validation("x".into())), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn token_errors_are_unauthorized() {
        let e = JsonApiError::from(AuthError::TokenError("expired".into()));
        assert_eq!(e.status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::Conflict).status, StatusCode::CONFLICT);
    }

    #[test]
    fn auth_errors_carry_their_code() {
        assert_eq!(JsonApiError::from(AuthError::Unauthorized).code, Some(1004));
        assert_eq!(JsonApiError::from(AuthError::Repository("down".into())).code, Some(1200));
        assert_eq!(JsonApiError::from(ServiceError::Conflict("x".into())).code, None);
    }
}
