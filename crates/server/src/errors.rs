use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::envelope::{ApiResponse, RestResponse};
use service::errors::{ServiceError, UploadError};
use thiserror::Error;
use tracing::{error, warn};

use crate::payload::PayloadError;

/// Which envelope a route family answers with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavor {
    /// `{ succeeded, data, message, errors }` under `/api/{Entity}/...`
    Legacy,
    /// `{ success, data, message, error }` under `/api/{entities}`
    Rest,
}

impl Flavor {
    /// Wrap a successful payload in this flavour's envelope.
    pub fn ok<T: serde::Serialize>(self, status: StatusCode, data: Option<T>, message: impl Into<String>) -> Response {
        let legacy = ApiResponse { succeeded: true, data, message: message.into(), errors: None };
        match self {
            Flavor::Legacy => (status, Json(legacy)).into_response(),
            Flavor::Rest => (status, Json(RestResponse::from(legacy))).into_response(),
        }
    }
}

/// Failure inside a handler before it is rendered for a flavour.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug)]
pub struct ApiError {
    pub flavor: Flavor,
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<String>,
}

impl ApiError {
    pub fn new(flavor: Flavor, status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self { flavor, status, errors: vec![message.clone()], message }
    }

    pub fn bad_request(flavor: Flavor, message: impl Into<String>) -> Self {
        Self::new(flavor, StatusCode::BAD_REQUEST, message)
    }

    pub fn from_service(flavor: Flavor, err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Model(models_err) => match models_err {
                service::ModelError::Validation(_) => StatusCode::BAD_REQUEST,
                service::ModelError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::Upload(UploadError::UnsupportedType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServiceError::Upload(UploadError::Empty) => StatusCode::BAD_REQUEST,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &err {
            ServiceError::NotFound(m) => m.clone(),
            ServiceError::Validation(m) | ServiceError::Conflict(m) => m.clone(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!(error = %err, "catalog request failed");
        } else {
            warn!(status = status.as_u16(), error = %err, "catalog request rejected");
        }
        Self::new(flavor, status, message)
    }

    pub fn from_payload(flavor: Flavor, err: PayloadError) -> Self {
        let status = match &err {
            PayloadError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            PayloadError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        warn!(status = status.as_u16(), error = %err, "request payload rejected");
        Self::new(flavor, status, err.to_string())
    }
}

impl From<(Flavor, RequestError)> for ApiError {
    fn from((flavor, err): (Flavor, RequestError)) -> Self {
        match err {
            RequestError::Payload(e) => Self::from_payload(flavor, e),
            RequestError::Service(e) => Self::from_service(flavor, e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse::failed(self.message, self.errors);
        match self.flavor {
            Flavor::Legacy => (self.status, Json(body)).into_response(),
            Flavor::Rest => (self.status, Json(RestResponse::from(body))).into_response(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_of(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_keeps_service_message() {
        let err = ApiError::from_service(Flavor::Legacy, ServiceError::not_found("Category"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let resp = err.into_response();
        assert_eq!(
            body_of(resp).await,
            json!({"succeeded": false, "data": null, "message": "Category not found", "errors": ["Category not found"]})
        );
    }

    #[tokio::test]
    async fn rest_flavor_uses_error_string() {
        let err = ApiError::from_service(Flavor::Rest, ServiceError::Conflict("Category has 2 sub-categories".into()));
        assert_eq!(err.status, StatusCode::CONFLICT);
        let v = body_of(err.into_response()).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "Category has 2 sub-categories");
    }

    #[test]
    fn upload_errors_map_to_http_statuses() {
        let big = ServiceError::Upload(UploadError::TooLarge { size: 10, limit: 5 });
        assert_eq!(ApiError::from_service(Flavor::Rest, big).status, StatusCode::PAYLOAD_TOO_LARGE);
        let kind = ServiceError::Upload(UploadError::UnsupportedType("text/plain".into()));
        assert_eq!(ApiError::from_service(Flavor::Rest, kind).status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let storage = ServiceError::Storage("disk full".into());
        assert_eq!(ApiError::from_service(Flavor::Legacy, storage).status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn ok_envelopes() {
        let legacy = body_of(Flavor::Legacy.ok(StatusCode::CREATED, Some(json!({"id": 1})), "created")).await;
        assert_eq!(legacy, json!({"succeeded": true, "data": {"id": 1}, "message": "created", "errors": null}));
        let rest = body_of(Flavor::Rest.ok::<Value>(StatusCode::OK, None, "")).await;
        assert_eq!(rest, json!({"success": true, "data": null, "error": null}));
    }
}
