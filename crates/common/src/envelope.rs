//! Response envelopes spoken by catalog backends.
//!
//! Two shapes exist in the wild:
//! - legacy: `{ succeeded, data, message, errors: [..] | null }`
//! - REST:   `{ success, data, message, error: ".." | null }`

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub succeeded: bool,
    pub data: Option<T>,
    pub message: String,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self { succeeded: true, data: Some(data), message: message.into(), errors: None }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self { succeeded: true, data: None, message: message.into(), errors: None }
    }

    pub fn failed(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self { succeeded: false, data: None, message: message.into(), errors: Some(errors) }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RestResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: Option<String>,
}

impl<T> From<ApiResponse<T>> for RestResponse<T> {
    fn from(r: ApiResponse<T>) -> Self {
        let error = r.errors.and_then(|errs| {
            if errs.is_empty() { None } else { Some(errs.join("; ")) }
        });
        Self {
            success: r.succeeded,
            data: r.data,
            message: if r.message.is_empty() { None } else { Some(r.message) },
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_failure_serializes_null_data() {
        let r: ApiResponse<()> = ApiResponse::failed("Category not found", vec!["missing".into()]);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(
            v,
            json!({"succeeded": false, "data": null, "message": "Category not found", "errors": ["missing"]})
        );
    }

    #[test]
    fn rest_conversion_joins_errors() {
        let r: ApiResponse<u32> = ApiResponse::failed("bad", vec!["a".into(), "b".into()]);
        let rest = RestResponse::from(r);
        assert!(!rest.success);
        assert_eq!(rest.error.as_deref(), Some("a; b"));
        assert_eq!(rest.message.as_deref(), Some("bad"));
    }

    #[test]
    fn rest_conversion_keeps_data() {
        let rest = RestResponse::from(ApiResponse::ok(7u32, "ok"));
        assert!(rest.success);
        assert_eq!(rest.data, Some(7));
        assert_eq!(rest.error, None);
    }
}
