//! Form extraction shared by every write route.
//!
//! Accepts `multipart/form-data` and JSON bodies. Field names are compared
//! case-insensitively with `_` and `-` ignored, so `CategoryId`,
//! `categoryId` and `category_id` are one field.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, StatusCode};
use common::data_url::{image_extension, mime_from_file_name, DataUrl};
use serde_json::Value;
use service::catalog::domain::ImageUpload;
use thiserror::Error;
use uuid::Uuid;

const IMAGE_FIELDS: [&str; 3] = ["image", "images", "imagefile"];

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("invalid multipart body: {0}")]
    Multipart(String),
    #[error("invalid JSON body: {0}")]
    Json(String),
    #[error("request body too large")]
    BodyTooLarge,
    #[error("{field} is invalid: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("id is required")]
    MissingId,
}

pub fn field_key(name: &str) -> String {
    name.chars().filter(|c| *c != '_' && *c != '-').flat_map(char::to_lowercase).collect()
}

fn invalid(field: &str, reason: impl Into<String>) -> PayloadError {
    PayloadError::InvalidField { field: field.to_string(), reason: reason.into() }
}

#[derive(Debug, Default)]
pub struct Payload {
    fields: HashMap<String, Value>,
    images: Vec<ImageUpload>,
}

impl Payload {
    pub async fn extract(req: Request) -> Result<Self, PayloadError> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, &())
                .await
                .map_err(|e| PayloadError::Multipart(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let body = Bytes::from_request(req, &()).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                PayloadError::BodyTooLarge
            } else {
                PayloadError::Json(e.body_text())
            }
        })?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        if !(content_type.is_empty() || content_type.starts_with("application/json")) {
            return Err(PayloadError::UnsupportedContentType(content_type));
        }
        let value: Value = serde_json::from_slice(&body).map_err(|e| PayloadError::Json(e.to_string()))?;
        Self::from_json(value)
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, PayloadError> {
        let mut out = Self::default();
        loop {
            let field = multipart.next_field().await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    PayloadError::BodyTooLarge
                } else {
                    PayloadError::Multipart(e.body_text())
                }
            })?;
            let Some(field) = field else { break };
            let key = field_key(field.name().unwrap_or_default());
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);

            if file_name.is_some() || (IMAGE_FIELDS.contains(&key.as_str()) && content_type.is_some()) {
                let bytes = field.bytes().await.map_err(|e| PayloadError::Multipart(e.body_text()))?;
                // browsers send an empty part when no file was picked
                if bytes.is_empty() && file_name.as_deref().unwrap_or_default().is_empty() {
                    continue;
                }
                let content_type = content_type
                    .filter(|ct| ct != "application/octet-stream")
                    .or_else(|| file_name.as_deref().and_then(mime_from_file_name).map(str::to_owned));
                out.images.push(ImageUpload { file_name, content_type, bytes: bytes.to_vec() });
                continue;
            }

            let text = field.text().await.map_err(|e| PayloadError::Multipart(e.body_text()))?;
            if IMAGE_FIELDS.contains(&key.as_str()) {
                out.push_image_value(&Value::String(text))?;
            } else {
                out.fields.insert(key, Value::String(text));
            }
        }
        Ok(out)
    }

    pub fn from_json(value: Value) -> Result<Self, PayloadError> {
        let Value::Object(map) = value else {
            return Err(PayloadError::Json("expected a JSON object".into()));
        };
        let mut out = Self::default();
        for (name, value) in map {
            let key = field_key(&name);
            if IMAGE_FIELDS.contains(&key.as_str()) {
                match &value {
                    Value::Array(items) => {
                        for item in items {
                            out.push_image_value(item)?;
                        }
                    }
                    other => out.push_image_value(other)?,
                }
            } else {
                out.fields.insert(key, value);
            }
        }
        Ok(out)
    }

    /// Data URLs become uploads; plain paths refer to stored images and are ignored.
    fn push_image_value(&mut self, value: &Value) -> Result<(), PayloadError> {
        let Some(s) = value.as_str().filter(|s| DataUrl::is_data_url(s)) else {
            return Ok(());
        };
        let parsed = DataUrl::parse(s).map_err(|e| invalid("image", e.to_string()))?;
        let file_name = format!("image.{}", image_extension(&parsed.mime).unwrap_or("bin"));
        self.images.push(ImageUpload {
            file_name: Some(file_name),
            content_type: Some(parsed.mime),
            bytes: parsed.bytes,
        });
        Ok(())
    }

    fn raw(&self, field: &str) -> Option<&Value> {
        self.fields.get(&field_key(field)).filter(|v| !v.is_null())
    }

    /// Field as text; numbers and booleans are stringified.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.raw(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Non-blank trimmed text.
    fn filled(&self, field: &str) -> Option<String> {
        self.text(field).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }

    pub fn uuid(&self, field: &str) -> Result<Option<Uuid>, PayloadError> {
        self.filled(field)
            .map(|s| Uuid::parse_str(&s).map_err(|_| invalid(field, format!("'{s}' is not a valid id"))))
            .transpose()
    }

    pub fn f64(&self, field: &str) -> Result<Option<f64>, PayloadError> {
        if let Some(n) = self.raw(field).and_then(Value::as_f64) {
            return Ok(Some(n));
        }
        self.filled(field)
            .map(|s| s.parse::<f64>().map_err(|_| invalid(field, format!("'{s}' is not a number"))))
            .transpose()
    }

    pub fn i64(&self, field: &str) -> Result<Option<i64>, PayloadError> {
        if let Some(n) = self.raw(field).and_then(Value::as_i64) {
            return Ok(Some(n));
        }
        self.filled(field)
            .map(|s| s.parse::<i64>().map_err(|_| invalid(field, format!("'{s}' is not an integer"))))
            .transpose()
    }

    pub fn bool(&self, field: &str) -> Result<Option<bool>, PayloadError> {
        if let Some(b) = self.raw(field).and_then(Value::as_bool) {
            return Ok(Some(b));
        }
        self.filled(field)
            .map(|s| match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(true),
                "false" | "0" | "off" | "no" => Ok(false),
                _ => Err(invalid(field, format!("'{s}' is not a boolean"))),
            })
            .transpose()
    }

    /// Record id sent in the body as `id`, `Id` or `_id`.
    pub fn id(&self) -> Result<Uuid, PayloadError> {
        self.uuid("id")?.ok_or(PayloadError::MissingId)
    }

    pub fn images(&self) -> &[ImageUpload] {
        &self.images
    }

    pub fn take_images(&mut self) -> Vec<ImageUpload> {
        std::mem::take(&mut self.images)
    }

    pub fn take_image(&mut self) -> Option<ImageUpload> {
        if self.images.is_empty() {
            None
        } else {
            Some(self.images.remove(0))
        }
    }
}
