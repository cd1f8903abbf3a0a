//! `data:` URL codec for images.
//!
//! The dashboard previews uploads as base64 data URLs and some clients post
//! them back inside JSON bodies, so both directions live here.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DataUrlError {
    #[error("not a data url")]
    NotDataUrl,
    #[error("data url is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { mime: mime.into(), bytes }
    }

    /// Parse `data:<mime>;base64,<payload>`.
    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        let rest = input.trim().strip_prefix("data:").ok_or(DataUrlError::NotDataUrl)?;
        let (meta, payload) = rest.split_once(',').ok_or(DataUrlError::NotDataUrl)?;
        let mut parts = meta.split(';');
        let mime = parts.next().unwrap_or_default();
        if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(DataUrlError::NotBase64);
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| DataUrlError::Decode(e.to_string()))?;
        let mime = if mime.is_empty() { "application/octet-stream" } else { mime };
        Ok(Self { mime: mime.to_ascii_lowercase(), bytes })
    }

    pub fn is_data_url(input: &str) -> bool {
        input.trim_start().starts_with("data:")
    }

    pub fn encode(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// File extension for the image mime types the catalog accepts.
pub fn image_extension(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/bmp" => Some("bmp"),
        _ => None,
    }
}

/// Best-effort mime guess from a file name, used when a multipart part has no content type.
pub fn mime_from_file_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
