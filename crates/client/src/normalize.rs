//! Response normalization.
//!
//! Backends answer with `{succeeded, data, message, errors}`,
//! `{success, data, message, error}`, bare arrays or bare objects, and use
//! `_id`, `Id`, PascalCase or snake_case keys. Everything is mapped onto
//! [`Envelope`] with camelCase keys and a plain `id`.

use serde_json::{Map, Value};
use thiserror::Error;

/// How much of an unexpected HTML page is kept for diagnostics.
pub const HTML_SNIPPET_LEN: usize = 200;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("expected JSON but got an HTML page (status {status}): {snippet}")]
    HtmlPage { status: u16, snippet: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub status: u16,
    pub ok: bool,
    pub data: Option<Value>,
    pub message: Option<String>,
    pub errors: Vec<String>,
}

impl Envelope {
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best human-readable description of the outcome.
    pub fn summary(&self) -> String {
        if !self.errors.is_empty() {
            return self.errors.join("; ");
        }
        match &self.message {
            Some(m) if !m.is_empty() => m.clone(),
            _ => format!("HTTP {}", self.status),
        }
    }
}

fn is_2xx(status: u16) -> bool {
    (200..300).contains(&status)
}

fn looks_like_html(content_type: Option<&str>, text: &str) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html")) {
        return true;
    }
    let head: String = text.trim_start().chars().take(16).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn get_ci<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)
}

fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(o) => get_ci(o, "message").and_then(text_of),
        _ => None,
    }
}

/// `errors: [..]`, `errors: {field: [..]}` or `error: ".."`.
fn collect_errors(map: &Map<String, Value>) -> Vec<String> {
    let mut out = Vec::new();
    match get_ci(map, "errors") {
        Some(Value::Array(items)) => out.extend(items.iter().filter_map(text_of)),
        Some(Value::Object(fields)) => {
            for (field, v) in fields {
                match v {
                    Value::Array(items) => {
                        out.extend(items.iter().filter_map(text_of).map(|m| format!("{field}: {m}")))
                    }
                    other => out.extend(text_of(other).map(|m| format!("{field}: {m}"))),
                }
            }
        }
        Some(other) => out.extend(text_of(other)),
        None => {}
    }
    if let Some(e) = get_ci(map, "error").and_then(text_of) {
        out.push(e);
    }
    out
}

/// Map a raw HTTP response onto an [`Envelope`].
pub fn normalize(status: u16, content_type: Option<&str>, body: &[u8]) -> Result<Envelope, NormalizeError> {
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return Ok(Envelope { status, ok: is_2xx(status), data: None, message: None, errors: vec![] });
    }
    if looks_like_html(content_type, &text) {
        let snippet = text.chars().take(HTML_SNIPPET_LEN).collect();
        return Err(NormalizeError::HtmlPage { status, snippet });
    }

    let value: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(_) => {
            let trimmed = text.trim().to_string();
            return Ok(Envelope {
                status,
                ok: is_2xx(status),
                message: Some(trimmed.clone()),
                data: Some(Value::String(trimmed)),
                errors: vec![],
            });
        }
    };

    let Value::Object(map) = value else {
        return Ok(Envelope { status, ok: is_2xx(status), data: Some(normalize_keys(value)), message: None, errors: vec![] });
    };

    let flag = get_ci(&map, "succeeded").or_else(|| get_ci(&map, "success")).and_then(Value::as_bool);
    let message = get_ci(&map, "message").and_then(text_of);
    let errors = collect_errors(&map);
    match flag {
        Some(ok) => {
            let data = get_ci(&map, "data").filter(|v| !v.is_null()).cloned().map(normalize_keys);
            Ok(Envelope { status, ok, data, message, errors })
        }
        None => Ok(Envelope {
            status,
            ok: is_2xx(status),
            data: Some(normalize_keys(Value::Object(map))),
            message,
            errors,
        }),
    }
}

/// `_id`/`Id`/`ID` become `id`; PascalCase, snake_case and kebab-case become camelCase.
pub fn normalize_key(key: &str) -> String {
    if key.eq_ignore_ascii_case("id") || key.eq_ignore_ascii_case("_id") {
        return "id".to_string();
    }
    let trimmed = key.trim_start_matches('_');
    if trimmed.is_empty() {
        return key.to_string();
    }

    let mut out = String::with_capacity(trimmed.len());
    for (i, part) in trimmed.split(['_', '-']).filter(|p| !p.is_empty()).enumerate() {
        let part = if part.chars().all(|c| !c.is_ascii_lowercase()) {
            part.to_ascii_lowercase()
        } else {
            part.to_string()
        };
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    if out.len() > 2 && out.ends_with("ID") {
        out.truncate(out.len() - 2);
        out.push_str("Id");
    }
    out
}

/// Recursively rename object keys with [`normalize_key`].
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let key = normalize_key(&k);
                // an explicit `id` wins over `_id`
                if key == "id" && out.contains_key("id") && k != "id" {
                    continue;
                }
                out.insert(key, normalize_keys(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Absolute URL for an image path stored relative to the backend root.
pub fn full_image_url(prefix: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:") {
        return Some(path.to_string());
    }
    Some(format!("{}/{}", prefix.trim_end_matches('/'), path.trim_start_matches('/')))
}
