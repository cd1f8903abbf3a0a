use std::fmt;

use thiserror::Error;

use crate::normalize::NormalizeError;

/// Logical catalog operation, used in errors, logs and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    ListByCategory,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::ListByCategory => "list_by_category",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed strategy inside a dispatch.
#[derive(Debug)]
pub struct Attempt {
    pub strategy: &'static str,
    pub method: String,
    pub url: String,
    pub error: ClientError,
}

/// One failed endpoint probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {url} returned {status}: {message}")]
    Status { method: String, url: String, status: u16, message: String },
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("no reachable endpoint ({} candidates tried)", .probes.len())]
    NoReachableEndpoint { probes: Vec<ProbeFailure> },
    #[error("{operation} failed after {} strategies: {}", .attempts.len(), primary_message(.attempts))]
    Exhausted { operation: Operation, attempts: Vec<Attempt> },
    #[error("rejected by backend ({status}): {message}")]
    Rejected { status: u16, message: String, errors: Vec<String> },
    #[error("cannot decode {what}: {reason}")]
    Decode { what: String, reason: String },
}

fn primary_message(attempts: &[Attempt]) -> String {
    attempts.first().map(|a| a.error.to_string()).unwrap_or_else(|| "no strategy ran".into())
}

impl ClientError {
    pub fn decode(what: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Decode { what: what.into(), reason: reason.to_string() }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } | ClientError::Rejected { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Normalize(NormalizeError::HtmlPage { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Connection refused or timed out; nothing reached the backend's handlers.
    pub fn is_transport(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout(),
            ClientError::NoReachableEndpoint { .. } => true,
            ClientError::Exhausted { attempts, .. } => {
                !attempts.is_empty() && attempts.iter().all(|a| a.error.is_transport())
            }
            _ => false,
        }
    }

    /// Transient failures worth repeating with the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout(),
            ClientError::Status { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Business-rule rejections that no other encoding can fix.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status(), Some(409) | Some(422))
    }

    /// The failure reported for an exhausted plan: its first attempt.
    pub fn primary(&self) -> &ClientError {
        match self {
            ClientError::Exhausted { attempts, .. } => attempts.first().map(|a| a.error.primary()).unwrap_or(self),
            other => other,
        }
    }
}

impl crate::retry::Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        ClientError::is_retryable(self)
    }
}
