//! "Is the backend up at all?" check used by the dashboard's test button.

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::normalize::normalize;

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectivityAttempt {
    pub url: String,
    pub status: Option<u16>,
    pub ok: bool,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectivityReport {
    /// First URL that answered successfully.
    pub reachable: Option<String>,
    pub attempts: Vec<ConnectivityAttempt>,
}

impl ConnectivityReport {
    pub fn is_reachable(&self) -> bool {
        self.reachable.is_some()
    }
}

/// Try `GET {host}/` then `GET {host}/api/test` for each host; stop at the first success.
pub async fn test_connectivity(http: &reqwest::Client, hosts: &[String]) -> ConnectivityReport {
    let mut attempts = Vec::new();
    for host in hosts {
        let host = host.trim_end_matches('/');
        for url in [format!("{host}/"), format!("{host}/api/test")] {
            let attempt = check(http, &url).await;
            debug!(url = %attempt.url, ok = attempt.ok, detail = %attempt.detail, "connectivity check");
            let ok = attempt.ok;
            attempts.push(attempt);
            if ok {
                info!(%url, "backend reachable");
                return ConnectivityReport { reachable: Some(url), attempts };
            }
        }
    }
    ConnectivityReport { reachable: None, attempts }
}

async fn check(http: &reqwest::Client, url: &str) -> ConnectivityAttempt {
    let resp = match http.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            return ConnectivityAttempt { url: url.to_string(), status: None, ok: false, detail: e.to_string() }
        }
    };
    let status = resp.status().as_u16();
    let content_type = resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_owned);
    let body = match resp.bytes().await {
        Ok(b) => b,
        Err(e) => {
            return ConnectivityAttempt { url: url.to_string(), status: Some(status), ok: false, detail: e.to_string() }
        }
    };
    let (ok, detail) = match normalize(status, content_type.as_deref(), &body) {
        Ok(env) if env.is_success_status() => (true, env.message.unwrap_or_else(|| format!("HTTP {status}"))),
        Ok(env) => (false, env.summary()),
        Err(e) => (false, e.to_string()),
    };
    ConnectivityAttempt { url: url.to_string(), status: Some(status), ok, detail }
}
