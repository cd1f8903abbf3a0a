//! Endpoint resolution: probe candidate base URLs once, remember the winner.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ProbeFailure};
use crate::normalize::{normalize, NormalizeError};
use crate::observability::ENDPOINT_PROBES_TOTAL;

/// Route layout spoken by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiShape {
    /// `/api/Category/GetAll`, `/api/Category/Create`, ...
    Legacy,
    /// `/api/categories`, `/api/categories/{id}`
    Rest,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub base: String,
    pub shape: ApiShape,
}

impl Endpoint {
    pub fn new(base: impl Into<String>, shape: ApiShape) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base, shape }
    }

    pub fn legacy(base: impl Into<String>) -> Self {
        Self::new(base, ApiShape::Legacy)
    }

    pub fn rest(base: impl Into<String>) -> Self {
        Self::new(base, ApiShape::Rest)
    }

    /// `{base}/{path}`; an empty path yields the base itself.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{}", self.base, path)
        }
    }

    pub fn probe_url(&self) -> String {
        match self.shape {
            ApiShape::Legacy => self.url("GetAll"),
            ApiShape::Rest => self.base.clone(),
        }
    }
}

/// Candidate endpoints for one resource: every host with every legacy path, then the REST path.
pub fn candidates_for(hosts: &[String], legacy_paths: &[&str], rest_path: &str) -> Vec<Endpoint> {
    let mut out = Vec::with_capacity(hosts.len() * (legacy_paths.len() + 1));
    for host in hosts {
        let host = host.trim_end_matches('/');
        for path in legacy_paths {
            out.push(Endpoint::legacy(format!("{host}/api/{path}")));
        }
        out.push(Endpoint::rest(format!("{host}/api/{rest_path}")));
    }
    out
}

/// Probes candidates in order and caches the first that answers 2xx with a
/// non-HTML body. Clones share the cache.
#[derive(Clone)]
pub struct EndpointResolver {
    http: reqwest::Client,
    candidates: Arc<Vec<Endpoint>>,
    cache: Arc<ArcSwapOption<Endpoint>>,
}

impl EndpointResolver {
    pub fn new(http: reqwest::Client, candidates: Vec<Endpoint>) -> Self {
        Self { http, candidates: Arc::new(candidates), cache: Arc::new(ArcSwapOption::empty()) }
    }

    pub fn candidates(&self) -> &[Endpoint] {
        &self.candidates
    }

    /// Cached endpoint, without probing.
    pub fn current(&self) -> Option<Endpoint> {
        self.cache.load_full().map(|e| (*e).clone())
    }

    pub fn invalidate(&self) {
        if self.cache.swap(None).is_some() {
            debug!("endpoint cache invalidated");
        }
    }

    pub async fn resolve(&self) -> Result<Endpoint, ClientError> {
        if let Some(ep) = self.current() {
            return Ok(ep);
        }
        self.probe_all().await
    }

    pub async fn refresh(&self) -> Result<Endpoint, ClientError> {
        self.invalidate();
        self.probe_all().await
    }

    async fn probe_all(&self) -> Result<Endpoint, ClientError> {
        let mut probes = Vec::new();
        for candidate in self.candidates.iter() {
            match self.probe(candidate).await {
                Ok(()) => {
                    ENDPOINT_PROBES_TOTAL.with_label_values(&["ok"]).inc();
                    info!(base = %candidate.base, shape = ?candidate.shape, "endpoint resolved");
                    self.cache.store(Some(Arc::new(candidate.clone())));
                    return Ok(candidate.clone());
                }
                Err(reason) => {
                    ENDPOINT_PROBES_TOTAL.with_label_values(&["failed"]).inc();
                    debug!(url = %candidate.probe_url(), %reason, "endpoint probe failed");
                    probes.push(ProbeFailure { url: candidate.probe_url(), reason });
                }
            }
        }
        warn!(candidates = probes.len(), "no catalog endpoint reachable");
        Err(ClientError::NoReachableEndpoint { probes })
    }

    async fn probe(&self, candidate: &Endpoint) -> Result<(), String> {
        let url = candidate.probe_url();
        let resp = self.http.get(&url).send().await.map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(format!("HTTP {status}"));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp.bytes().await.map_err(|e| e.to_string())?;
        match normalize(status, content_type.as_deref(), &body) {
            Ok(env) if env.ok => Ok(()),
            Ok(env) => Err(format!("backend reported failure: {}", env.summary())),
            Err(NormalizeError::HtmlPage { .. }) => Err("HTML page instead of API response".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_keep_host_order_then_path_order() {
        let hosts = vec!["http://localhost:4000/".to_string(), "http://127.0.0.1:4000".to_string()];
        let c = candidates_for(&hosts, &["Category", "category"], "categories");
        let urls: Vec<_> = c.iter().map(|e| e.probe_url()).collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:4000/api/Category/GetAll",
                "http://localhost:4000/api/category/GetAll",
                "http://localhost:4000/api/categories",
                "http://127.0.0.1:4000/api/Category/GetAll",
                "http://127.0.0.1:4000/api/category/GetAll",
                "http://127.0.0.1:4000/api/categories",
            ]
        );
        assert_eq!(c[2].shape, ApiShape::Rest);
    }

    #[test]
    fn endpoint_urls() {
        let e = Endpoint::legacy("http://h/api/Category/");
        assert_eq!(e.url("Get/5"), "http://h/api/Category/Get/5");
        assert_eq!(e.url(""), "http://h/api/Category");
    }

    #[test]
    fn cache_is_shared_between_clones() {
        let r = EndpointResolver::new(reqwest::Client::new(), vec![]);
        let clone = r.clone();
        r.cache.store(Some(Arc::new(Endpoint::rest("http://h/api/categories"))));
        assert_eq!(clone.current().map(|e| e.shape), Some(ApiShape::Rest));
        clone.invalidate();
        assert!(r.current().is_none());
    }
}
