use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 4000, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Where catalog records live.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON files under `data_dir`
    #[default]
    File,
    /// PostgreSQL through SeaORM, configured by `[database]`
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

fn default_data_dir() -> String { "data".into() }
fn default_uploads_dir() -> String { "Uploads".into() }
fn default_max_image_bytes() -> usize { 5 * 1024 * 1024 }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: default_data_dir(),
            uploads_dir: default_uploads_dir(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

/// Settings for the catalog HTTP client (endpoint probing, fallbacks, retries).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_client_connect_timeout")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_image_url_prefix")]
    pub image_url_prefix: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_hosts() -> Vec<String> {
    vec![
        "http://localhost:4000".into(),
        "http://127.0.0.1:4000".into(),
        "https://localhost:4000".into(),
    ]
}
fn default_request_timeout() -> u64 { 30_000 }
fn default_client_connect_timeout() -> u64 { 5_000 }
fn default_image_url_prefix() -> String { "http://localhost:4000/".into() }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            request_timeout_ms: default_request_timeout(),
            connect_timeout_ms: default_client_connect_timeout(),
            image_url_prefix: default_image_url_prefix(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { enabled: true, max_attempts: 3, backoff_base_ms: 100, backoff_max_ms: 2000 }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file when present, otherwise defaults overridden by
    /// `SERVER_HOST` / `SERVER_PORT` / `STORAGE_BACKEND` / `DATABASE_URL`.
    pub fn load_or_env() -> Result<Self> {
        match Self::load_and_validate() {
            Ok(cfg) => Ok(cfg),
            Err(e) if e.downcast_ref::<std::io::Error>().is_some() => {
                let mut cfg = Self::default();
                if let Ok(host) = std::env::var("SERVER_HOST") {
                    cfg.server.host = host;
                }
                if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                    cfg.server.port = port;
                }
                if let Ok(b) = std::env::var("STORAGE_BACKEND") {
                    if b.eq_ignore_ascii_case("postgres") {
                        cfg.storage.backend = StorageBackend::Postgres;
                    }
                }
                cfg.normalize_and_validate()?;
                Ok(cfg)
            }
            Err(e) => Err(e),
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        self.client.validate()?;
        if self.storage.backend == StorageBackend::Postgres {
            self.database.normalize_from_env();
            self.database.validate()?;
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() || self.uploads_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir and storage.uploads_dir must not be empty"));
        }
        if self.max_image_bytes == 0 {
            return Err(anyhow!("storage.max_image_bytes must be > 0"));
        }
        Ok(())
    }
}

impl ClientConfig {
    fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(anyhow!("client.hosts must list at least one base URL"));
        }
        if let Some(bad) = self
            .hosts
            .iter()
            .find(|h| !(h.starts_with("http://") || h.starts_with("https://")))
        {
            return Err(anyhow!("client host {bad} must start with http(s)"));
        }
        if self.retry.enabled && self.retry.max_attempts == 0 {
            return Err(anyhow!("client.retry.max_attempts must be >= 1 when retries are enabled"));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let mut cfg = load_from_str("").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.port, 4000);
        assert_eq!(cfg.storage.backend, StorageBackend::File);
        assert_eq!(cfg.storage.uploads_dir, "Uploads");
        assert_eq!(cfg.client.hosts.len(), 3);
        assert_eq!(cfg.client.retry.max_attempts, 3);
    }

    #[test]
    fn parses_sections() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 4100

            [storage]
            backend = "file"
            data_dir = "/tmp/catalog"
            max_image_bytes = 1024

            [client]
            hosts = ["http://10.0.0.2:4000"]
            image_url_prefix = "http://10.0.0.2:4000/"

            [client.retry]
            enabled = false
            max_attempts = 1
            backoff_base_ms = 10
            backoff_max_ms = 10
        "#;
        let mut cfg = load_from_str(toml).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 4100);
        assert_eq!(cfg.storage.max_image_bytes, 1024);
        assert_eq!(cfg.storage.uploads_dir, "Uploads");
        assert_eq!(cfg.client.hosts, vec!["http://10.0.0.2:4000".to_string()]);
        assert!(!cfg.client.retry.enabled);
    }

    #[test]
    fn partial_retry_table_keeps_other_defaults() {
        let toml = r#"
            [client.retry]
            enabled = false
        "#;
        let cfg = load_from_str(toml).unwrap();
        assert!(!cfg.client.retry.enabled);
        assert_eq!(cfg.client.retry.max_attempts, 3);
        assert_eq!(cfg.client.retry.backoff_max_ms, 2000);
        assert_eq!(cfg.client.hosts.len(), 3);
    }

    #[test]
    fn postgres_backend_requires_valid_url() {
        let toml = r#"
            [storage]
            backend = "postgres"

            [database]
            url = "mysql://nope"
        "#;
        let mut cfg = load_from_str(toml).unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_non_http_client_hosts() {
        let mut cfg = load_from_str("[client]\nhosts = [\"ftp://x\"]\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }
}
