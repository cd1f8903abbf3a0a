//! HTTP client for catalog backends.
//!
//! Backends differ in path casing, envelope shape and accepted encodings, so
//! every call goes through endpoint discovery ([`resolver`]), an ordered list
//! of request strategies ([`dispatch`]) and response normalization
//! ([`normalize`]) before typed records come out of [`resource`].

pub mod connectivity;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod normalize;
pub mod observability;
pub mod resolver;
pub mod resource;
pub mod retry;

use std::time::Duration;

use configs::ClientConfig;

pub use connectivity::{test_connectivity, ConnectivityReport};
pub use error::{ClientError, Operation};
pub use model::{Category, Product, RecordId, Saved, SubCategory};
pub use resource::{Categories, FormPayload, ImageFile, ListQuery, Products, ResourceClient, SubCategories};
pub use retry::RetryPolicy;

/// Clients for the three catalog resources, sharing one connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    pub categories: ResourceClient<Categories>,
    pub sub_categories: ResourceClient<SubCategories>,
    pub products: ResourceClient<Products>,
    http: reqwest::Client,
    hosts: Vec<String>,
}

impl CatalogClient {
    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ClientError> {
        let http = http_client(cfg)?;
        let retry = RetryPolicy::from_config(&cfg.retry);
        let prefix = cfg.image_url_prefix.as_str();
        Ok(Self {
            categories: ResourceClient::new(http.clone(), &cfg.hosts, retry.clone(), prefix),
            sub_categories: ResourceClient::new(http.clone(), &cfg.hosts, retry.clone(), prefix),
            products: ResourceClient::new(http.clone(), &cfg.hosts, retry, prefix),
            hosts: cfg.hosts.clone(),
            http,
        })
    }

    pub async fn test_connectivity(&self) -> ConnectivityReport {
        test_connectivity(&self.http, &self.hosts).await
    }
}

pub fn http_client(cfg: &ClientConfig) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_millis(cfg.request_timeout_ms))
        .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
        .build()?)
}
