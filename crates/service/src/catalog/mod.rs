//! Catalog module: domain records, repository abstraction with file and
//! SeaORM backends, and the business service that ties them to image storage.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::CatalogService;
