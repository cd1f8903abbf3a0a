//! Service layer providing the catalog's business operations on top of models.
//! - Separates business logic from data access (JSON files or PostgreSQL).
//! - Reuses validation and entity definitions in `models` crate.
//! - Owns image upload storage.

pub mod errors;
pub mod pagination;
pub mod storage;
pub mod catalog;
pub mod images;
pub mod runtime;

pub use catalog::CatalogService;
pub use models::errors::ModelError;
