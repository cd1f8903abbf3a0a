//! HTTP surface of the catalog: legacy `/api/{Entity}/{Action}` routes and
//! REST `/api/{entities}` routes over one `CatalogService`.

pub mod errors;
pub mod observability;
pub mod openapi;
pub mod payload;
pub mod routes;
pub mod startup;

pub use startup::{build_app, run, shutdown_signal};
