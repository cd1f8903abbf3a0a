//! Shared building blocks for the catalog workspace: wire envelopes,
//! the data-URL image codec, logging and environment helpers.

pub mod types;
pub mod utils;
pub mod env;
pub mod envelope;
pub mod data_url;
