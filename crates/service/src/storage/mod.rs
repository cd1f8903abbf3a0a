//! Storage abstractions for service layer
//!
//! File-backed stores used by the default `file` backend.

pub mod json_map_store;
