//! Request and response payloads for the LISA REST API.
//!
//! The wire format is camelCase JSON; field names on the Rust side follow
//! the usual snake_case convention with serde renames.

pub mod embeddings;
pub mod generate;
mod http;
mod models;

pub use http::*;
pub use models::*;
