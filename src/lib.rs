//! Research registry server: HTTP and MCP surfaces over [`registry_core`].

pub mod api;
pub mod config;
pub mod ingest;
pub mod mcp;

pub use registry_core::{db, models, RegistryError};
