//! Core library for the research registry.
//!
//! This crate provides the researcher directory, the project reconciler and
//! the SQLite store they share, independent of any transport layer
//! (HTTP, MCP, etc.).
//!
//! # Usage
//!
//! ```no_run
//! use registry_core::db::Database;
//! use registry_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let matches: Vec<Researcher> = db.search_researchers("田", None)?;
//! # Ok::<(), registry_core::RegistryError>(())
//! ```

pub mod db;
pub mod error;
pub mod models;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{RegistryError, Result};
