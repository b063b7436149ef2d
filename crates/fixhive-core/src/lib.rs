//! # FixHive Core
//!
//! Transport-free building blocks for FixHive: case models, signature
//! hashing, redaction filters, and the [`client::KnowledgeClient`] trait.
//!
//! This crate contains no tokio runtime, HTTP client, or filesystem I/O.
//! The `fixhive` application crate wires these pieces to configuration,
//! the remote store, and the MCP transports.

pub mod client;
pub mod models;
pub mod redact;
pub mod signature;
