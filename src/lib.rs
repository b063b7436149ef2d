//! # FixHive
//!
//! An MCP server that lets coding assistants search and contribute to a
//! shared knowledge base of error solutions.
//!
//! Three tools are exposed:
//!
//! - `fixhive_search_cases`: look up ranked solutions for a normalized error.
//! - `fixhive_report_resolution`: contribute how an error was fixed.
//! - `fixhive_vote`: up/down-vote a solution, or report it for moderation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌───────────┐   ┌────────────┐
//! │ MCP / HTTP   │──▶│  schema  │──▶│ mode gate │──▶│  redaction │
//! │ (mcp,server) │   │ validate │   │ (offline) │   │  (core)    │
//! └──────────────┘   └──────────┘   └───────────┘   └─────┬──────┘
//!                                                         ▼
//!                                  ┌──────────┐    ┌─────────────┐
//!                                  │ reshaped │◀───│ Knowledge   │
//!                                  │ payload  │    │ Client      │
//!                                  └──────────┘    └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration, process-wide cache |
//! | [`schema`] | Tool argument validation and defaulting |
//! | [`tools`] | Operation dispatch and the three handlers |
//! | [`remote`] | HTTP knowledge-base client |
//! | [`mcp`] | rmcp stdio bridge |
//! | [`server`] | JSON HTTP tool server |
//! | [`hook`] | Post-tool error detection hook |
//! | [`device`] | Stable per-machine device id |

pub mod config;
pub mod device;
pub mod error;
pub mod hook;
pub mod logging;
pub mod mcp;
pub mod remote;
pub mod schema;
pub mod server;
pub mod tools;
