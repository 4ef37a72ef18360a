#![deny(missing_docs)]

//! Core library for the language MCP server: document analysis jobs and the NLP tools built on
//! them.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Long-running analysis job orchestration.
pub mod jobs;
/// Synchronous language analysis client and option sets.
pub mod language;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Job metrics helpers.
pub mod metrics;
/// Tool service shared by every surface.
pub mod service;
/// Text translation client.
pub mod translator;
