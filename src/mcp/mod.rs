//! Model Context Protocol (MCP) integration for the language tools.
//!
//! This module wires the tool service into an MCP server so editors and agent hosts can call the
//! language tools over stdio. The surface area consists of:
//!
//! - Tools: one per [`ToolName`] variant, selectable at startup.
//! - Resources: `mcp://settings`, `mcp://metrics`, and `mcp://usage`.
//!
//! Every tool answers with a [`ResponseEnvelope`]; faults never escape as protocol errors except
//! for unknown tool names.

mod envelope;
mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use envelope::{ContentKind, EnvelopeContent, ResponseEnvelope};
pub use registry::{ToolName, parse_tool_name};
pub use server::LanguageMcpServer;
