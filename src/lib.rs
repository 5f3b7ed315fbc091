//! cem-mcp: MCP server exposing Custom Elements Manifest metadata to AI assistants
//!
//! This library discovers `custom-elements.json` files across a workspace and
//! its installed dependencies, indexes the web components they describe, and
//! republishes that metadata as MCP tools.
//!
//! # Architecture
//!
//! Discovery walks `package.json` descriptors (their `customElements` entries
//! plus one level of direct dependencies), falling back to a raw file scan.
//! Each located manifest is read lazily, indexed by tag and class name, and
//! invalidated on file change. Queries aggregate across every manifest; a
//! change token lets the aggregate layer skip rebuilds when nothing moved.
//!
//! # Modules
//!
//! - [`cem`] — manifest discovery, caching and component queries
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol implementation

pub mod cem;
pub mod config;
pub mod error;
pub mod mcp;
