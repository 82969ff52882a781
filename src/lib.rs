//! Graforest - Knowledge Graph Gateway MCP Server
//!
//! A protocol gateway exposing knowledge graph operations to AI agents,
//! mediating between the MCP tool surface and the Graforest backends.

pub mod auth;
pub mod backend;
pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod mcp;
pub mod models;
pub mod validate;

pub use di::FromRef;
