//! # CodeIndex
//!
//! A code-indexing and semantic-search service for developer assistants:
//! indexes repositories into a vector store and graph store, classifies
//! queries into retrieval strategies, and serves a single `search_code`
//! tool over stdio via the Model Context Protocol.
//!
//! ## Architecture
//!
//! The crate is organized following Domain-Driven Design principles:
//!
//! - `domain`: Core business models, cursor/query shapes, and `DomainError`
//! - `application`: Use cases and the ports (traits) they depend on
//! - `connector`: External integrations (tree-sitter, Voyage, Qdrant, Neo4j, Redis, MCP)

pub mod application;
pub mod connector;
pub mod domain;

// Re-export commonly used types
pub use application::*;
pub use connector::*;
pub use domain::*;
