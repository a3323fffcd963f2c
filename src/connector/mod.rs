//! # Connector Layer
//!
//! External integrations implementing the ports declared under
//! `application::interfaces`: AST parsing, embedding, vector/graph/cache
//! storage, the stdio JSON-RPC server, and the dependency-injection
//! container that wires concrete adapters into the use cases.

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
