pub mod mcp;

mod metrics_log;
mod neo4j_graph_repository;
mod qdrant_vector_repository;
mod redis_cache;
mod treesitter_parser;
mod voyage_embedder;

pub use mcp::*;
pub use metrics_log::*;
pub use neo4j_graph_repository::*;
pub use qdrant_vector_repository::*;
pub use redis_cache::*;
pub use treesitter_parser::*;
pub use voyage_embedder::*;
