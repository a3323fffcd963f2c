pub mod chunker;
pub mod index_pipeline;
pub mod invalidation_hook;
pub mod pattern_detector;
pub mod query_classifier;
pub mod search_router;
pub mod secret_scanner;
pub mod suggestions;
pub mod walker;
pub mod watcher;

pub use chunker::{chunk_navigation_doc, chunk_patterns, module_from_path, Chunker};
pub use index_pipeline::{FileError, IndexPipeline, IndexResult};
pub use invalidation_hook::invalidate;
pub use search_router::{query_hash, SearchRouter, VECTOR_COLLECTION};
pub use walker::Walker;
pub use watcher::{resolve_head, WatchedRepo, Watcher};
