//! localrag-vector
//!
//! Exact cosine vector index with a durable two-file format committed by a
//! pointer swap, the shared handle that holds the active index, the
//! full-rebuild index builder and the query-time retriever.

pub mod handle;
pub mod index_build;
pub mod schema;
pub mod search;
pub mod store;
pub mod writer;

pub use handle::StoreHandle;
pub use index_build::IndexBuilder;
pub use schema::IndexPaths;
pub use search::{build_context, Retriever};
pub use store::VectorStore;
pub use writer::meta_len;
