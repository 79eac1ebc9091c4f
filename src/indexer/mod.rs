//! Content-file indexing: passage splitting and differential sync into the vector store.
pub mod core;
pub mod passages;
