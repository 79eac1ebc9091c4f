use serde::Serialize;

/// A slice of a document's text, stored with its own vector.
#[derive(Debug, Clone)]
pub struct Passage<'a> {
    pub position: usize,
    pub content: &'a str,
}

/// One row returned by a similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub content: String,
    pub position: usize,
    /// `1 - cosine distance`; 1.0 means same direction.
    pub similarity: f64,
}
