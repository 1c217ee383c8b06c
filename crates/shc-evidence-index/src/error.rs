use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvidenceIndexError {
    #[error("document referenced unknown doc_id {0}")]
    UnknownDocument(String),

    #[error("chunk {chunk_id} referenced unknown doc_id {doc_id}")]
    DanglingChunk { chunk_id: String, doc_id: String },

    #[error("fact referenced unknown chunk_id {0}")]
    DanglingFact(String),
}
