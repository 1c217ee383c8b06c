use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("frontier snapshot failed to deserialize: {0}")]
    Deserialize(String),

    #[error("frontier sqlite backend error: {0}")]
    Sqlite(String),
}
