//! Composition-root error aggregation (§11.2). Per-crate errors stay
//! precise inside their crate; `shc-core` is the only place that converts
//! them into `anyhow::Error`, matching the teacher's convention of precise
//! errors inside a crate and `anyhow` at the boundary. Per §7, this is
//! reserved for collaborator failures and state corruption — validation
//! failures never reach here, they are recovered locally into failure rows.

use thiserror::Error;

use crate::collaborators::{FetchError, ReasoningError, StorageError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("storage collaborator failed: {0}")]
    Storage(#[from] StorageError),
    #[error("fetch collaborator failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("reasoning collaborator failed: {0}")]
    Reasoning(#[from] ReasoningError),
    #[error("frontier error: {0}")]
    Frontier(#[from] shc_frontier::FrontierError),
    #[error("state corruption: {0}")]
    StateCorruption(String),
}
