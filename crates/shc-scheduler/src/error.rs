use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("product runner reported state corruption: {0}")]
    StateCorruption(String),
}
