use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeGateError {
    #[error("field {0} referenced in field_order has no loaded contract rule")]
    MissingFieldRule(String),
}
