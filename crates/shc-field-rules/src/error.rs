//! Error type for the Field Rules Engine crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldRulesError {
    #[error("category contract bundle is missing field rules for category {0:?}")]
    MissingCategory(String),

    #[error("malformed contract bundle: {0}")]
    MalformedBundle(String),

    #[error("unknown enum catalog: {0}")]
    UnknownCatalog(String),
}
