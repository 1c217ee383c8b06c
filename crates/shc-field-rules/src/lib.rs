//! Field Rules Engine (§4.A): a synchronous, read-only query surface over
//! a compiled category contract loaded from the `Storage` collaborator.

pub mod bundle;
pub mod engine;
pub mod error;
pub mod normalize;

pub use bundle::{ContractBundle, ContractBundleSource};
pub use engine::{FieldRulesEngine, FuzzyComponentMatch};
pub use error::FieldRulesError;
pub use normalize::NormalizeOutcome;
