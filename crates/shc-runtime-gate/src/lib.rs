//! Runtime Validation Gate (§4.D): normalizes and validates a proposed
//! field map against the loaded contract, producing validated fields, a
//! failure ledger, curation suggestions, and a publish-gate decision.

pub mod error;
pub mod gate;
pub mod publish;
pub mod types;

pub use error::RuntimeGateError;
pub use gate::{apply_runtime_field_rules, ApplyRuntimeFieldRulesArgs, CrossValidationFn};
pub use publish::{check_publish_blockers, evaluate_publish_gate, PublishGateArgs};
pub use types::{ChangeRow, CurationSuggestion, EvidencePack, FailureRow, GateResult, PublishBlocker};
