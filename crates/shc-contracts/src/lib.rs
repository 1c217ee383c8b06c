//! Shared data model for the contract-driven specification harvester.
//!
//! This crate has no I/O of its own. It defines the field contract, known
//! value catalog, component database, evidence/provenance records, and the
//! stable-ID functions that every other `shc-*` crate builds on.

pub mod catalog;
pub mod contract;
pub mod component;
pub mod evidence;
pub mod ids;
pub mod needset;
pub mod provenance;

pub use catalog::{Catalog, CatalogValue};
pub use component::{ComponentDb, ComponentItem, ComponentProperty, VariancePolicy};
pub use contract::{
    AiAssist, ComponentRefSpec, CrossValidationRef, EnumCatalog, EnumMatch, EnumPolicy,
    EvidencePolicy, FieldContract, FieldType, MatchStrategy, NumericRange, ParseHints,
    Priority, PublishGate, RequiredLevel, Shape,
};
pub use evidence::{
    ConflictPolicy, EvidenceChunk, EvidenceDocument, EvidenceFact, EvidencePoolItem, Tier,
};
pub use ids::{generate_doc_id, generate_stable_snippet_id};
pub use needset::{NeedReason, NeedRow};
pub use provenance::{FieldProvenance, ProvenanceEvidenceRow};

/// The literal token published for a field with no validated value.
pub const UNK: &str = "unk";

/// Case-insensitive tokens that `checkPublishBlockers` treats as "unknown".
pub const UNKNOWN_TOKENS: &[&str] = &["unk", "unknown", "n/a", "null", "", "-"];

/// True if `value` is one of the recognized unknown-token spellings.
pub fn is_unknown_token(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    UNKNOWN_TOKENS.iter().any(|t| *t == lower)
}
