//! Result types shared by the gate and publish-gate stages (§4.D).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRow {
    pub field: String,
    pub stage: String,
    pub reason_code: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRow {
    pub field: String,
    pub stage: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationSuggestion {
    pub field_key: String,
    pub suggested_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishBlocker {
    pub field: String,
    pub gate_check: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub applied: bool,
    pub fields: std::collections::HashMap<String, String>,
    pub failures: Vec<FailureRow>,
    pub changes: Vec<ChangeRow>,
    pub curation_suggestions: Vec<CurationSuggestion>,
}

/// The text pack an `enforceEvidence` pass checks snippet quotes against
/// (§4.D stage 5).
#[derive(Debug, Clone, Default)]
pub struct EvidencePack {
    pub snippets: std::collections::HashMap<String, String>,
}
