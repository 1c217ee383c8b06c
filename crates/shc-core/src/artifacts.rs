//! Published artifact shapes and writers (§6 "Published artifacts per
//! product run"). Each `write_*` function serializes its artifact and
//! pushes it through the `Storage` collaborator at
//! `latest/<name>.json`, resolved via `Storage::resolve_output_key` so the
//! core never assumes a filesystem path shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shc_contracts::{EvidencePoolItem, FieldProvenance};
use shc_runtime_gate::FailureRow;

use crate::collaborators::{Storage, StorageError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedArtifact {
    pub identity: serde_json::Value,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceArtifact {
    pub fields: HashMap<String, FieldProvenance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeEngineSummary {
    pub failures: Vec<FailureRow>,
    pub curation_suggestions_count: usize,
}

/// `summary.json` (§6). `field_reasoning` and `constraint_analysis` are
/// free-form JSON since the spec names them without fixing an inner shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub validated: bool,
    pub confidence: f64,
    pub coverage_overall: f64,
    pub completeness_required: f64,
    pub missing_required_fields: Vec<String>,
    pub critical_fields_below_pass_target: Vec<String>,
    pub field_reasoning: serde_json::Value,
    pub runtime_engine: RuntimeEngineSummary,
    pub constraint_analysis: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRow {
    pub candidate_id: String,
    pub value: String,
    pub score: f64,
    pub source_host: String,
    pub source_tier: String,
    pub source_method: String,
    pub snippet_id: String,
    pub snippet_hash: String,
    pub quote: String,
    pub evidence_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CandidatesArtifact {
    pub fields: HashMap<String, Vec<CandidateRow>>,
}

/// Builds the per-field candidate rows `candidates.json` publishes from the
/// retriever's evidence pool (§4.C, §6).
pub fn candidate_rows_from_pool(pool: &[EvidencePoolItem]) -> Vec<CandidateRow> {
    pool.iter()
        .enumerate()
        .map(|(i, item)| CandidateRow {
            candidate_id: format!("{}_{}", item.snippet_id, i),
            value: item.value_normalized.clone(),
            score: item.score,
            source_host: item.host.clone(),
            source_tier: format!("{:?}", item.tier).to_lowercase(),
            source_method: format!("{:?}", item.extraction_method).to_lowercase(),
            snippet_id: item.snippet_id.clone(),
            snippet_hash: item.snippet_hash.clone(),
            quote: item.quote.clone(),
            evidence_url: item.url.clone(),
        })
        .collect()
}

async fn write_json(storage: &dyn Storage, key: &str, value: &impl Serialize) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StorageError::WriteFailed {
        key: key.to_string(),
        detail: e.to_string(),
    })?;
    storage.write_object(key, bytes, "application/json").await
}

pub async fn write_normalized(storage: &dyn Storage, artifact: &NormalizedArtifact) -> Result<(), StorageError> {
    let key = storage.resolve_output_key(&["latest", "normalized.json"]);
    write_json(storage, &key, artifact).await
}

pub async fn write_provenance(storage: &dyn Storage, artifact: &ProvenanceArtifact) -> Result<(), StorageError> {
    let key = storage.resolve_output_key(&["latest", "provenance.json"]);
    write_json(storage, &key, artifact).await
}

pub async fn write_summary(storage: &dyn Storage, artifact: &SummaryArtifact) -> Result<(), StorageError> {
    let key = storage.resolve_output_key(&["latest", "summary.json"]);
    write_json(storage, &key, artifact).await
}

pub async fn write_candidates(storage: &dyn Storage, artifact: &CandidatesArtifact) -> Result<(), StorageError> {
    let key = storage.resolve_output_key(&["latest", "candidates.json"]);
    write_json(storage, &key, artifact).await
}

/// Writes `current.json`, the publish-gate-approved artifact (§7
/// "User-visible behaviour"). Callers must not invoke this when the
/// publish gate produced any blockers.
pub async fn write_current(storage: &dyn Storage, artifact: &NormalizedArtifact) -> Result<(), StorageError> {
    let key = storage.resolve_output_key(&["latest", "current.json"]);
    write_json(storage, &key, artifact).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shc_contracts::{ExtractionMethod, Tier};
    use std::sync::Arc;

    #[derive(Default)]
    struct MemStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl Storage for MemStorage {
        async fn read_json_or_null(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
            let objects = self.objects.lock();
            Ok(objects.get(key).map(|b| serde_json::from_slice(b).unwrap()))
        }
        async fn read_text_or_null(&self, key: &str) -> Result<Option<String>, StorageError> {
            let objects = self.objects.lock();
            Ok(objects.get(key).map(|b| String::from_utf8_lossy(b).to_string()))
        }
        async fn write_object(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
            self.objects.lock().insert(key.to_string(), bytes);
            Ok(())
        }
        fn resolve_output_key(&self, parts: &[&str]) -> String {
            parts.join("/")
        }
        async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
            Ok(self.objects.lock().contains_key(key))
        }
    }

    #[tokio::test]
    async fn write_summary_round_trips_through_storage() {
        let storage = Arc::new(MemStorage::default());
        let summary = SummaryArtifact {
            validated: true,
            confidence: 0.9,
            coverage_overall: 1.0,
            completeness_required: 1.0,
            missing_required_fields: vec![],
            critical_fields_below_pass_target: vec![],
            field_reasoning: serde_json::json!({}),
            runtime_engine: RuntimeEngineSummary { failures: vec![], curation_suggestions_count: 0 },
            constraint_analysis: serde_json::json!({}),
        };
        write_summary(storage.as_ref(), &summary).await.unwrap();
        let raw = storage.read_json_or_null("latest/summary.json").await.unwrap().unwrap();
        assert_eq!(raw["validated"], serde_json::json!(true));
    }

    #[test]
    fn candidate_rows_carry_snippet_identity_through() {
        let pool = vec![EvidencePoolItem {
            field_key: "weight".to_string(),
            url: "https://a/1".to_string(),
            host: "a".to_string(),
            tier: Tier::Manufacturer,
            extraction_method: ExtractionMethod::Kv,
            quote: "Weight: 120g".to_string(),
            snippet_id: "sn_0".to_string(),
            snippet_hash: "sh".to_string(),
            value_normalized: "120".to_string(),
            score: 2.0,
            evidence_refs: 1,
        }];
        let rows = candidate_rows_from_pool(&pool);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].snippet_id, "sn_0");
        assert_eq!(rows[0].source_tier, "manufacturer");
    }
}
