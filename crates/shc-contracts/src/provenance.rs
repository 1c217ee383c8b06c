//! Per-field provenance records (§3 "Provenance").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceEvidenceRow {
    pub url: String,
    pub snippet_id: String,
    pub snippet_hash: String,
    pub quote: String,
    pub quote_span: Option<(usize, usize)>,
    pub source_id: String,
    pub retrieved_at: String,
    pub extraction_method: String,
}

impl ProvenanceEvidenceRow {
    /// A row is "well-formed" for the evidence audit (§4.D stage 5) when
    /// all four fields are non-empty.
    pub fn is_well_formed(&self) -> bool {
        !self.url.trim().is_empty()
            && !self.snippet_id.trim().is_empty()
            && !self.snippet_hash.trim().is_empty()
            && !self.quote.trim().is_empty()
    }

    /// The `(url, snippet_id)` pair used as the distinct-ref key (§3, §8).
    /// Rows without a `snippet_id` never count toward a quorum.
    pub fn distinct_ref_key(&self) -> Option<(String, String)> {
        if self.snippet_id.trim().is_empty() {
            None
        } else {
            Some((self.url.clone(), self.snippet_id.clone()))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldProvenance {
    pub value: String,
    pub confidence: f64,
    pub pass_target: f64,
    pub meets_pass_target: bool,
    pub evidence: Vec<ProvenanceEvidenceRow>,
}

impl FieldProvenance {
    pub fn unk() -> Self {
        FieldProvenance {
            value: crate::UNK.to_string(),
            confidence: 0.0,
            pass_target: 0.0,
            meets_pass_target: false,
            evidence: Vec::new(),
        }
    }

    /// Count of distinct `(url, snippet_id)` pairs (§3 invariant, §8
    /// "Evidence quorum"): duplicates collapse, entries missing a
    /// `snippet_id` never count.
    pub fn distinct_evidence_ref_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        for row in &self.evidence {
            if let Some(key) = row.distinct_ref_key() {
                seen.insert(key);
            }
        }
        seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(url: &str, snippet_id: &str, quote: &str) -> ProvenanceEvidenceRow {
        ProvenanceEvidenceRow {
            url: url.to_string(),
            snippet_id: snippet_id.to_string(),
            snippet_hash: "hash".to_string(),
            quote: quote.to_string(),
            quote_span: None,
            source_id: "src".to_string(),
            retrieved_at: "2026-01-01T00:00:00Z".to_string(),
            extraction_method: "kv".to_string(),
        }
    }

    #[test]
    fn duplicate_url_snippet_pairs_count_once() {
        let mut p = FieldProvenance::unk();
        p.evidence.push(row("https://a/1", "sn_x", "120g"));
        p.evidence.push(row("https://a/1", "sn_x", "120 grams"));
        assert_eq!(p.distinct_evidence_ref_count(), 1);
    }

    #[test]
    fn rows_without_snippet_id_never_count() {
        let mut p = FieldProvenance::unk();
        p.evidence.push(row("https://a/1", "", "120g"));
        assert_eq!(p.distinct_evidence_ref_count(), 0);
    }

    #[test]
    fn two_distinct_pairs_count_as_two() {
        let mut p = FieldProvenance::unk();
        p.evidence.push(row("https://a/1", "sn_x", "120g"));
        p.evidence.push(row("https://b/2", "sn_y", "120 grams"));
        assert_eq!(p.distinct_evidence_ref_count(), 2);
    }
}
