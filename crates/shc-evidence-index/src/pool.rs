//! `ftsResultsToEvidencePool` (§4.B): maps search rows to the retriever's
//! evidence-pool shape.

use shc_contracts::EvidencePoolItem;

use crate::search::EvidenceSearchRow;

pub fn fts_results_to_evidence_pool(field_key: &str, rows: &[EvidenceSearchRow]) -> Vec<EvidencePoolItem> {
    rows.iter()
        .map(|row| EvidencePoolItem {
            field_key: field_key.to_string(),
            url: row.document.url.clone(),
            host: row.document.host.clone(),
            tier: row.document.tier,
            extraction_method: row.chunk.extraction_method,
            quote: row.chunk.text.clone(),
            snippet_id: row.chunk.snippet_id.clone(),
            snippet_hash: row.chunk.snippet_hash.clone(),
            value_normalized: String::new(),
            score: row.score,
            evidence_refs: 1,
        })
        .collect()
}
