//! Per-chunk full-text index with a BM25-style rank (§4.B
//! `searchEvidenceByField`), grounded on the reference corpus's BM25
//! indexer (`indexers::bm25_indexer`).

use std::collections::HashMap;

use tracing::debug;

use shc_contracts::{EvidenceChunk, EvidenceDocument};

const K1: f64 = 1.2;
const B: f64 = 0.75;

#[derive(Debug, Clone)]
pub struct SearchEvidenceByFieldQuery {
    pub category: String,
    pub product_id: String,
    pub field_key: String,
    pub query_terms: Vec<String>,
    pub unit_hint: Option<String>,
    pub max_results: usize,
}

#[derive(Debug, Clone)]
pub struct EvidenceSearchRow {
    pub document: EvidenceDocument,
    pub chunk: EvidenceChunk,
    pub score: f64,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn term_frequencies(tokens: &[String]) -> HashMap<String, u32> {
    let mut freqs = HashMap::new();
    for t in tokens {
        *freqs.entry(t.clone()).or_insert(0) += 1;
    }
    freqs
}

/// Ranks chunks hinting at `query.field_key` via BM25 over the chunk's
/// `normalized_text`, using `query_terms` plus `unit_hint` as ranking-only
/// signals — neither gates membership (§4.B).
pub fn search_evidence_by_field(
    corpus: &[(EvidenceDocument, EvidenceChunk)],
    query: &SearchEvidenceByFieldQuery,
) -> Vec<EvidenceSearchRow> {
    let candidates: Vec<&(EvidenceDocument, EvidenceChunk)> = corpus
        .iter()
        .filter(|(doc, chunk)| {
            doc.category == query.category
                && doc.product_id == query.product_id
                && chunk.field_hints.iter().any(|f| f == &query.field_key)
        })
        .collect();

    if candidates.is_empty() {
        debug!(field_key = %query.field_key, "no candidate chunks hinted at this field");
        return Vec::new();
    }

    let mut search_terms: Vec<String> = query.query_terms.iter().map(|t| t.to_lowercase()).collect();
    if let Some(hint) = &query.unit_hint {
        search_terms.push(hint.to_lowercase());
    }
    if search_terms.is_empty() {
        search_terms.push(query.field_key.to_lowercase());
    }

    let doc_freqs: Vec<(HashMap<String, u32>, usize)> = candidates
        .iter()
        .map(|(_, chunk)| {
            let tokens = tokenize(&chunk.normalized_text);
            let len = tokens.len();
            (term_frequencies(&tokens), len)
        })
        .collect();

    let total_docs = candidates.len() as f64;
    let avg_len = {
        let sum: usize = doc_freqs.iter().map(|(_, len)| len).sum();
        if candidates.is_empty() { 1.0 } else { (sum as f64 / candidates.len() as f64).max(1.0) }
    };

    let mut doc_freq_for_term: HashMap<&str, usize> = HashMap::new();
    for term in &search_terms {
        let df = doc_freqs.iter().filter(|(freqs, _)| freqs.contains_key(term)).count();
        doc_freq_for_term.insert(term.as_str(), df);
    }

    let mut scored: Vec<EvidenceSearchRow> = candidates
        .iter()
        .zip(doc_freqs.iter())
        .map(|((doc, chunk), (freqs, len))| {
            let mut score = 0.0;
            for term in &search_terms {
                let df = *doc_freq_for_term.get(term.as_str()).unwrap_or(&0) as f64;
                if df == 0.0 {
                    continue;
                }
                let idf = ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln();
                let tf = *freqs.get(term).unwrap_or(&0) as f64;
                let denom = tf + K1 * (1.0 - B + B * (*len as f64 / avg_len));
                if denom > 0.0 {
                    score += idf * ((tf * (K1 + 1.0)) / denom);
                }
            }
            EvidenceSearchRow { document: (*doc).clone(), chunk: (*chunk).clone(), score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(query.max_results.max(1));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use shc_contracts::{ChunkType, ExtractionMethod, Tier};

    fn doc(product_id: &str) -> EvidenceDocument {
        EvidenceDocument {
            doc_id: "doc_1".to_string(),
            content_hash: "h".to_string(),
            parser_version: "v1".to_string(),
            url: "https://a/1".to_string(),
            host: "a".to_string(),
            tier: Tier::Manufacturer,
            role: "spec".to_string(),
            category: "mouse".to_string(),
            product_id: product_id.to_string(),
        }
    }

    fn chunk(index: usize, text: &str, field_hints: &[&str]) -> EvidenceChunk {
        EvidenceChunk {
            chunk_id: format!("doc_1_{}", index),
            doc_id: "doc_1".to_string(),
            chunk_index: index,
            chunk_type: ChunkType::Kv,
            text: text.to_string(),
            normalized_text: text.to_lowercase(),
            snippet_hash: "sh".to_string(),
            snippet_id: format!("sn_{}", index),
            extraction_method: ExtractionMethod::Kv,
            field_hints: field_hints.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn ranks_chunk_mentioning_query_terms_higher() {
        let corpus = vec![
            (doc("p1"), chunk(0, "weight 120 grams", &["weight"])),
            (doc("p1"), chunk(1, "dimensions 120mm long", &["weight"])),
        ];
        let query = SearchEvidenceByFieldQuery {
            category: "mouse".to_string(),
            product_id: "p1".to_string(),
            field_key: "weight".to_string(),
            query_terms: vec!["weight".to_string(), "grams".to_string()],
            unit_hint: Some("g".to_string()),
            max_results: 10,
        };
        let results = search_evidence_by_field(&corpus, &query);
        assert_eq!(results[0].chunk.chunk_index, 0);
    }

    #[test]
    fn filters_out_chunks_not_hinting_the_field() {
        let corpus = vec![(doc("p1"), chunk(0, "weight 120 grams", &["dpi"]))];
        let query = SearchEvidenceByFieldQuery {
            category: "mouse".to_string(),
            product_id: "p1".to_string(),
            field_key: "weight".to_string(),
            query_terms: vec!["weight".to_string()],
            unit_hint: None,
            max_results: 10,
        };
        assert!(search_evidence_by_field(&corpus, &query).is_empty());
    }

    #[test]
    fn scopes_to_requested_product() {
        let corpus = vec![(doc("p2"), chunk(0, "weight 120 grams", &["weight"]))];
        let query = SearchEvidenceByFieldQuery {
            category: "mouse".to_string(),
            product_id: "p1".to_string(),
            field_key: "weight".to_string(),
            query_terms: vec!["weight".to_string()],
            unit_hint: None,
            max_results: 10,
        };
        assert!(search_evidence_by_field(&corpus, &query).is_empty());
    }
}
