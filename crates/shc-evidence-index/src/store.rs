//! Content-addressed document/chunk/fact store (§4.B).
//!
//! Writers serialize on a single logical transaction per `index_document`
//! call (§4.B "Concurrency"); readers may interleave freely against the
//! `DashMap`-backed tables, which give per-shard locking rather than one
//! global lock, matching the MVCC-ish read path the design notes call for
//! (§9 "Shared resources").

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use shc_contracts::{
    generate_doc_id, generate_stable_snippet_id, ChunkType, EvidenceChunk, EvidenceDocument,
    EvidenceFact, ExtractionMethod, Tier,
};

use crate::error::EvidenceIndexError;

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub content_hash: String,
    pub parser_version: String,
    pub url: String,
    pub host: String,
    pub tier: Tier,
    pub role: String,
    pub category: String,
    pub product_id: String,
}

#[derive(Debug, Clone)]
pub struct NewChunk {
    pub chunk_index: usize,
    pub chunk_type: ChunkType,
    pub text: String,
    pub normalized_text: String,
    pub extraction_method: ExtractionMethod,
    pub field_hints: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewFact {
    pub chunk_index: usize,
    pub field_key: String,
    pub value_raw: String,
    pub value_normalized: String,
    pub unit: Option<String>,
    pub extraction_method: ExtractionMethod,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct IndexDocumentRequest {
    pub document: NewDocument,
    pub chunks: Vec<NewChunk>,
    pub facts: Vec<NewFact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeOutcome {
    New,
    Reused,
    Updated,
}

#[derive(Debug, Clone)]
pub struct IndexDocumentResult {
    pub doc_id: String,
    pub dedupe_outcome: DedupeOutcome,
    pub chunks_indexed: usize,
    pub facts_indexed: usize,
    pub snippet_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EvidenceInventory {
    pub doc_count: usize,
    pub chunk_count: usize,
    pub fact_count: usize,
    pub fields_with_facts: Vec<String>,
}

fn snippet_hash(normalized_text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(normalized_text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// In-memory content-addressed evidence store. A single `Mutex` guards the
/// hash-dedup decision so `index_document` calls serialize on that one
/// transaction (§4.B "Concurrency"); the per-table `DashMap`s allow
/// concurrent readers once a write has landed.
pub struct EvidenceStore {
    documents: DashMap<String, EvidenceDocument>,
    /// `(content_hash, parser_version) -> doc_id`, the dedup key (§3).
    hash_index: DashMap<(String, String), String>,
    /// last known `content_hash` per URL, used to detect `updated`.
    url_index: DashMap<String, String>,
    chunks_by_doc: DashMap<String, Vec<EvidenceChunk>>,
    facts_by_doc: DashMap<String, Vec<EvidenceFact>>,
    write_lane: Arc<Mutex<()>>,
}

impl Default for EvidenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceStore {
    pub fn new() -> Self {
        EvidenceStore {
            documents: DashMap::new(),
            hash_index: DashMap::new(),
            url_index: DashMap::new(),
            chunks_by_doc: DashMap::new(),
            facts_by_doc: DashMap::new(),
            write_lane: Arc::new(Mutex::new(())),
        }
    }

    pub fn index_document(
        &self,
        request: IndexDocumentRequest,
    ) -> Result<IndexDocumentResult, EvidenceIndexError> {
        let _guard = self.write_lane.lock();

        let doc_id = generate_doc_id(&request.document.content_hash, &request.document.parser_version);
        let hash_key = (request.document.content_hash.clone(), request.document.parser_version.clone());

        if let Some(existing_doc_id) = self.hash_index.get(&hash_key).map(|r| r.clone()) {
            debug!(doc_id = %existing_doc_id, "evidence document reused, identical content");
            let snippet_ids = self
                .chunks_by_doc
                .get(&existing_doc_id)
                .map(|c| c.iter().map(|c| c.snippet_id.clone()).collect())
                .unwrap_or_default();
            return Ok(IndexDocumentResult {
                doc_id: existing_doc_id,
                dedupe_outcome: DedupeOutcome::Reused,
                chunks_indexed: 0,
                facts_indexed: 0,
                snippet_ids,
            });
        }

        let outcome = if self.url_index.contains_key(&request.document.url) {
            DedupeOutcome::Updated
        } else {
            DedupeOutcome::New
        };

        let doc = EvidenceDocument {
            doc_id: doc_id.clone(),
            content_hash: request.document.content_hash.clone(),
            parser_version: request.document.parser_version.clone(),
            url: request.document.url.clone(),
            host: request.document.host,
            tier: request.document.tier,
            role: request.document.role,
            category: request.document.category,
            product_id: request.document.product_id,
        };

        let mut chunk_id_by_index: HashMap<usize, String> = HashMap::new();
        let mut chunks = Vec::with_capacity(request.chunks.len());
        let mut snippet_ids = Vec::with_capacity(request.chunks.len());
        for chunk in &request.chunks {
            let snippet_id = generate_stable_snippet_id(
                &request.document.content_hash,
                &request.document.parser_version,
                chunk.chunk_index,
            );
            let chunk_id = format!("{}_{}", doc_id, chunk.chunk_index);
            chunk_id_by_index.insert(chunk.chunk_index, chunk_id.clone());
            snippet_ids.push(snippet_id.clone());
            chunks.push(EvidenceChunk {
                chunk_id,
                doc_id: doc_id.clone(),
                chunk_index: chunk.chunk_index,
                chunk_type: chunk.chunk_type,
                text: chunk.text.clone(),
                normalized_text: chunk.normalized_text.clone(),
                snippet_hash: snippet_hash(&chunk.normalized_text),
                snippet_id,
                extraction_method: chunk.extraction_method,
                field_hints: chunk.field_hints.clone(),
            });
        }

        let mut facts = Vec::with_capacity(request.facts.len());
        for fact in &request.facts {
            let Some(chunk_id) = chunk_id_by_index.get(&fact.chunk_index) else {
                return Err(EvidenceIndexError::DanglingFact(format!(
                    "chunk_index {} has no matching chunk",
                    fact.chunk_index
                )));
            };
            facts.push(EvidenceFact {
                chunk_id: chunk_id.clone(),
                field_key: fact.field_key.clone(),
                value_raw: fact.value_raw.clone(),
                value_normalized: fact.value_normalized.clone(),
                unit: fact.unit.clone(),
                extraction_method: fact.extraction_method,
                confidence: fact.confidence,
            });
        }

        let chunks_indexed = chunks.len();
        let facts_indexed = facts.len();

        self.documents.insert(doc_id.clone(), doc);
        self.hash_index.insert(hash_key, doc_id.clone());
        self.url_index.insert(request.document.url.clone(), request.document.content_hash.clone());
        self.chunks_by_doc.insert(doc_id.clone(), chunks);
        self.facts_by_doc.insert(doc_id.clone(), facts);

        info!(doc_id = %doc_id, chunks_indexed, facts_indexed, ?outcome, "evidence document indexed");

        Ok(IndexDocumentResult {
            doc_id,
            dedupe_outcome: outcome,
            chunks_indexed,
            facts_indexed,
            snippet_ids,
        })
    }

    pub fn get_document_by_hash(&self, content_hash: &str, parser_version: &str) -> Option<EvidenceDocument> {
        let key = (content_hash.to_string(), parser_version.to_string());
        let doc_id = self.hash_index.get(&key)?.clone();
        self.documents.get(&doc_id).map(|d| d.clone())
    }

    pub fn get_chunks_for_document(&self, doc_id: &str) -> Vec<EvidenceChunk> {
        self.chunks_by_doc.get(doc_id).map(|c| c.clone()).unwrap_or_default()
    }

    pub fn get_facts_for_field(&self, category: &str, product_id: &str, field_key: &str) -> Vec<EvidenceFact> {
        let mut out = Vec::new();
        for doc in self.documents.iter() {
            if doc.category != category || doc.product_id != product_id {
                continue;
            }
            if let Some(facts) = self.facts_by_doc.get(doc.doc_id.as_str()) {
                out.extend(facts.iter().filter(|f| f.field_key == field_key).cloned());
            }
        }
        out
    }

    pub fn get_evidence_inventory(&self, category: &str, product_id: &str) -> EvidenceInventory {
        let mut inventory = EvidenceInventory::default();
        let mut fields = std::collections::HashSet::new();
        for doc in self.documents.iter() {
            if doc.category != category || doc.product_id != product_id {
                continue;
            }
            inventory.doc_count += 1;
            if let Some(chunks) = self.chunks_by_doc.get(doc.doc_id.as_str()) {
                inventory.chunk_count += chunks.len();
            }
            if let Some(facts) = self.facts_by_doc.get(doc.doc_id.as_str()) {
                inventory.fact_count += facts.len();
                for f in facts.iter() {
                    fields.insert(f.field_key.clone());
                }
            }
        }
        inventory.fields_with_facts = fields.into_iter().collect();
        inventory
    }

    /// All chunks across the whole store, for the full-text search path.
    pub fn all_chunks(&self) -> Vec<(EvidenceDocument, EvidenceChunk)> {
        let mut out = Vec::new();
        for doc in self.documents.iter() {
            if let Some(chunks) = self.chunks_by_doc.get(doc.doc_id.as_str()) {
                for chunk in chunks.iter() {
                    out.push((doc.clone(), chunk.clone()));
                }
            }
        }
        out
    }
}
