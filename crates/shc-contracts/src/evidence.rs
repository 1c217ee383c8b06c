//! Evidence documents, chunks, and facts (§3 "Evidence Document/Chunk/Fact").

use serde::{Deserialize, Serialize};

pub use crate::contract::ConflictPolicy;

/// 1 = manufacturer, 2 = lab/review, 3 = retail, 4 = other/community;
/// lower is preferred (§GLOSSARY "Tier").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Tier {
    Manufacturer = 1,
    LabReview = 2,
    Retail = 3,
    Other = 4,
}

impl Tier {
    pub fn from_u8(value: u8) -> Option<Tier> {
        match value {
            1 => Some(Tier::Manufacturer),
            2 => Some(Tier::LabReview),
            3 => Some(Tier::Retail),
            4 => Some(Tier::Other),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceDocument {
    pub doc_id: String,
    pub content_hash: String,
    pub parser_version: String,
    pub url: String,
    pub host: String,
    pub tier: Tier,
    pub role: String,
    pub category: String,
    pub product_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Text,
    Table,
    Kv,
}

/// Ranking used by the tier-aware retriever (§4.C step 2b), highest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    LlmExtract,
    Readability,
    Table,
    Kv,
    SpecTableMatch,
    ComponentDbInference,
}

impl ExtractionMethod {
    /// Rank used to order candidates within a tier; higher sorts first.
    pub fn rank(self) -> u8 {
        match self {
            ExtractionMethod::SpecTableMatch => 4,
            ExtractionMethod::Kv => 3,
            ExtractionMethod::Table => 2,
            ExtractionMethod::Readability => 1,
            ExtractionMethod::LlmExtract => 0,
            ExtractionMethod::ComponentDbInference => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceChunk {
    pub chunk_id: String,
    pub doc_id: String,
    pub chunk_index: usize,
    pub chunk_type: ChunkType,
    pub text: String,
    pub normalized_text: String,
    pub snippet_hash: String,
    pub snippet_id: String,
    pub extraction_method: ExtractionMethod,
    pub field_hints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceFact {
    pub chunk_id: String,
    pub field_key: String,
    pub value_raw: String,
    pub value_normalized: String,
    pub unit: Option<String>,
    pub extraction_method: ExtractionMethod,
    pub confidence: f64,
}

/// The retriever's evidence-pool shape produced by
/// `ftsResultsToEvidencePool` (§4.B).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePoolItem {
    pub field_key: String,
    pub url: String,
    pub host: String,
    pub tier: Tier,
    pub extraction_method: ExtractionMethod,
    pub quote: String,
    pub snippet_id: String,
    pub snippet_hash: String,
    pub value_normalized: String,
    pub score: f64,
    /// Count of distinct `(url, snippet_id)` references this candidate is
    /// backed by; used when component-db inference shares a source's refs.
    pub evidence_refs: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering_prefers_lower_number() {
        assert!(Tier::Manufacturer < Tier::LabReview);
        assert!(Tier::LabReview < Tier::Retail);
        assert!(Tier::Retail < Tier::Other);
    }

    #[test]
    fn extraction_method_rank_matches_spec_order() {
        assert!(ExtractionMethod::SpecTableMatch.rank() > ExtractionMethod::Kv.rank());
        assert!(ExtractionMethod::Kv.rank() > ExtractionMethod::Table.rank());
        assert!(ExtractionMethod::Table.rank() > ExtractionMethod::Readability.rank());
        assert!(ExtractionMethod::Readability.rank() > ExtractionMethod::LlmExtract.rank());
    }
}
