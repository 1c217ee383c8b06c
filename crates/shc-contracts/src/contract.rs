//! Field contract: the authoritative per-field declaration (§3 "Field Contract").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sum type over a field's value shape, modeled as a tagged union rather
/// than a polymorphic class hierarchy (§9 "Tagged unions over inheritance").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Number {
        unit: Option<String>,
        range: Option<NumericRange>,
    },
    Integer {
        range: Option<NumericRange>,
    },
    Boolean,
    String,
    Enum {
        catalog: String,
        policy: EnumPolicy,
    },
    ComponentRef {
        db_name: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Scalar,
    List,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnumPolicy {
    Closed,
    Open,
    OpenPreferKnown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Alias,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumMatch {
    pub strategy: MatchStrategy,
    pub fuzzy_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumCatalog {
    pub policy: EnumPolicy,
    pub source: String,
    #[serde(rename = "match")]
    pub match_rule: EnumMatch,
}

/// Required-level ordinal used for NeedSet weighting (§4.E `level_weight`)
/// and publish-gate checks (§4.D).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RequiredLevel {
    Identity,
    Critical,
    Required,
    Expected,
    Optional,
    Rare,
}

impl RequiredLevel {
    /// `level_weight` from §4.E.
    pub fn level_weight(self) -> f64 {
        match self {
            RequiredLevel::Required => 1.0,
            RequiredLevel::Critical => 1.2,
            RequiredLevel::Identity => 1.5,
            RequiredLevel::Expected => 0.6,
            RequiredLevel::Optional => 0.2,
            RequiredLevel::Rare => 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PublishGate {
    None,
    IdentityComplete,
    RequiredComplete,
    EvidenceComplete,
    AllValidationsPass,
    Strict,
}

impl Default for PublishGate {
    fn default() -> Self {
        PublishGate::RequiredComplete
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Priority {
    pub required_level: RequiredLevel,
    pub availability: f64,
    pub difficulty: f64,
    /// 1-10, contributes to `contractEffort` in the scheduler (§4.G).
    pub effort: u8,
    pub block_publish_when_unk: bool,
    #[serde(default)]
    pub publish_gate: PublishGate,
    pub publish_gate_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    ResolveByTierElseUnknown,
    PreserveAllCandidates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePolicy {
    pub required: bool,
    pub min_evidence_refs: u32,
    pub conflict_policy: ConflictPolicy,
    /// Absence at authoring time means `[1, 2, 3]` (Open Question §8/§13).
    pub tier_preference: Vec<u8>,
}

impl EvidencePolicy {
    pub fn tier_preference_or_default(&self) -> Vec<u8> {
        if self.tier_preference.is_empty() {
            vec![1, 2, 3]
        } else {
            self.tier_preference.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRefSpec {
    #[serde(rename = "type")]
    pub component_type: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AiAssist {
    pub mode: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationRef {
    pub rule_id: String,
    pub trigger_field: String,
}

/// A parser-template hint; free-form by design (§3 "parse").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParseHints {
    #[serde(flatten)]
    pub hints: HashMap<String, serde_json::Value>,
}

/// The authoritative per-field declaration read from a compiled category
/// contract (§3 "Field Contract").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldContract {
    pub field_key: String,
    pub contract: FieldType,
    pub shape: Shape,
    pub priority: Priority,
    pub enum_catalog: Option<EnumCatalog>,
    #[serde(default)]
    pub parse: ParseHints,
    pub evidence: EvidencePolicy,
    pub component: Option<ComponentRefSpec>,
    #[serde(default)]
    pub ai_assist: AiAssist,
    #[serde(default)]
    pub cross_validation: Vec<CrossValidationRef>,
    /// Search anchors / unit hint used by the retriever's `ftsQueryFn` path
    /// (§4.C step 1). Not part of the original prose data model but needed
    /// to make the retriever's algorithm runnable.
    #[serde(default)]
    pub anchors: Vec<String>,
    #[serde(default)]
    pub unit_hint: Option<String>,
}

impl FieldContract {
    pub fn fuzzy_threshold(&self) -> f64 {
        let raw = self
            .enum_catalog
            .as_ref()
            .and_then(|c| c.match_rule.fuzzy_threshold)
            .unwrap_or(0.75);
        clamp_fuzzy_threshold(raw)
    }
}

/// Clamp a fuzzy threshold to `[0, 1]`; NaN and out-of-range inputs fall
/// back to 0.75 / clamp per §8 "Boundary behaviours".
pub fn clamp_fuzzy_threshold(value: f64) -> f64 {
    if value.is_nan() {
        return 0.75;
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzzy_threshold_clamps_negative_to_zero() {
        assert_eq!(clamp_fuzzy_threshold(-0.5), 0.0);
    }

    #[test]
    fn fuzzy_threshold_clamps_large_to_one() {
        assert_eq!(clamp_fuzzy_threshold(5.0), 1.0);
    }

    #[test]
    fn fuzzy_threshold_nan_falls_back_to_default() {
        assert_eq!(clamp_fuzzy_threshold(f64::NAN), 0.75);
    }

    #[test]
    fn level_weight_ordering_matches_spec() {
        assert!(RequiredLevel::Identity.level_weight() > RequiredLevel::Critical.level_weight());
        assert!(RequiredLevel::Critical.level_weight() > RequiredLevel::Required.level_weight());
        assert!(RequiredLevel::Required.level_weight() > RequiredLevel::Expected.level_weight());
        assert!(RequiredLevel::Expected.level_weight() > RequiredLevel::Optional.level_weight());
    }
}
