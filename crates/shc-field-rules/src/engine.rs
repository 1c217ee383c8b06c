//! `FieldRulesEngine`: the synchronous, read-only query surface over a
//! loaded contract bundle (§4.A).

use shc_contracts::{Catalog, ComponentItem, FieldContract};
use tracing::debug;

use crate::bundle::ContractBundle;
use crate::normalize::{normalize_candidate, NormalizeOutcome};

/// Result of `fuzzyMatchComponent` (§4.A).
#[derive(Debug, Clone)]
pub struct FuzzyComponentMatch<'a> {
    pub item: &'a ComponentItem,
    pub score: f64,
}

/// All lookups are constant-time amortized over hashed indices built at
/// load time; the engine is immutable after load and safe to share across
/// product workers without synchronization (§4.A, §5).
pub struct FieldRulesEngine {
    bundle: ContractBundle,
}

impl FieldRulesEngine {
    pub fn new(bundle: ContractBundle) -> Self {
        debug!(category = %bundle.category, fields = bundle.fields.len(), "field rules engine loaded");
        FieldRulesEngine { bundle }
    }

    pub fn category(&self) -> &str {
        &self.bundle.category
    }

    pub fn get_field_rule(&self, field_key: &str) -> Option<&FieldContract> {
        self.bundle.fields.get(field_key)
    }

    pub fn get_field_order(&self) -> &[String] {
        &self.bundle.field_order
    }

    pub fn get_enum_catalog(&self, name: &str) -> Option<&Catalog> {
        self.bundle.catalogs.get(name)
    }

    pub fn find_component_by_alias(&self, db_name: &str, query: &str) -> Option<&ComponentItem> {
        self.bundle.components.get(db_name)?.find_by_alias(query)
    }

    /// Uses the authored `fuzzy_threshold` when `threshold` is `None`
    /// (default 0.75, clamped to `[0,1]`, NaN falls back to default).
    pub fn fuzzy_match_component(
        &self,
        db_name: &str,
        query: &str,
        threshold: Option<f64>,
    ) -> Option<FuzzyComponentMatch<'_>> {
        let db = self.bundle.components.get(db_name)?;
        let resolved = threshold
            .map(shc_contracts::contract::clamp_fuzzy_threshold)
            .unwrap_or(0.75);
        db.fuzzy_match(query, resolved).map(|(item, score)| FuzzyComponentMatch { item, score })
    }

    pub fn normalize_candidate(&self, field_key: &str, value: &str) -> NormalizeOutcome {
        let Some(rule) = self.bundle.fields.get(field_key) else {
            return NormalizeOutcome { ok: false, normalized: None, reason_code: Some("unknown_field".to_string()) };
        };
        normalize_candidate(&self.bundle, rule, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ContractBundleSource;

    fn sample_source() -> ContractBundleSource {
        let json = r#"{
            "category": "mouse",
            "field_order": ["weight"],
            "fields": {
                "weight": {
                    "field_key": "weight",
                    "contract": {"type": "number", "unit": "g", "range": {"min": 0.0, "max": 200.0}},
                    "shape": "scalar",
                    "priority": {"required_level": "required", "availability": 1.0, "difficulty": 1.0, "effort": 3, "block_publish_when_unk": false, "publish_gate": "required_complete", "publish_gate_reason": null},
                    "enum_catalog": null,
                    "evidence": {"required": true, "min_evidence_refs": 1, "conflict_policy": "resolve_by_tier_else_unknown", "tier_preference": []},
                    "component": null
                }
            },
            "catalogs": {},
            "components": {}
        }"#;
        serde_json::from_str(json).expect("valid fixture")
    }

    #[test]
    fn get_field_rule_returns_loaded_rule() {
        let engine = FieldRulesEngine::new(sample_source().into());
        assert!(engine.get_field_rule("weight").is_some());
        assert!(engine.get_field_rule("missing_field").is_none());
    }

    #[test]
    fn get_field_order_matches_authored_order() {
        let engine = FieldRulesEngine::new(sample_source().into());
        assert_eq!(engine.get_field_order(), &["weight".to_string()]);
    }

    #[test]
    fn normalize_candidate_rejects_unknown_field() {
        let engine = FieldRulesEngine::new(sample_source().into());
        let out = engine.normalize_candidate("not_a_field", "1");
        assert!(!out.ok);
    }
}
