//! Tier-Aware Retriever (§4.C): given a field and a NeedSet row, returns an
//! ordered, deduplicated evidence set honouring tier preferences and
//! minimum-reference quorums.

use std::collections::HashSet;

use tracing::debug;

use shc_contracts::{EvidencePoolItem, FieldContract, NeedRow, Tier};

/// Minimal identity context the retriever uses for the "identity match"
/// ranking signal (§4.C step 2a) — brand/model substring hit on quote or
/// host.
#[derive(Debug, Clone, Default)]
pub struct IdentityContext {
    pub brand: String,
    pub model: String,
}

impl IdentityContext {
    fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        (!self.brand.is_empty() && lower.contains(&self.brand.to_lowercase()))
            || (!self.model.is_empty() && lower.contains(&self.model.to_lowercase()))
    }
}

/// Arguments handed to an optional full-text query function, called first
/// when available (§4.C step 1).
#[derive(Debug, Clone)]
pub struct FtsQueryArgs<'a> {
    pub field_key: &'a str,
    pub anchors: &'a [String],
    pub unit_hint: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct RetrievalDebug {
    pub pool_size: usize,
    pub used_fts: bool,
    pub tiers_emitted: Vec<u8>,
    pub min_refs_shortfall: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub hits: Vec<EvidencePoolItem>,
    pub debug: RetrievalDebug,
}

pub struct TierAwareFieldRetrievalArgs<'a, F>
where
    F: FnMut(FtsQueryArgs<'_>) -> Vec<EvidencePoolItem>,
{
    pub field_key: &'a str,
    pub need_row: &'a NeedRow,
    pub field_rule: &'a FieldContract,
    pub evidence_pool: &'a [EvidencePoolItem],
    pub identity: &'a IdentityContext,
    pub max_hits: usize,
    pub fts_query_fn: Option<F>,
}

/// `buildTierAwareFieldRetrieval` (§4.C).
pub fn build_tier_aware_field_retrieval<F>(mut args: TierAwareFieldRetrievalArgs<'_, F>) -> RetrievalResult
where
    F: FnMut(FtsQueryArgs<'_>) -> Vec<EvidencePoolItem>,
{
    let anchors = &args.field_rule.anchors;
    let unit_hint = args.field_rule.unit_hint.as_deref();

    let (pool, used_fts): (Vec<EvidencePoolItem>, bool) = if let Some(fts) = args.fts_query_fn.as_mut() {
        let hits = fts(FtsQueryArgs { field_key: args.field_key, anchors, unit_hint });
        if !hits.is_empty() {
            (hits, true)
        } else {
            (filter_pool(args.evidence_pool, args.field_key), false)
        }
    } else {
        (filter_pool(args.evidence_pool, args.field_key), false)
    };

    let pool_size = pool.len();
    debug!(field_key = %args.field_key, pool_size, used_fts, "retriever candidate pool built");

    let tier_preference = if args.need_row.tier_preference.is_empty() {
        vec![1, 2, 3]
    } else {
        args.need_row.tier_preference.clone()
    };

    let mut grouped: std::collections::HashMap<u8, Vec<EvidencePoolItem>> = std::collections::HashMap::new();
    for item in pool {
        grouped.entry(item.tier.as_u8()).or_default().push(item);
    }
    for items in grouped.values_mut() {
        items.sort_by(|a, b| {
            let a_identity = args.identity.matches(&a.quote) || args.identity.matches(&a.host);
            let b_identity = args.identity.matches(&b.quote) || args.identity.matches(&b.host);
            b_identity
                .cmp(&a_identity)
                .then(b.extraction_method.rank().cmp(&a.extraction_method.rank()))
                .then(b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
        });
    }

    let mut ordered_tiers = tier_preference.clone();
    for tier in 1u8..=4 {
        if !ordered_tiers.contains(&tier) {
            ordered_tiers.push(tier);
        }
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut hits = Vec::new();
    let mut tiers_emitted = Vec::new();

    'tiers: for tier in &ordered_tiers {
        if let Some(items) = grouped.get(tier) {
            for item in items {
                if hits.len() >= args.max_hits {
                    break 'tiers;
                }
                let key = (item.url.clone(), item.snippet_id.clone());
                if seen.insert(key) {
                    if !tiers_emitted.contains(tier) {
                        tiers_emitted.push(*tier);
                    }
                    hits.push(item.clone());
                }
            }
        }
    }

    let distinct_refs = hits
        .iter()
        .map(|h| (h.url.clone(), h.snippet_id.clone()))
        .collect::<HashSet<_>>()
        .len() as u32;

    let min_refs_shortfall = if args.need_row.min_refs > 1 && distinct_refs < args.need_row.min_refs {
        Some(args.need_row.min_refs - distinct_refs)
    } else {
        None
    };

    if let Some(shortfall) = min_refs_shortfall {
        debug!(field_key = %args.field_key, shortfall, "evidence quorum shortfall, no hits synthesized");
    }

    RetrievalResult {
        hits,
        debug: RetrievalDebug { pool_size, used_fts, tiers_emitted, min_refs_shortfall },
    }
}

/// Fallback linear scan over the caller-provided pool, filtered by the
/// field it was built for.
fn filter_pool(pool: &[EvidencePoolItem], field_key: &str) -> Vec<EvidencePoolItem> {
    pool.iter().filter(|item| item.field_key == field_key).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shc_contracts::{ExtractionMethod, NeedReason, RequiredLevel};

    fn item(tier: Tier, url: &str, snippet_id: &str, score: f64, method: ExtractionMethod) -> EvidencePoolItem {
        EvidencePoolItem {
            field_key: "weight".to_string(),
            url: url.to_string(),
            host: "example.com".to_string(),
            tier,
            extraction_method: method,
            quote: "Razer Viper V3 Pro weighs 54g".to_string(),
            snippet_id: snippet_id.to_string(),
            snippet_hash: "sh".to_string(),
            value_normalized: "54".to_string(),
            score,
            evidence_refs: 1,
        }
    }

    fn field_rule() -> FieldContract {
        use shc_contracts::{ConflictPolicy, EvidencePolicy, FieldType, NumericRange, Priority, PublishGate, Shape};
        FieldContract {
            field_key: "weight".to_string(),
            contract: FieldType::Number { unit: Some("g".to_string()), range: Some(NumericRange { min: 0.0, max: 200.0 }) },
            shape: Shape::Scalar,
            priority: Priority {
                required_level: RequiredLevel::Required,
                availability: 1.0,
                difficulty: 1.0,
                effort: 3,
                block_publish_when_unk: false,
                publish_gate: PublishGate::RequiredComplete,
                publish_gate_reason: None,
            },
            enum_catalog: None,
            parse: Default::default(),
            evidence: EvidencePolicy {
                required: true,
                min_evidence_refs: 2,
                conflict_policy: ConflictPolicy::ResolveByTierElseUnknown,
                tier_preference: vec![1, 2, 3],
            },
            component: None,
            ai_assist: Default::default(),
            cross_validation: vec![],
            anchors: vec![],
            unit_hint: Some("g".to_string()),
        }
    }

    fn need_row(min_refs: u32) -> NeedRow {
        NeedRow {
            field_key: "weight".to_string(),
            need_score: 1.0,
            effective_confidence: 0.2,
            reasons: vec![NeedReason::Missing],
            required_level: RequiredLevel::Required,
            tier_preference: vec![1, 2, 3],
            min_refs,
        }
    }

    #[test]
    fn emits_tier_1_before_tier_2() {
        let pool = vec![
            item(Tier::LabReview, "https://b/1", "sn_b", 5.0, ExtractionMethod::Kv),
            item(Tier::Manufacturer, "https://a/1", "sn_a", 1.0, ExtractionMethod::Kv),
        ];
        let rule = field_rule();
        let identity = IdentityContext::default();
        let row = need_row(1);
        let result = build_tier_aware_field_retrieval(TierAwareFieldRetrievalArgs::<fn(FtsQueryArgs<'_>) -> Vec<EvidencePoolItem>> {
            field_key: "weight",
            need_row: &row,
            field_rule: &rule,
            evidence_pool: &pool,
            identity: &identity,
            max_hits: 10,
            fts_query_fn: None,
        });
        assert_eq!(result.hits[0].url, "https://a/1");
    }

    #[test]
    fn deduplicates_by_url_and_snippet_id() {
        let pool = vec![
            item(Tier::Manufacturer, "https://a/1", "sn_a", 1.0, ExtractionMethod::Kv),
            item(Tier::Manufacturer, "https://a/1", "sn_a", 9.0, ExtractionMethod::Kv),
        ];
        let rule = field_rule();
        let identity = IdentityContext::default();
        let row = need_row(1);
        let result = build_tier_aware_field_retrieval(TierAwareFieldRetrievalArgs::<fn(FtsQueryArgs<'_>) -> Vec<EvidencePoolItem>> {
            field_key: "weight",
            need_row: &row,
            field_rule: &rule,
            evidence_pool: &pool,
            identity: &identity,
            max_hits: 10,
            fts_query_fn: None,
        });
        assert_eq!(result.hits.len(), 1);
    }

    #[test]
    fn reports_shortfall_without_synthesizing_hits() {
        let pool = vec![item(Tier::Manufacturer, "https://a/1", "sn_a", 1.0, ExtractionMethod::Kv)];
        let rule = field_rule();
        let identity = IdentityContext::default();
        let row = need_row(2);
        let result = build_tier_aware_field_retrieval(TierAwareFieldRetrievalArgs::<fn(FtsQueryArgs<'_>) -> Vec<EvidencePoolItem>> {
            field_key: "weight",
            need_row: &row,
            field_rule: &rule,
            evidence_pool: &pool,
            identity: &identity,
            max_hits: 10,
            fts_query_fn: None,
        });
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.debug.min_refs_shortfall, Some(1));
    }

    #[test]
    fn fts_query_fn_result_takes_precedence_when_nonempty() {
        let pool = vec![item(Tier::Manufacturer, "https://a/1", "sn_a", 1.0, ExtractionMethod::Kv)];
        let rule = field_rule();
        let identity = IdentityContext::default();
        let row = need_row(1);
        let fts_item = item(Tier::LabReview, "https://fts/1", "sn_fts", 3.0, ExtractionMethod::Kv);
        let result = build_tier_aware_field_retrieval(TierAwareFieldRetrievalArgs {
            field_key: "weight",
            need_row: &row,
            field_rule: &rule,
            evidence_pool: &pool,
            identity: &identity,
            max_hits: 10,
            fts_query_fn: Some(|_: FtsQueryArgs<'_>| vec![fts_item.clone()]),
        });
        assert!(result.debug.used_fts);
        assert_eq!(result.hits[0].url, "https://fts/1");
    }
}
