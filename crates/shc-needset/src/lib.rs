//! NeedSet Planner (§4.E): computes per-field need scores from the current
//! state of knowledge and the field contract, driving the scheduler and the
//! retrieval layer.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use shc_contracts::{FieldProvenance, NeedReason, NeedRow};
use shc_field_rules::FieldRulesEngine;

/// Identity certainty bucket, mirrored from the Identity Gate's output
/// (§4.I) and used here only to cap a field's effective confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityStatus {
    Locked,
    Provisional,
    Ambiguous,
    Contradicted,
}

impl IdentityStatus {
    /// Default cap per status (§4.E).
    pub fn default_cap(self) -> f64 {
        match self {
            IdentityStatus::Locked => 1.0,
            IdentityStatus::Provisional => 0.74,
            IdentityStatus::Ambiguous => 0.50,
            IdentityStatus::Contradicted => 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdentityContext {
    pub status: IdentityStatus,
}

/// The weighted-sum coefficients for `need_score` (§4.E). Exact values are
/// an implementation detail (§8 Open Questions); only the ordering
/// properties are contractual.
#[derive(Debug, Clone, Copy)]
pub struct NeedSetWeights {
    pub w_required_level: f64,
    pub w_missing: f64,
    pub w_low_conf: f64,
    pub w_conflict: f64,
    pub w_tier: f64,
}

impl Default for NeedSetWeights {
    fn default() -> Self {
        NeedSetWeights {
            w_required_level: 1.0,
            w_missing: 2.0,
            w_low_conf: 1.0,
            w_conflict: 1.5,
            w_tier: 0.5,
        }
    }
}

pub struct ComputeNeedSetArgs<'a> {
    pub field_order: &'a [String],
    pub provenance: &'a HashMap<String, FieldProvenance>,
    pub engine: &'a FieldRulesEngine,
    pub identity: &'a IdentityContext,
    /// Overrides `IdentityStatus::default_cap` when present for a status.
    pub identity_caps: Option<&'a HashMap<IdentityStatus, f64>>,
    /// Best evidence tier (1=manufacturer..4=other) observed so far per
    /// field; absent means no evidence has been seen yet.
    pub best_evidence_tier: &'a HashMap<String, u8>,
    /// Fields whose provenance currently references two non-equal values.
    pub conflicting_fields: &'a HashSet<String>,
    pub weights: NeedSetWeights,
}

fn effective_confidence(raw: f64, identity: &IdentityContext, caps: Option<&HashMap<IdentityStatus, f64>>) -> f64 {
    let cap = caps
        .and_then(|c| c.get(&identity.status).copied())
        .unwrap_or_else(|| identity.status.default_cap());
    raw.min(cap)
}

/// `computeNeedSet` (§4.E). Rows with zero reasons are omitted; the
/// remaining rows are sorted by `need_score` descending.
pub fn compute_need_set(args: ComputeNeedSetArgs<'_>) -> Vec<NeedRow> {
    let mut rows = Vec::new();

    for field in args.field_order {
        let Some(rule) = args.engine.get_field_rule(field) else { continue };
        let prov = args.provenance.get(field);
        let raw_confidence = prov.map(|p| p.confidence).unwrap_or(0.0);
        let pass_target = prov.map(|p| p.pass_target).unwrap_or(rule.priority.availability.max(0.5));
        let value_is_unk = prov.map(|p| p.value == shc_contracts::UNK).unwrap_or(true);

        let eff_conf = effective_confidence(raw_confidence, args.identity, args.identity_caps);

        let mut reasons = Vec::new();
        if value_is_unk {
            reasons.push(NeedReason::Missing);
        }
        if eff_conf < pass_target {
            reasons.push(NeedReason::LowConf);
        }

        let preferred_tiers = rule.evidence.tier_preference_or_default();
        let best_preferred = preferred_tiers.iter().min().copied().unwrap_or(1);
        let best_tier = args.best_evidence_tier.get(field).copied();
        let tier_gap = match best_tier {
            Some(tier) if tier > best_preferred => (tier - best_preferred) as f64,
            _ => 0.0,
        };
        if tier_gap > 0.0 {
            reasons.push(NeedReason::TierPrefUnmet);
        }

        let has_conflict = args.conflicting_fields.contains(field);
        if has_conflict {
            reasons.push(NeedReason::Conflict);
        }

        if reasons.is_empty() {
            continue;
        }

        let missing = if value_is_unk { 1.0 } else { 0.0 };
        let deficit = (pass_target - eff_conf).max(0.0);
        let conflict_term = if has_conflict { 1.0 } else { 0.0 };

        let need_score = args.weights.w_required_level * rule.priority.required_level.level_weight()
            + args.weights.w_missing * missing
            + args.weights.w_low_conf * deficit
            + args.weights.w_conflict * conflict_term
            + args.weights.w_tier * tier_gap;

        rows.push(NeedRow {
            field_key: field.clone(),
            need_score,
            effective_confidence: eff_conf,
            reasons,
            required_level: rule.priority.required_level,
            tier_preference: preferred_tiers,
            min_refs: rule.evidence.min_evidence_refs,
        });
    }

    rows.sort_by(|a, b| b.need_score.partial_cmp(&a.need_score).unwrap_or(std::cmp::Ordering::Equal));
    debug!(rows = rows.len(), "needset computed");
    rows
}
