//! Facade wiring (§2 "Data flow per product"): composes the Identity Gate,
//! NeedSet Planner, Runtime Validation Gate, and publish-gate policy into
//! one round, and writes the published artifacts (§6). Discovery, fetch,
//! and reasoning are collaborator calls the composition root makes before
//! invoking `finish_round` — those surfaces are explicitly out of scope
//! for the core (§1 "Explicitly out of scope").

use std::collections::HashMap;

use tracing::{info, info_span};

use shc_contracts::FieldProvenance;
use shc_field_rules::FieldRulesEngine;
use shc_identity_gate::{evaluate_identity_gate, IdentityGateResult, IdentitySource};
use shc_runtime_gate::{apply_runtime_field_rules, check_publish_blockers, evaluate_publish_gate, ApplyRuntimeFieldRulesArgs, CrossValidationFn, EvidencePack, GateResult, PublishBlocker, PublishGateArgs};
use shc_scheduler::{RoundOutcome, UnknownReason};

use crate::artifacts::{
    candidate_rows_from_pool, write_candidates, write_current, write_normalized, write_provenance,
    write_summary, CandidatesArtifact, NormalizedArtifact, ProvenanceArtifact,
    RuntimeEngineSummary, SummaryArtifact,
};
use crate::collaborators::{Storage, StorageError};

/// Everything gathered during the externally-driven parts of a round
/// (discovery, fetch, retrieval) that `finish_round` needs to run the
/// gate and identity stages. The caller assembles this from the Storage,
/// Fetch and Reasoning collaborators plus `shc-tier-retriever`'s per-field
/// hits (§4.C); `shc-core` never calls those collaborators directly.
pub struct RoundInputs<'a> {
    pub engine: &'a FieldRulesEngine,
    pub field_order: &'a [String],
    pub proposed_fields: HashMap<String, String>,
    /// Per-field evidence hits from the retriever (§4.C), keyed implicitly
    /// by each item's `field_key`; `finish_round` derives both the input
    /// provenance the gate validates against and the evidence pack the
    /// evidence-audit stage checks snippet quotes against.
    pub evidence_pool: Vec<shc_contracts::EvidencePoolItem>,
    pub identity_sources: Vec<IdentitySource>,
    pub enforce_evidence: bool,
    pub cross_validation_rules: &'a HashMap<String, Box<CrossValidationFn>>,
}

pub struct FinishedRound {
    pub gate_result: GateResult,
    pub identity: IdentityGateResult,
    pub publish_blockers: Vec<PublishBlocker>,
    pub block_publish_blockers: Vec<PublishBlocker>,
    pub outcome: RoundOutcome,
}

/// Runs the synchronous portion of a round (§4.D, §4.I) given externally
/// gathered inputs, producing the `RoundOutcome` the convergence scheduler
/// consumes plus the full gate/identity detail the caller uses to write
/// published artifacts.
pub fn finish_round(inputs: RoundInputs<'_>, publish_gate: shc_contracts::PublishGate) -> FinishedRound {
    let span = info_span!("finish_round");
    let _enter = span.enter();

    let identity = evaluate_identity_gate(&inputs.identity_sources);

    let input_provenance = provenance_from_pool(&inputs.proposed_fields, &inputs.evidence_pool);
    let evidence_pack = evidence_pack_from_pool(&inputs.evidence_pool);

    let gate_result = apply_runtime_field_rules(ApplyRuntimeFieldRulesArgs {
        engine: inputs.engine,
        fields: inputs.proposed_fields,
        provenance: input_provenance,
        field_order: inputs.field_order,
        enforce_evidence: inputs.enforce_evidence,
        respect_per_field_evidence: true,
        evidence_pack: &evidence_pack,
        cross_validation_rules: inputs.cross_validation_rules,
    });

    // The gate only ever rewrites rejected fields to `"unk"`; provenance
    // for fields it left untouched is whatever the retriever fed in.
    let provenance = provenance_from_pool(&gate_result.fields, &inputs.evidence_pool);

    let publish_blockers = evaluate_publish_gate(PublishGateArgs {
        gate: publish_gate,
        engine: inputs.engine,
        fields: &gate_result.fields,
        field_order: inputs.field_order,
        provenance: &provenance,
        failures: &gate_result.failures,
        curation_suggestions_count: gate_result.curation_suggestions.len(),
    });
    let block_publish_blockers = check_publish_blockers(inputs.engine, &gate_result.fields, inputs.field_order);

    let missing_required_fields = missing_at_levels(
        inputs.engine,
        inputs.field_order,
        &gate_result.fields,
        &[shc_contracts::RequiredLevel::Required, shc_contracts::RequiredLevel::Identity],
    );
    let missing_critical_fields = missing_at_levels(
        inputs.engine,
        inputs.field_order,
        &gate_result.fields,
        &[shc_contracts::RequiredLevel::Critical],
    );
    let missing_expected_fields = missing_at_levels(
        inputs.engine,
        inputs.field_order,
        &gate_result.fields,
        &[shc_contracts::RequiredLevel::Expected],
    );

    let validated = publish_blockers.is_empty()
        && block_publish_blockers.is_empty()
        && missing_required_fields.is_empty()
        && missing_critical_fields.is_empty();

    let confidence = average_confidence(&provenance);
    let best_evidence_tier = best_tier_per_field(&inputs.evidence_pool);

    let mut unknown_reasons = HashMap::new();
    for field in missing_required_fields.iter().chain(missing_expected_fields.iter()) {
        unknown_reasons
            .entry(field.clone())
            .or_insert(UnknownReason::NotFoundAfterSearch);
    }

    let outcome = RoundOutcome {
        validated,
        confidence,
        missing_required_fields,
        missing_expected_fields,
        missing_critical_fields,
        contradiction_count: 0,
        new_urls_found: 0,
        new_fields_found: gate_result.fields.values().filter(|v| v.as_str() != shc_contracts::UNK).count() as u32,
        unknown_reasons,
        identity_stuck: !identity.validated && identity.accepted_source_count == 0,
        provenance,
        best_evidence_tier,
        conflicting_fields: Vec::new(),
        queries_issued: Vec::new(),
    };

    info!(validated, confidence, "round finished");

    FinishedRound { gate_result, identity, publish_blockers, block_publish_blockers, outcome }
}

/// Builds the per-field `FieldProvenance` the gate's evidence-audit stage
/// (§4.D stage 5) reads, from the retriever's flat evidence pool (§4.C).
/// `fields` supplies each field's current value; a field absent from
/// `fields` or still `"unk"` gets the zero-confidence provenance stub.
fn provenance_from_pool(
    fields: &HashMap<String, String>,
    pool: &[shc_contracts::EvidencePoolItem],
) -> HashMap<String, FieldProvenance> {
    let mut provenance = HashMap::new();
    for (field, value) in fields {
        let mut prov = FieldProvenance::unk();
        prov.value = value.clone();
        prov.pass_target = 0.5;
        prov.evidence = pool
            .iter()
            .filter(|item| &item.field_key == field)
            .map(|item| shc_contracts::ProvenanceEvidenceRow {
                url: item.url.clone(),
                snippet_id: item.snippet_id.clone(),
                snippet_hash: item.snippet_hash.clone(),
                quote: item.quote.clone(),
                quote_span: None,
                source_id: item.snippet_id.clone(),
                retrieved_at: String::new(),
                extraction_method: format!("{:?}", item.extraction_method),
            })
            .collect();
        let best_score = pool
            .iter()
            .filter(|item| &item.field_key == field)
            .map(|item| item.score)
            .fold(0.0_f64, f64::max);
        prov.confidence = if value.as_str() == shc_contracts::UNK { 0.0 } else { best_score.clamp(0.0, 1.0).max(0.5) };
        prov.meets_pass_target = prov.confidence >= prov.pass_target;
        provenance.insert(field.clone(), prov);
    }
    provenance
}

/// Builds the evidence pack an `enforceEvidence` pass checks snippet
/// quotes against (§4.D stage 5), keyed by `snippet_id`.
fn evidence_pack_from_pool(pool: &[shc_contracts::EvidencePoolItem]) -> EvidencePack {
    let mut pack = EvidencePack::default();
    for item in pool {
        pack.snippets.insert(item.snippet_id.clone(), item.quote.clone());
    }
    pack
}

fn missing_at_levels(
    engine: &FieldRulesEngine,
    field_order: &[String],
    fields: &HashMap<String, String>,
    levels: &[shc_contracts::RequiredLevel],
) -> Vec<String> {
    field_order
        .iter()
        .filter(|f| {
            engine
                .get_field_rule(f)
                .map(|rule| levels.contains(&rule.priority.required_level))
                .unwrap_or(false)
        })
        .filter(|f| fields.get(*f).map(String::as_str).unwrap_or(shc_contracts::UNK) == shc_contracts::UNK)
        .cloned()
        .collect()
}

fn average_confidence(provenance: &HashMap<String, FieldProvenance>) -> f64 {
    if provenance.is_empty() {
        return 0.0;
    }
    let sum: f64 = provenance.values().map(|p| p.confidence).sum();
    sum / provenance.len() as f64
}

fn best_tier_per_field(pool: &[shc_contracts::EvidencePoolItem]) -> HashMap<String, u8> {
    let mut best: HashMap<String, u8> = HashMap::new();
    for item in pool {
        let tier = item.tier as u8;
        best.entry(item.field_key.clone())
            .and_modify(|t| *t = (*t).min(tier))
            .or_insert(tier);
    }
    best
}

/// Publishes the four standing artifacts for the round, and `current.json`
/// only when both blocker lists are empty (§7 "User-visible behaviour").
pub async fn publish_round(
    storage: &dyn Storage,
    finished: &FinishedRound,
    evidence_pool: &[shc_contracts::EvidencePoolItem],
    identity_value: serde_json::Value,
) -> Result<(), StorageError> {
    let normalized = NormalizedArtifact { identity: identity_value, fields: finished.gate_result.fields.clone() };
    write_normalized(storage, &normalized).await?;
    write_provenance(storage, &ProvenanceArtifact { fields: finished.outcome.provenance.clone() }).await?;

    let summary = SummaryArtifact {
        validated: finished.outcome.validated,
        confidence: finished.outcome.confidence,
        coverage_overall: coverage(&finished.gate_result),
        completeness_required: if finished.outcome.missing_required_fields.is_empty() { 1.0 } else { 0.0 },
        missing_required_fields: finished.outcome.missing_required_fields.clone(),
        critical_fields_below_pass_target: finished.outcome.missing_critical_fields.clone(),
        field_reasoning: serde_json::json!({}),
        runtime_engine: RuntimeEngineSummary {
            failures: finished.gate_result.failures.clone(),
            curation_suggestions_count: finished.gate_result.curation_suggestions.len(),
        },
        constraint_analysis: serde_json::json!({}),
    };
    write_summary(storage, &summary).await?;

    write_candidates(storage, &candidates_from_pool(evidence_pool)).await?;

    if finished.publish_blockers.is_empty() && finished.block_publish_blockers.is_empty() {
        write_current(storage, &normalized).await?;
    }
    Ok(())
}

fn candidates_from_pool(pool: &[shc_contracts::EvidencePoolItem]) -> CandidatesArtifact {
    let mut by_field: HashMap<String, Vec<shc_contracts::EvidencePoolItem>> = HashMap::new();
    for item in pool {
        by_field.entry(item.field_key.clone()).or_default().push(item.clone());
    }
    let mut artifact = CandidatesArtifact::default();
    for (field, items) in by_field {
        artifact.fields.insert(field, candidate_rows_from_pool(&items));
    }
    artifact
}

fn coverage(gate: &GateResult) -> f64 {
    if gate.fields.is_empty() {
        return 0.0;
    }
    let resolved = gate.fields.values().filter(|v| v.as_str() != shc_contracts::UNK).count();
    resolved as f64 / gate.fields.len() as f64
}
