//! `applyRuntimeFieldRules` (§4.D): the five validation stages run in
//! order over a proposed field map, each able to rewrite a field to
//! `"unk"` and append a failure/change row.

use std::collections::HashMap;

use tracing::debug;

use shc_contracts::{is_unknown_token, EnumPolicy, FieldProvenance, FieldType, UNK};
use shc_field_rules::FieldRulesEngine;

use crate::types::{ChangeRow, CurationSuggestion, EvidencePack, FailureRow, GateResult};

/// A cross-validation rule: given the full proposed field map, returns
/// `true` if the rule passes. Rule bodies are category-authored data the
/// core does not itself interpret (§3 "cross_validation: rule references");
/// callers supply the compiled predicate keyed by `rule_id`.
pub type CrossValidationFn = dyn Fn(&HashMap<String, String>) -> bool + Send + Sync;

pub struct ApplyRuntimeFieldRulesArgs<'a> {
    pub engine: &'a FieldRulesEngine,
    pub fields: HashMap<String, String>,
    pub provenance: HashMap<String, FieldProvenance>,
    pub field_order: &'a [String],
    pub enforce_evidence: bool,
    /// Defaults `true` (§4.D stage 5); global `enforce_evidence` overrides
    /// a per-field opt-out.
    pub respect_per_field_evidence: bool,
    pub evidence_pack: &'a EvidencePack,
    pub cross_validation_rules: &'a HashMap<String, Box<CrossValidationFn>>,
}

pub fn apply_runtime_field_rules(args: ApplyRuntimeFieldRulesArgs<'_>) -> GateResult {
    let ApplyRuntimeFieldRulesArgs {
        engine,
        mut fields,
        provenance,
        field_order,
        enforce_evidence,
        respect_per_field_evidence,
        evidence_pack,
        cross_validation_rules,
    } = args;

    let mut failures = Vec::new();
    let mut changes = Vec::new();
    let mut curation_suggestions = Vec::new();

    // Stage 1 + 2: normalize (type/unit/range) and enum.
    for field in field_order {
        let Some(rule) = engine.get_field_rule(field) else { continue };
        let Some(raw) = fields.get(field).cloned() else { continue };
        if is_unknown_token(&raw) {
            continue;
        }

        let outcome = engine.normalize_candidate(field, &raw);
        let Some(normalized) = outcome.normalized.filter(|_| outcome.ok) else {
            let reason = outcome.reason_code.unwrap_or_else(|| "out_of_range".to_string());
            let stage = if reason == "enum_value_not_allowed" { "enum" } else { "normalize" };
            rewrite_to_unk(&mut fields, &mut changes, &mut failures, field, stage, &reason, &raw);
            continue;
        };
        if normalized != raw {
            changes.push(ChangeRow {
                field: field.clone(),
                stage: "normalize".to_string(),
                before: raw.clone(),
                after: normalized.clone(),
            });
        }
        fields.insert(field.clone(), normalized.clone());

        if let FieldType::Enum { catalog, policy } = &rule.contract {
            if !matches!(policy, EnumPolicy::Closed) {
                if let Some(catalog) = engine.get_enum_catalog(catalog) {
                    if catalog.resolve(&raw).is_none() {
                        curation_suggestions.push(CurationSuggestion {
                            field_key: field.clone(),
                            suggested_value: normalized,
                        });
                    }
                }
            }
        }
    }

    // Stage 3: component inference. A resolved component_ref field whose
    // canonical component has properties matching other field keys seeds
    // those sibling fields, sharing the source's evidence, unless a
    // higher-priority candidate (a non-unk value) already exists there.
    let mut inferred_refs: HashMap<String, Vec<String>> = HashMap::new();
    for field in field_order {
        let Some(rule) = engine.get_field_rule(field) else { continue };
        let FieldType::ComponentRef { db_name } = &rule.contract else { continue };
        let Some(value) = fields.get(field).cloned() else { continue };
        if is_unknown_token(&value) {
            continue;
        }
        let Some(item) = engine.find_component_by_alias(db_name, &value) else {
            rewrite_to_unk(&mut fields, &mut changes, &mut failures, field, "component", "component_not_found", &value);
            continue;
        };
        for (prop_name, prop) in &item.properties {
            if prop_name == field {
                continue;
            }
            if !field_order.contains(prop_name) {
                continue;
            }
            let current = fields.get(prop_name).cloned().unwrap_or_else(|| UNK.to_string());
            if !is_unknown_token(&current) {
                continue;
            }
            let inferred_value = match &prop.value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            changes.push(ChangeRow {
                field: prop_name.clone(),
                stage: "component".to_string(),
                before: current,
                after: inferred_value.clone(),
            });
            fields.insert(prop_name.clone(), inferred_value);
            inferred_refs.insert(prop_name.clone(), vec![field.clone()]);
        }
    }

    // Stage 4: cross-validation, one rule per trigger field.
    for field in field_order {
        let Some(rule) = engine.get_field_rule(field) else { continue };
        for cv in &rule.cross_validation {
            if &cv.trigger_field != field {
                continue;
            }
            let Some(predicate) = cross_validation_rules.get(&cv.rule_id) else { continue };
            if !predicate(&fields) {
                let current = fields.get(field).cloned().unwrap_or_else(|| UNK.to_string());
                rewrite_to_unk(
                    &mut fields,
                    &mut changes,
                    &mut failures,
                    field,
                    "cross_validation",
                    "cross_validation_failed",
                    &current,
                );
            }
        }
    }

    // Stage 5: per-field evidence audit.
    for field in field_order {
        let Some(rule) = engine.get_field_rule(field) else { continue };
        let current = fields.get(field).cloned().unwrap_or_else(|| UNK.to_string());
        if is_unknown_token(&current) {
            continue;
        }
        let should_audit = enforce_evidence
            || (respect_per_field_evidence && (rule.evidence.required || rule.evidence.min_evidence_refs > 0));
        if !should_audit {
            continue;
        }
        let prov = provenance.get(field);
        let rows: &[shc_contracts::ProvenanceEvidenceRow] = prov.map(|p| p.evidence.as_slice()).unwrap_or(&[]);

        let mut well_formed = true;
        for row in rows {
            if !row.is_well_formed() {
                well_formed = false;
                break;
            }
            if enforce_evidence && !evidence_pack.snippets.contains_key(&row.snippet_id) {
                rewrite_to_unk(&mut fields, &mut changes, &mut failures, field, "evidence", "evidence_not_in_pack", &current);
                well_formed = false;
                break;
            }
        }
        if rows.is_empty() {
            rewrite_to_unk(&mut fields, &mut changes, &mut failures, field, "evidence", "evidence_missing", &current);
            continue;
        }
        if !well_formed {
            if !failures.iter().any(|f| f.field == *field && f.stage == "evidence") {
                rewrite_to_unk(&mut fields, &mut changes, &mut failures, field, "evidence", "evidence_missing", &current);
            }
            continue;
        }

        if rule.evidence.min_evidence_refs > 1 {
            let distinct = prov.map(|p| p.distinct_evidence_ref_count()).unwrap_or(0) as u32;
            if distinct < rule.evidence.min_evidence_refs {
                rewrite_to_unk(
                    &mut fields,
                    &mut changes,
                    &mut failures,
                    field,
                    "evidence",
                    "evidence_insufficient_refs",
                    &current,
                );
            }
        }
    }

    debug!(
        failures = failures.len(),
        changes = changes.len(),
        curation_suggestions = curation_suggestions.len(),
        "runtime gate applied"
    );

    GateResult { applied: true, fields, failures, changes, curation_suggestions }
}

fn rewrite_to_unk(
    fields: &mut HashMap<String, String>,
    changes: &mut Vec<ChangeRow>,
    failures: &mut Vec<FailureRow>,
    field: &str,
    stage: &str,
    reason_code: &str,
    before: &str,
) {
    if before == UNK {
        return;
    }
    changes.push(ChangeRow {
        field: field.to_string(),
        stage: stage.to_string(),
        before: before.to_string(),
        after: UNK.to_string(),
    });
    failures.push(FailureRow {
        field: field.to_string(),
        stage: stage.to_string(),
        reason_code: reason_code.to_string(),
        detail: format!("{} rejected value {:?}", stage, before),
    });
    fields.insert(field.to_string(), UNK.to_string());
}
