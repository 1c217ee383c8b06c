//! Publish gate policy (§4.D stage 6): a categorical decision over the
//! gate's output fields, plus `checkPublishBlockers` (§3, §8).

use std::collections::HashMap;

use shc_contracts::{is_unknown_token, FieldProvenance, PublishGate, RequiredLevel};
use shc_field_rules::FieldRulesEngine;

use crate::types::{FailureRow, PublishBlocker};

pub struct PublishGateArgs<'a> {
    pub gate: PublishGate,
    pub engine: &'a FieldRulesEngine,
    pub fields: &'a HashMap<String, String>,
    pub field_order: &'a [String],
    pub provenance: &'a HashMap<String, FieldProvenance>,
    pub failures: &'a [FailureRow],
    pub curation_suggestions_count: usize,
}

/// `evaluatePublishGate` (§4.D stage 6). Returns the list of blockers; an
/// empty list means the run may publish `current.json`.
pub fn evaluate_publish_gate(args: PublishGateArgs<'_>) -> Vec<PublishBlocker> {
    let mut blockers = Vec::new();
    match args.gate {
        PublishGate::None => {}
        PublishGate::IdentityComplete => {
            blockers.extend(required_level_blockers(&args, &[RequiredLevel::Identity]));
        }
        PublishGate::RequiredComplete => {
            blockers.extend(required_level_blockers(
                &args,
                &[RequiredLevel::Identity, RequiredLevel::Required, RequiredLevel::Critical],
            ));
        }
        PublishGate::EvidenceComplete => {
            for field in args.field_order {
                let Some(rule) = args.engine.get_field_rule(field) else { continue };
                if !rule.evidence.required {
                    continue;
                }
                let value = args.fields.get(field).map(String::as_str).unwrap_or("unk");
                if is_unknown_token(value) {
                    continue;
                }
                let has_evidence = args
                    .provenance
                    .get(field)
                    .map(|p| p.evidence.iter().any(|e| e.is_well_formed()))
                    .unwrap_or(false);
                if !has_evidence {
                    blockers.push(PublishBlocker {
                        field: field.clone(),
                        gate_check: "evidence_complete".to_string(),
                        reason: "evidence_missing".to_string(),
                    });
                }
            }
        }
        PublishGate::AllValidationsPass => {
            if !args.failures.is_empty() {
                blockers.push(PublishBlocker {
                    field: "*".to_string(),
                    gate_check: "all_validations_pass".to_string(),
                    reason: "runtime_gate_failures_present".to_string(),
                });
            }
        }
        PublishGate::Strict => {
            if !args.failures.is_empty() || args.curation_suggestions_count > 0 {
                blockers.push(PublishBlocker {
                    field: "*".to_string(),
                    gate_check: "strict".to_string(),
                    reason: "failures_or_warnings_present".to_string(),
                });
            }
        }
    }
    blockers
}

fn required_level_blockers(args: &PublishGateArgs<'_>, levels: &[RequiredLevel]) -> Vec<PublishBlocker> {
    let mut blockers = Vec::new();
    for field in args.field_order {
        let Some(rule) = args.engine.get_field_rule(field) else { continue };
        if !levels.contains(&rule.priority.required_level) {
            continue;
        }
        let value = args.fields.get(field).map(String::as_str).unwrap_or("unk");
        if is_unknown_token(value) {
            let gate_check = match rule.priority.required_level {
                RequiredLevel::Identity => "identity_complete",
                _ => "required_complete",
            };
            blockers.push(PublishBlocker {
                field: field.clone(),
                gate_check: gate_check.to_string(),
                reason: "field_unresolved".to_string(),
            });
        }
    }
    blockers
}

/// `checkPublishBlockers` (§3, §8): independent of the categorical gate,
/// scans for fields whose `priority.block_publish_when_unk` is set and
/// whose resolved value matches any unknown-token spelling.
pub fn check_publish_blockers(
    engine: &FieldRulesEngine,
    fields: &HashMap<String, String>,
    field_order: &[String],
) -> Vec<PublishBlocker> {
    let mut blockers = Vec::new();
    for field in field_order {
        let Some(rule) = engine.get_field_rule(field) else { continue };
        if !rule.priority.block_publish_when_unk {
            continue;
        }
        let value = fields.get(field).map(String::as_str).unwrap_or("unk");
        if is_unknown_token(value) {
            blockers.push(PublishBlocker {
                field: field.clone(),
                gate_check: "block_publish_when_unk".to_string(),
                reason: rule
                    .priority
                    .publish_gate_reason
                    .clone()
                    .unwrap_or_else(|| "publish_blocked".to_string()),
            });
        }
    }
    blockers
}

#[cfg(test)]
mod tests {
    use super::*;
    use shc_contracts::{
        ConflictPolicy, EvidencePolicy, FieldContract, FieldType,
        NumericRange, Priority, PublishGate as PG, Shape,
    };
    use shc_field_rules::{ContractBundle, ContractBundleSource};
    use std::collections::HashMap as Map;

    fn dpi_rule(block_publish: bool) -> FieldContract {
        FieldContract {
            field_key: "dpi".to_string(),
            contract: FieldType::Integer { range: Some(NumericRange { min: 0.0, max: 30000.0 }) },
            shape: Shape::Scalar,
            priority: Priority {
                required_level: RequiredLevel::Required,
                availability: 1.0,
                difficulty: 1.0,
                effort: 2,
                block_publish_when_unk: block_publish,
                publish_gate: PG::RequiredComplete,
                publish_gate_reason: Some("dpi is load-bearing for comparison tables".to_string()),
            },
            enum_catalog: None,
            parse: Default::default(),
            evidence: EvidencePolicy {
                required: true,
                min_evidence_refs: 1,
                conflict_policy: ConflictPolicy::ResolveByTierElseUnknown,
                tier_preference: vec![],
            },
            component: None,
            ai_assist: Default::default(),
            cross_validation: vec![],
            anchors: vec![],
            unit_hint: None,
        }
    }

    fn engine_with(rule: FieldContract) -> FieldRulesEngine {
        let mut fields = Map::new();
        fields.insert("dpi".to_string(), rule);
        let bundle = ContractBundle::from(ContractBundleSource {
            category: "mouse".to_string(),
            field_order: vec!["dpi".to_string()],
            fields,
            catalogs: Map::new(),
            components: Map::new(),
        });
        FieldRulesEngine::new(bundle)
    }

    #[test]
    fn evidence_complete_blocks_when_provenance_empty() {
        let engine = engine_with(dpi_rule(false));
        let mut fields = Map::new();
        fields.insert("dpi".to_string(), "26000".to_string());
        let blockers = evaluate_publish_gate(PublishGateArgs {
            gate: PublishGate::EvidenceComplete,
            engine: &engine,
            fields: &fields,
            field_order: &["dpi".to_string()],
            provenance: &Map::new(),
            failures: &[],
            curation_suggestions_count: 0,
        });
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0].field, "dpi");
        assert_eq!(blockers[0].gate_check, "evidence_complete");
        assert_eq!(blockers[0].reason, "evidence_missing");
    }

    #[test]
    fn block_publish_when_unk_reports_authored_reason() {
        let engine = engine_with(dpi_rule(true));
        let mut fields = Map::new();
        fields.insert("dpi".to_string(), "unk".to_string());
        let blockers = check_publish_blockers(&engine, &fields, &["dpi".to_string()]);
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0].reason, "dpi is load-bearing for comparison tables");
    }

    #[test]
    fn none_gate_never_blocks() {
        let engine = engine_with(dpi_rule(false));
        let mut fields = Map::new();
        fields.insert("dpi".to_string(), "unk".to_string());
        let blockers = evaluate_publish_gate(PublishGateArgs {
            gate: PublishGate::None,
            engine: &engine,
            fields: &fields,
            field_order: &["dpi".to_string()],
            provenance: &Map::new(),
            failures: &[],
            curation_suggestions_count: 0,
        });
        assert!(blockers.is_empty());
    }
}
