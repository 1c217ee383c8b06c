//! `runConvergenceLoop` (§4.G): the outer multi-round control loop.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::{debug, info, info_span, Instrument};

use shc_contracts::RequiredLevel;
use shc_field_rules::FieldRulesEngine;
use shc_needset::{compute_need_set, ComputeNeedSetArgs, IdentityContext, NeedSetWeights};

use crate::config::SchedulerConfig;
use crate::round_config::{build_round_config, BuildRoundConfigArgs};
use crate::stop::{evaluate_stop_conditions, ConvergenceCounters};
use crate::types::{
    ConvergenceResult, Mode, Progress, QueryPlan, RoundContext, RoundOutcome, RoundRecord,
};

/// A product's actual extraction pipeline, invoked once per round. The
/// scheduler awaits this call as its only suspension point per round
/// (§5 "Suspension points").
#[async_trait]
pub trait ProductRunner: Send {
    async fn run_round(&mut self, ctx: &RoundContext) -> RoundOutcome;
}

pub struct RunConvergenceLoopArgs<'a> {
    pub engine: &'a FieldRulesEngine,
    pub identity: &'a IdentityContext,
    pub config: SchedulerConfig,
    pub mode: Mode,
}

fn progress_from_outcome(outcome: &RoundOutcome) -> Progress {
    Progress {
        missing_required_count: outcome.missing_required_fields.len() as u32,
        critical_count: outcome.missing_critical_fields.len() as u32,
        contradiction_count: outcome.contradiction_count,
        confidence: outcome.confidence,
        validated: outcome.validated,
    }
}

/// Sum of `priority.effort` across currently-missing fields, the
/// `contractEffort` term `buildRoundConfig` uses to raise deep-search
/// budgets (§4.G).
fn contract_effort(engine: &FieldRulesEngine, missing_fields: &[String]) -> u32 {
    missing_fields
        .iter()
        .filter_map(|f| engine.get_field_rule(f))
        .map(|rule| rule.priority.effort as u32)
        .sum()
}

/// Builds the next round's dispatch plan from a freshly computed NeedSet
/// (§4.G "For rounds > 0"): `llmTargetFields` for identity/critical/required
/// fields still needy, `extraQueries` for tier-deficit fields capped at
/// `convergenceMaxDispatchQueries`, and `escalatedFields` for fields whose
/// required level is identity or critical.
fn dispatch_from_need_set(
    needs: &[shc_contracts::NeedRow],
    already_issued: &HashSet<String>,
    max_dispatch_queries: u32,
) -> RoundContext {
    let llm_target_fields: Vec<String> = needs.iter().map(|n| n.field_key.clone()).collect();

    let escalated_fields: Vec<String> = needs
        .iter()
        .filter(|n| matches!(n.required_level, RequiredLevel::Identity | RequiredLevel::Critical))
        .map(|n| n.field_key.clone())
        .collect();

    let mut extra_queries = Vec::new();
    for need in needs {
        if extra_queries.len() as u32 >= max_dispatch_queries {
            break;
        }
        let query = format!("{} specification", need.field_key);
        if already_issued.contains(&query) {
            continue;
        }
        extra_queries.push(QueryPlan { query, target_fields: vec![need.field_key.clone()] });
    }

    RoundContext {
        round: 0, // overwritten by caller
        mode: String::new(),
        llm_target_fields,
        extra_queries,
        escalated_fields,
    }
}

/// `runConvergenceLoop` (§4.G).
pub async fn run_convergence_loop<R: ProductRunner>(
    runner: &mut R,
    args: RunConvergenceLoopArgs<'_>,
) -> ConvergenceResult {
    let mut rounds = Vec::new();
    let mut counters = ConvergenceCounters::default();
    let mut previous_progress: Option<Progress> = None;
    let mut previous_validated = false;
    let mut required_search_iteration = 0u32;
    let mut issued_queries: HashSet<String> = HashSet::new();
    let mut last_outcome: Option<RoundOutcome> = None;
    let mut round_count = 0u32;
    let mut stop_reason = None;

    let mut next_ctx = RoundContext {
        round: 0,
        mode: args.mode.clone(),
        llm_target_fields: Vec::new(),
        extra_queries: Vec::new(),
        escalated_fields: Vec::new(),
    };

    loop {
        let round = round_count;
        next_ctx.round = round;
        next_ctx.mode = args.mode.clone();

        let missing_required_count = last_outcome
            .as_ref()
            .map(|o| o.missing_required_fields.len() as u32)
            .unwrap_or(0);
        let missing_expected_count = last_outcome
            .as_ref()
            .map(|o| o.missing_expected_fields.len() as u32)
            .unwrap_or(0);
        let missing_critical_count = last_outcome
            .as_ref()
            .map(|o| o.missing_critical_fields.len() as u32)
            .unwrap_or(0);
        let effort = last_outcome
            .as_ref()
            .map(|o| contract_effort(args.engine, &o.missing_required_fields))
            .unwrap_or(0);

        let round_config = build_round_config(
            &args.config,
            &BuildRoundConfigArgs {
                round,
                missing_required_count,
                missing_expected_count,
                missing_critical_count,
                previous_validated,
                required_search_iteration,
                contract_effort: effort,
            },
        );
        debug!(round, profile = ?round_config.profile, "round config built");

        let span = info_span!("product_round", round);
        let outcome = runner.run_round(&next_ctx).instrument(span).await;

        for q in &outcome.queries_issued {
            issued_queries.insert(q.clone());
        }
        if missing_required_count > 0 {
            required_search_iteration += 1;
        }

        let progress = progress_from_outcome(&outcome);
        let improved = previous_progress
            .as_ref()
            .map(|prev| progress.improved_over(prev))
            .unwrap_or(true);

        counters.record_round(&outcome, &progress, improved, &args.config, required_search_iteration);
        let stop = evaluate_stop_conditions(&progress, round + 1, &args.config, &counters);

        rounds.push(RoundRecord { round, progress: progress.clone(), improved });
        round_count += 1;
        previous_validated = progress.validated;
        previous_progress = Some(progress.clone());

        info!(round, validated = progress.validated, stop_reason = ?stop, "convergence round completed");

        if let Some(reason) = stop {
            stop_reason = Some(reason);
            last_outcome = Some(outcome);
            break;
        }

        // Build next round's dispatch from a fresh NeedSet over this
        // round's provenance (§4.G "For rounds > 0").
        let conflicting: HashSet<String> = outcome.conflicting_fields.iter().cloned().collect();
        let needs = compute_need_set(ComputeNeedSetArgs {
            field_order: args.engine.get_field_order(),
            provenance: &outcome.provenance,
            engine: args.engine,
            identity: args.identity,
            identity_caps: None,
            best_evidence_tier: &outcome.best_evidence_tier,
            conflicting_fields: &conflicting,
            weights: NeedSetWeights::default(),
        });
        next_ctx = dispatch_from_need_set(&needs, &issued_queries, args.config.convergence_max_dispatch_queries);
        last_outcome = Some(outcome);
    }

    let complete = stop_reason == Some(crate::types::StopReason::Complete);
    ConvergenceResult { rounds, final_outcome: last_outcome, round_count, complete, stop_reason }
}

/// Summarizes the NeedSet-driven dispatch a round about to run would use,
/// without advancing the loop — useful for a caller (e.g. a CLI) that
/// wants to preview a round's plan.
pub fn preview_dispatch(
    engine: &FieldRulesEngine,
    identity: &IdentityContext,
    provenance: &HashMap<String, shc_contracts::FieldProvenance>,
    best_evidence_tier: &HashMap<String, u8>,
    max_dispatch_queries: u32,
) -> RoundContext {
    let needs = compute_need_set(ComputeNeedSetArgs {
        field_order: engine.get_field_order(),
        provenance,
        engine,
        identity,
        identity_caps: None,
        best_evidence_tier,
        conflicting_fields: &HashSet::new(),
        weights: NeedSetWeights::default(),
    });
    dispatch_from_need_set(&needs, &HashSet::new(), max_dispatch_queries)
}
