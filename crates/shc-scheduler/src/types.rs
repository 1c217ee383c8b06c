//! Round-boundary data shapes (§4.G).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shc_contracts::FieldProvenance;

/// Bandit/search mode carried through the round, reusing `shc-bandit`'s
/// vocabulary (kept as a string here to avoid a dependency cycle; callers
/// that also use `shc-bandit` pass `BanditMode::Balanced.to_string()`-style
/// values or their own mode names).
pub type Mode = String;

/// `roundContext` (§4.G): passed to `runProductFn` at the top of a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundContext {
    pub round: u32,
    pub mode: Mode,
    pub llm_target_fields: Vec<String>,
    pub extra_queries: Vec<QueryPlan>,
    pub escalated_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPlan {
    pub query: String,
    /// Tier-deficit fields this query targets (§4.G dispatch).
    pub target_fields: Vec<String>,
}

/// What a product runner reports back after one round. This is the core's
/// abstraction over whatever the real pipeline (discovery, fetch, parse,
/// gate) actually did; the scheduler only consumes the summary shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub validated: bool,
    pub confidence: f64,
    pub missing_required_fields: Vec<String>,
    pub missing_expected_fields: Vec<String>,
    pub missing_critical_fields: Vec<String>,
    pub contradiction_count: u32,
    pub new_urls_found: u32,
    pub new_fields_found: u32,
    /// Per-field classification when a field stayed `unk`, used by
    /// `shouldForceExpectedFieldRetry` (§4.G). Absent entries are treated
    /// as a reason that does *not* force a retry.
    pub unknown_reasons: HashMap<String, UnknownReason>,
    pub identity_stuck: bool,
    pub provenance: HashMap<String, FieldProvenance>,
    /// Best evidence tier observed so far per field, fed into the next
    /// round's NeedSet computation (§4.E `tier_pref_unmet`).
    pub best_evidence_tier: HashMap<String, u8>,
    /// Fields whose provenance currently references two non-equal values
    /// (§4.E `conflict` reason).
    pub conflicting_fields: Vec<String>,
    pub queries_issued: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    NotFoundAfterSearch,
    BudgetExhausted,
    IdentityBlocked,
    ParseError,
}

/// `progress` computed after a round (§4.G).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Progress {
    pub missing_required_count: u32,
    pub critical_count: u32,
    pub contradiction_count: u32,
    pub confidence: f64,
    pub validated: bool,
}

impl Progress {
    /// `improved` (§4.G): strictly favourable on at least one axis and no
    /// worse on the others.
    pub fn improved_over(&self, previous: &Progress) -> bool {
        let no_worse = self.missing_required_count <= previous.missing_required_count
            && self.critical_count <= previous.critical_count
            && self.contradiction_count <= previous.contradiction_count
            && self.confidence >= previous.confidence;
        let strictly_better = self.missing_required_count < previous.missing_required_count
            || self.critical_count < previous.critical_count
            || self.contradiction_count < previous.contradiction_count
            || self.confidence > previous.confidence;
        no_worse && strictly_better
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Complete,
    MaxRoundsReached,
    RequiredSearchExhaustedNoNewUrlsOrFields,
    NoProgress,
    RepeatedLowQuality,
    IdentityGateStuck,
}

/// One completed round, kept for the caller's event log / debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub progress: Progress,
    pub improved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceResult {
    pub rounds: Vec<RoundRecord>,
    pub final_outcome: Option<RoundOutcome>,
    pub round_count: u32,
    pub complete: bool,
    pub stop_reason: Option<StopReason>,
}
