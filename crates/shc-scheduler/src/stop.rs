//! Stop conditions (§4.G), checked in order. Each condition owns a small
//! streak counter updated once per round; `evaluate` returns the first
//! condition that fires.

use crate::config::SchedulerConfig;
use crate::types::{Progress, RoundOutcome, StopReason};

#[derive(Debug, Clone, Default)]
pub struct ConvergenceCounters {
    /// Consecutive rounds with no new URLs and no new fields while
    /// `missing_required_count > 0` (stop condition 3).
    pub required_search_exhausted_streak: u32,
    /// Consecutive rounds with no `improved` progress (stop condition 4).
    pub no_progress_streak: u32,
    /// Total rounds whose confidence fell below the low-quality threshold
    /// (stop condition 5; not required to be consecutive, per §4.G prose
    /// "rounds with confidence < threshold reached N").
    pub low_quality_rounds: u32,
    /// Consecutive rounds the identity gate reported itself stuck (stop
    /// condition 6).
    pub identity_stuck_rounds: u32,
}

impl ConvergenceCounters {
    /// `required_search_iteration` is the caller's count of rounds so far
    /// that actually ran a required-field search (§4.G `buildRoundConfig`);
    /// it is `0` for the round-0 "fast" profile, which never runs a real
    /// required search and so must not feed condition 3's streak.
    pub fn record_round(
        &mut self,
        outcome: &RoundOutcome,
        progress: &Progress,
        improved: bool,
        config: &SchedulerConfig,
        required_search_iteration: u32,
    ) {
        if required_search_iteration > 0
            && progress.missing_required_count > 0
            && outcome.new_urls_found == 0
            && outcome.new_fields_found == 0
        {
            self.required_search_exhausted_streak += 1;
        } else {
            self.required_search_exhausted_streak = 0;
        }

        if improved {
            self.no_progress_streak = 0;
        } else {
            self.no_progress_streak += 1;
        }

        if progress.confidence < config.convergence_low_quality_confidence {
            self.low_quality_rounds += 1;
        }

        if outcome.identity_stuck {
            self.identity_stuck_rounds += 1;
        } else {
            self.identity_stuck_rounds = 0;
        }
    }
}

/// Checks the six stop conditions (§4.G) in order, given the counters
/// already updated for the round just completed.
pub fn evaluate_stop_conditions(
    progress: &Progress,
    round_count: u32,
    config: &SchedulerConfig,
    counters: &ConvergenceCounters,
) -> Option<StopReason> {
    const REQUIRED_SEARCH_EXHAUSTED_THRESHOLD: u32 = 2;

    if progress.validated {
        return Some(StopReason::Complete);
    }
    if round_count == config.convergence_max_rounds {
        return Some(StopReason::MaxRoundsReached);
    }
    if progress.missing_required_count > 0
        && counters.required_search_exhausted_streak >= REQUIRED_SEARCH_EXHAUSTED_THRESHOLD
    {
        return Some(StopReason::RequiredSearchExhaustedNoNewUrlsOrFields);
    }
    if counters.no_progress_streak >= config.convergence_no_progress_limit {
        return Some(StopReason::NoProgress);
    }
    if counters.low_quality_rounds >= config.convergence_max_low_quality_rounds {
        return Some(StopReason::RepeatedLowQuality);
    }
    if counters.identity_stuck_rounds >= config.convergence_identity_fail_fast_rounds {
        return Some(StopReason::IdentityGateStuck);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn outcome(new_urls: u32, new_fields: u32, identity_stuck: bool) -> RoundOutcome {
        RoundOutcome {
            validated: false,
            confidence: 0.5,
            missing_required_fields: vec!["weight".to_string()],
            missing_expected_fields: vec![],
            missing_critical_fields: vec![],
            contradiction_count: 0,
            new_urls_found: new_urls,
            new_fields_found: new_fields,
            unknown_reasons: HashMap::new(),
            identity_stuck,
            provenance: HashMap::new(),
            best_evidence_tier: HashMap::new(),
            conflicting_fields: vec![],
            queries_issued: vec![],
        }
    }

    fn progress(missing_required: u32, confidence: f64, validated: bool) -> Progress {
        Progress {
            missing_required_count: missing_required,
            critical_count: 0,
            contradiction_count: 0,
            confidence,
            validated,
        }
    }

    #[test]
    fn validated_progress_stops_complete() {
        let config = SchedulerConfig::default();
        let counters = ConvergenceCounters::default();
        let stop = evaluate_stop_conditions(&progress(0, 0.9, true), 1, &config, &counters);
        assert_eq!(stop, Some(StopReason::Complete));
    }

    #[test]
    fn max_rounds_reached_stops() {
        let mut config = SchedulerConfig::default();
        config.convergence_max_rounds = 2;
        let counters = ConvergenceCounters::default();
        let stop = evaluate_stop_conditions(&progress(1, 0.5, false), 2, &config, &counters);
        assert_eq!(stop, Some(StopReason::MaxRoundsReached));
    }

    #[test]
    fn required_search_exhausted_after_two_stale_rounds() {
        let config = SchedulerConfig::default();
        let mut counters = ConvergenceCounters::default();
        counters.record_round(&outcome(0, 0, false), &progress(1, 0.5, false), false, &config, 1);
        counters.record_round(&outcome(0, 0, false), &progress(1, 0.5, false), false, &config, 2);
        let stop = evaluate_stop_conditions(&progress(1, 0.5, false), 2, &config, &counters);
        assert_eq!(stop, Some(StopReason::RequiredSearchExhaustedNoNewUrlsOrFields));
    }

    #[test]
    fn round_zero_fast_profile_does_not_feed_required_search_streak() {
        // `required_search_iteration == 0` for the round-0 fast profile
        // (§4.G): even a stale, zero-yield round must not start the streak.
        let config = SchedulerConfig::default();
        let mut counters = ConvergenceCounters::default();
        counters.record_round(&outcome(0, 0, false), &progress(1, 0.5, false), false, &config, 0);
        assert_eq!(counters.required_search_exhausted_streak, 0);
    }

    #[test]
    fn no_progress_scenario_stops_after_round_one_with_limit_one() {
        let mut config = SchedulerConfig::default();
        config.convergence_no_progress_limit = 1;
        config.convergence_max_rounds = 10;
        let mut counters = ConvergenceCounters::default();
        let p = progress(1, 0.5, false);
        counters.record_round(&outcome(0, 0, false), &p, false, &config, 1);
        let stop = evaluate_stop_conditions(&p, 1, &config, &counters);
        assert_eq!(stop, Some(StopReason::NoProgress));
    }

    #[test]
    fn identity_gate_stuck_stops_after_default_one_round() {
        let config = SchedulerConfig::default();
        let mut counters = ConvergenceCounters::default();
        let p = progress(1, 0.9, false);
        counters.record_round(&outcome(1, 1, true), &p, true, &config, 1);
        let stop = evaluate_stop_conditions(&p, 1, &config, &counters);
        assert_eq!(stop, Some(StopReason::IdentityGateStuck));
    }

    #[test]
    fn none_fires_when_progress_improving_and_well_within_limits() {
        let mut config = SchedulerConfig::default();
        config.convergence_max_rounds = 10;
        let counters = ConvergenceCounters::default();
        let stop = evaluate_stop_conditions(&progress(1, 0.8, false), 1, &config, &counters);
        assert_eq!(stop, None);
    }
}
