//! `buildRoundConfig` and its supporting decisions (§4.G "Per-round config
//! shaping", "Force-retry policy").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::types::UnknownReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchProvider {
    None,
    Dual,
    Searxng,
    Duckduckgo,
    Bing,
}

/// `selectRoundSearchProvider` (§4.G): prefers `dual` if both Bing and
/// SearXNG are configured; falls back to `searxng`, then `duckduckgo`.
pub fn select_round_search_provider(config: &SchedulerConfig) -> SearchProvider {
    let has_bing = config.bing_search_key.as_deref().is_some_and(|k| !k.is_empty());
    let has_searxng = config.searxng_base_url.as_deref().is_some_and(|u| !u.is_empty());
    match (has_bing, has_searxng) {
        (true, true) => SearchProvider::Dual,
        (false, true) => SearchProvider::Searxng,
        _ if config.duckduckgo_enabled => SearchProvider::Duckduckgo,
        (true, false) => SearchProvider::Bing,
        _ => SearchProvider::None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundProfile {
    Fast,
    Standard,
    Aggressive,
}

/// The shaped, per-round effective config `runProductFn` actually receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundConfig {
    pub profile: RoundProfile,
    pub discovery_enabled: bool,
    pub fetch_candidate_sources: bool,
    pub search_provider: SearchProvider,
    pub max_urls_per_product: u32,
    pub max_candidate_urls: u32,
    pub llm_enabled: bool,
    pub llm_max_calls_per_round: u32,
    /// One extra expected-field search pass is allowed per run once all
    /// required fields resolve (§4.G).
    pub expected_field_pass_allowed: bool,
    pub discovery_defer_external: bool,
}

pub struct BuildRoundConfigArgs {
    pub round: u32,
    pub missing_required_count: u32,
    pub missing_expected_count: u32,
    pub missing_critical_count: u32,
    pub previous_validated: bool,
    pub required_search_iteration: u32,
    /// Sum of per-field `priority.effort` across fields still missing
    /// (§4.G `contractEffort`), used to raise deep-search budgets.
    pub contract_effort: u32,
}

/// `buildRoundConfig` (§4.G).
pub fn build_round_config(base: &SchedulerConfig, args: &BuildRoundConfigArgs) -> RoundConfig {
    // Round 0 is always a "fast" profile with tiny LLM call caps; explicit
    // `llmEnabled` is preserved verbatim.
    if args.round == 0 {
        return RoundConfig {
            profile: RoundProfile::Fast,
            discovery_enabled: base.discovery_enabled,
            fetch_candidate_sources: base.fetch_candidate_sources,
            search_provider: select_round_search_provider(base),
            max_urls_per_product: base.max_urls_per_product,
            max_candidate_urls: base.max_candidate_urls,
            llm_enabled: base.llm_enabled,
            llm_max_calls_per_round: base.llm_max_calls_per_round.min(2),
            expected_field_pass_allowed: false,
            discovery_defer_external: base.discovery_internal_first,
        };
    }

    let mut cfg = RoundConfig {
        profile: RoundProfile::Standard,
        discovery_enabled: base.discovery_enabled,
        fetch_candidate_sources: base.fetch_candidate_sources,
        search_provider: select_round_search_provider(base),
        max_urls_per_product: base.max_urls_per_product,
        max_candidate_urls: base.max_candidate_urls,
        llm_enabled: base.llm_enabled,
        llm_max_calls_per_round: base.llm_max_calls_per_round,
        expected_field_pass_allowed: false,
        discovery_defer_external: base.discovery_internal_first
            && args.required_search_iteration < 2,
    };

    if args.missing_required_count == 0 {
        cfg.discovery_enabled = false;
        cfg.fetch_candidate_sources = false;
        cfg.search_provider = SearchProvider::None;
        cfg.max_urls_per_product = (base.max_urls_per_product / 2).max(1);
        cfg.max_candidate_urls = (base.max_candidate_urls / 2).max(1);
        cfg.expected_field_pass_allowed = args.missing_expected_count > 0;
    } else {
        cfg.discovery_enabled = true;
        if args.contract_effort > 20 || args.missing_critical_count > 0 {
            cfg.max_urls_per_product = base.max_urls_per_product + args.contract_effort.min(20);
            cfg.llm_max_calls_per_round = base.llm_max_calls_per_round + args.missing_critical_count.min(4);
        }
    }

    if args.round >= base.aggressive_thorough_from_round {
        cfg.profile = RoundProfile::Aggressive;
        cfg.max_urls_per_product = (cfg.max_urls_per_product as f64 * 1.5) as u32;
        cfg.llm_max_calls_per_round = (cfg.llm_max_calls_per_round as f64 * 1.5) as u32;
    }

    cfg
}

/// `shouldForceExpectedFieldRetry` (§4.G): one extra loop per run when all
/// missing required fields are classified `expected` and reason
/// `not_found_after_search` — never for budget- or identity-blocked
/// fields.
pub fn should_force_expected_field_retry(
    missing_required_fields: &[String],
    missing_expected_fields: &[String],
    unknown_reasons: &HashMap<String, UnknownReason>,
) -> bool {
    if missing_required_fields.is_empty() || missing_expected_fields.is_empty() {
        return false;
    }
    let all_required_are_expected = missing_required_fields
        .iter()
        .all(|f| missing_expected_fields.contains(f));
    if !all_required_are_expected {
        return false;
    }
    missing_required_fields.iter().all(|f| {
        matches!(unknown_reasons.get(f), Some(UnknownReason::NotFoundAfterSearch))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> SchedulerConfig {
        SchedulerConfig::default()
    }

    #[test]
    fn round_zero_is_always_fast_with_capped_llm_calls() {
        let cfg = build_round_config(
            &base_config(),
            &BuildRoundConfigArgs {
                round: 0,
                missing_required_count: 5,
                missing_expected_count: 0,
                missing_critical_count: 0,
                previous_validated: false,
                required_search_iteration: 0,
                contract_effort: 0,
            },
        );
        assert_eq!(cfg.profile, RoundProfile::Fast);
        assert!(cfg.llm_max_calls_per_round <= 2);
    }

    #[test]
    fn no_missing_required_disables_discovery_and_search() {
        let cfg = build_round_config(
            &base_config(),
            &BuildRoundConfigArgs {
                round: 1,
                missing_required_count: 0,
                missing_expected_count: 0,
                missing_critical_count: 0,
                previous_validated: false,
                required_search_iteration: 1,
                contract_effort: 0,
            },
        );
        assert!(!cfg.discovery_enabled);
        assert!(!cfg.fetch_candidate_sources);
        assert_eq!(cfg.search_provider, SearchProvider::None);
    }

    #[test]
    fn missing_expected_allows_one_pass_when_required_satisfied() {
        let cfg = build_round_config(
            &base_config(),
            &BuildRoundConfigArgs {
                round: 1,
                missing_required_count: 0,
                missing_expected_count: 2,
                missing_critical_count: 0,
                previous_validated: false,
                required_search_iteration: 1,
                contract_effort: 0,
            },
        );
        assert!(cfg.expected_field_pass_allowed);
    }

    #[test]
    fn missing_required_enables_discovery_and_selects_provider() {
        let mut base = base_config();
        base.searxng_base_url = Some("https://searxng.local".to_string());
        let cfg = build_round_config(
            &base,
            &BuildRoundConfigArgs {
                round: 1,
                missing_required_count: 1,
                missing_expected_count: 0,
                missing_critical_count: 0,
                previous_validated: false,
                required_search_iteration: 1,
                contract_effort: 0,
            },
        );
        assert!(cfg.discovery_enabled);
        assert_eq!(cfg.search_provider, SearchProvider::Searxng);
    }

    #[test]
    fn aggressive_round_escalates_caps() {
        let cfg = build_round_config(
            &base_config(),
            &BuildRoundConfigArgs {
                round: 2,
                missing_required_count: 1,
                missing_expected_count: 0,
                missing_critical_count: 0,
                previous_validated: false,
                required_search_iteration: 1,
                contract_effort: 0,
            },
        );
        assert_eq!(cfg.profile, RoundProfile::Aggressive);
    }

    #[test]
    fn select_provider_prefers_dual_when_both_configured() {
        let mut cfg = base_config();
        cfg.bing_search_key = Some("key".to_string());
        cfg.searxng_base_url = Some("https://searxng.local".to_string());
        assert_eq!(select_round_search_provider(&cfg), SearchProvider::Dual);
    }

    #[test]
    fn select_provider_falls_back_to_duckduckgo() {
        let cfg = base_config();
        assert_eq!(select_round_search_provider(&cfg), SearchProvider::Duckduckgo);
    }

    #[test]
    fn force_retry_true_when_all_missing_required_are_expected_and_not_found() {
        let mut reasons = HashMap::new();
        reasons.insert("weight".to_string(), UnknownReason::NotFoundAfterSearch);
        let force = should_force_expected_field_retry(
            &["weight".to_string()],
            &["weight".to_string()],
            &reasons,
        );
        assert!(force);
    }

    #[test]
    fn force_retry_false_when_budget_exhausted() {
        let mut reasons = HashMap::new();
        reasons.insert("weight".to_string(), UnknownReason::BudgetExhausted);
        let force = should_force_expected_field_retry(
            &["weight".to_string()],
            &["weight".to_string()],
            &reasons,
        );
        assert!(!force);
    }

    #[test]
    fn force_retry_false_when_a_required_field_is_not_expected() {
        let mut reasons = HashMap::new();
        reasons.insert("weight".to_string(), UnknownReason::NotFoundAfterSearch);
        reasons.insert("dpi".to_string(), UnknownReason::NotFoundAfterSearch);
        let force = should_force_expected_field_retry(
            &["weight".to_string(), "dpi".to_string()],
            &["weight".to_string()],
            &reasons,
        );
        assert!(!force);
    }
}
