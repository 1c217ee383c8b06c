//! The subset of `HarvesterConfig` (§6) the scheduler reads: convergence
//! stop-condition thresholds, plus the search/discovery/LLM knobs
//! `buildRoundConfig` (§4.G) shapes per round. `shc-core::config` owns the
//! full recognized-field record; this crate only needs the fields it
//! actually consults, mirroring how `shc-frontier` only takes the cooldown
//! subset rather than the whole config object.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    pub llm_enabled: bool,
    pub llm_explicitly_set: bool,
    pub llm_max_calls_per_round: u32,
    pub llm_max_calls_per_product_total: u32,

    pub search_provider: String,
    pub bing_search_key: Option<String>,
    pub searxng_base_url: Option<String>,
    #[serde(default = "default_true")]
    pub duckduckgo_enabled: bool,

    pub discovery_enabled: bool,
    pub discovery_internal_first: bool,
    pub fetch_candidate_sources: bool,

    pub max_urls_per_product: u32,
    pub max_candidate_urls: u32,
    pub max_manufacturer_urls_per_product: u32,

    pub convergence_max_rounds: u32,
    pub convergence_no_progress_limit: u32,
    pub convergence_low_quality_confidence: f64,
    pub convergence_max_low_quality_rounds: u32,
    pub convergence_identity_fail_fast_rounds: u32,
    pub convergence_max_dispatch_queries: u32,

    /// Round index (0-based) from which the "aggressive" thoroughness
    /// profile escalates URL/LLM caps (§4.G `aggressiveThoroughFromRound`).
    pub aggressive_thorough_from_round: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            llm_enabled: true,
            llm_explicitly_set: false,
            llm_max_calls_per_round: 6,
            llm_max_calls_per_product_total: 40,
            search_provider: "dual".to_string(),
            bing_search_key: None,
            searxng_base_url: None,
            duckduckgo_enabled: true,
            discovery_enabled: true,
            discovery_internal_first: true,
            fetch_candidate_sources: true,
            max_urls_per_product: 20,
            max_candidate_urls: 40,
            max_manufacturer_urls_per_product: 6,
            convergence_max_rounds: 3,
            convergence_no_progress_limit: 2,
            convergence_low_quality_confidence: 0.1,
            convergence_max_low_quality_rounds: 2,
            convergence_identity_fail_fast_rounds: 1,
            convergence_max_dispatch_queries: 15,
            aggressive_thorough_from_round: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_deserialize_silently() {
        let raw = r#"{"llmEnabled": false, "someFutureField": 123}"#;
        let cfg: SchedulerConfig = serde_json::from_str(raw).unwrap();
        assert!(!cfg.llm_enabled);
        assert_eq!(cfg.convergence_max_rounds, 3);
    }
}
