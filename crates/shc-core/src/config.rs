//! `HarvesterConfig` (§6 "Configuration", §11.3): the flat, typed record of
//! every recognized configuration field, mirroring
//! `agent-agency-config`'s `AppConfig` pattern (a flat validated record, not
//! a free-form map). Per Design Note §9 "Dynamic config objects", unknown
//! JSON fields are ignored silently — `#[serde(deny_unknown_fields)]` is
//! deliberately not set.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::Storage;

fn default_true() -> bool {
    true
}

fn default_search_provider() -> String {
    "dual".to_string()
}

fn default_llm_reasoning_mode() -> String {
    "balanced".to_string()
}

fn default_run_profile() -> String {
    "standard".to_string()
}

/// Every field enumerated in §6's configuration list. Grouped by the
/// subsystem that reads it, but kept as one flat record — no nested
/// sub-structs — since the spec names these as a single flat set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvesterConfig {
    // Storage roots.
    pub helper_files_root: String,
    pub local_output_root: String,

    // Reasoning collaborator budgets.
    pub llm_enabled: bool,
    pub llm_explicitly_set: bool,
    pub llm_max_calls_per_round: u32,
    pub llm_max_calls_per_product_total: u32,
    #[serde(default = "default_llm_reasoning_mode")]
    pub llm_reasoning_mode: String,
    pub llm_reasoning_budget: u32,
    pub llm_timeout_ms: u64,
    pub llm_cost_input_per_1m: f64,
    pub llm_cost_output_per_1m: f64,
    pub llm_monthly_budget_usd: f64,

    // Search / discovery.
    #[serde(default = "default_search_provider")]
    pub search_provider: String,
    pub bing_search_key: Option<String>,
    pub bing_search_endpoint: Option<String>,
    pub searxng_base_url: Option<String>,
    #[serde(default = "default_true")]
    pub duckduckgo_enabled: bool,
    pub discovery_enabled: bool,
    pub discovery_internal_first: bool,
    pub discovery_max_queries: u32,
    pub discovery_max_discovered: u32,
    pub fetch_candidate_sources: bool,

    // Fetch budgets.
    pub max_urls_per_product: u32,
    pub max_candidate_urls: u32,
    pub max_pages_per_domain: u32,
    pub max_manufacturer_urls_per_product: u32,

    // Convergence scheduler.
    pub convergence_max_rounds: u32,
    pub convergence_no_progress_limit: u32,
    pub convergence_low_quality_confidence: f64,
    pub convergence_max_low_quality_rounds: u32,
    pub convergence_identity_fail_fast_rounds: u32,
    pub convergence_max_dispatch_queries: u32,
    pub aggressive_thorough_from_round: u32,

    // Identity gate.
    pub identity_gate_publish_threshold: f64,

    // Frontier store.
    pub frontier_enable_sqlite: bool,
    pub frontier_query_cooldown_seconds: u64,
    pub frontier_cooldown404_seconds: u64,
    pub frontier_cooldown404_repeat_seconds: u64,
    pub frontier_cooldown410_seconds: u64,
    pub frontier_cooldown429_base_seconds: u64,
    pub frontier_strip_tracking_params: bool,
    pub per_host_min_delay_ms: u64,

    // Fetch timeouts.
    pub page_goto_timeout_ms: u64,
    pub page_network_idle_timeout_ms: u64,

    #[serde(default = "default_run_profile")]
    pub run_profile: String,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        HarvesterConfig {
            helper_files_root: "helper-files".to_string(),
            local_output_root: "output".to_string(),

            llm_enabled: true,
            llm_explicitly_set: false,
            llm_max_calls_per_round: 6,
            llm_max_calls_per_product_total: 40,
            llm_reasoning_mode: default_llm_reasoning_mode(),
            llm_reasoning_budget: 4096,
            llm_timeout_ms: 30_000,
            llm_cost_input_per_1m: 0.0,
            llm_cost_output_per_1m: 0.0,
            llm_monthly_budget_usd: 0.0,

            search_provider: default_search_provider(),
            bing_search_key: None,
            bing_search_endpoint: None,
            searxng_base_url: None,
            duckduckgo_enabled: true,
            discovery_enabled: true,
            discovery_internal_first: true,
            discovery_max_queries: 8,
            discovery_max_discovered: 40,
            fetch_candidate_sources: true,

            max_urls_per_product: 20,
            max_candidate_urls: 40,
            max_pages_per_domain: 5,
            max_manufacturer_urls_per_product: 6,

            convergence_max_rounds: 3,
            convergence_no_progress_limit: 2,
            convergence_low_quality_confidence: 0.1,
            convergence_max_low_quality_rounds: 2,
            convergence_identity_fail_fast_rounds: 1,
            convergence_max_dispatch_queries: 15,
            aggressive_thorough_from_round: 2,

            identity_gate_publish_threshold: 0.7,

            frontier_enable_sqlite: false,
            frontier_query_cooldown_seconds: 3600,
            frontier_cooldown404_seconds: 86_400,
            frontier_cooldown404_repeat_seconds: 7 * 86_400,
            frontier_cooldown410_seconds: 30 * 86_400,
            frontier_cooldown429_base_seconds: 300,
            frontier_strip_tracking_params: true,
            per_host_min_delay_ms: 500,

            page_goto_timeout_ms: 15_000,
            page_network_idle_timeout_ms: 5_000,

            run_profile: default_run_profile(),
        }
    }
}

impl HarvesterConfig {
    /// Reads `config.json` from the Storage collaborator, falling back to
    /// `HarvesterConfig::default()` when the key is absent or fails to
    /// parse (§11.3), in the style of `config::ConfigLoader`.
    pub async fn load(storage: &dyn Storage, key: &str) -> Self {
        match storage.read_json_or_null(key).await {
            Ok(Some(raw)) => match serde_json::from_value::<HarvesterConfig>(raw) {
                Ok(cfg) => {
                    info!(key, "loaded harvester config");
                    cfg
                }
                Err(err) => {
                    warn!(key, %err, "harvester config failed to parse, using defaults");
                    HarvesterConfig::default()
                }
            },
            Ok(None) => {
                info!(key, "no harvester config found, using defaults");
                HarvesterConfig::default()
            }
            Err(err) => {
                warn!(key, %err, "harvester config read failed, using defaults");
                HarvesterConfig::default()
            }
        }
    }

    /// The subset `shc-scheduler` consumes.
    pub fn scheduler_config(&self) -> shc_scheduler::SchedulerConfig {
        shc_scheduler::SchedulerConfig {
            llm_enabled: self.llm_enabled,
            llm_explicitly_set: self.llm_explicitly_set,
            llm_max_calls_per_round: self.llm_max_calls_per_round,
            llm_max_calls_per_product_total: self.llm_max_calls_per_product_total,
            search_provider: self.search_provider.clone(),
            bing_search_key: self.bing_search_key.clone(),
            searxng_base_url: self.searxng_base_url.clone(),
            duckduckgo_enabled: self.duckduckgo_enabled,
            discovery_enabled: self.discovery_enabled,
            discovery_internal_first: self.discovery_internal_first,
            fetch_candidate_sources: self.fetch_candidate_sources,
            max_urls_per_product: self.max_urls_per_product,
            max_candidate_urls: self.max_candidate_urls,
            max_manufacturer_urls_per_product: self.max_manufacturer_urls_per_product,
            convergence_max_rounds: self.convergence_max_rounds,
            convergence_no_progress_limit: self.convergence_no_progress_limit,
            convergence_low_quality_confidence: self.convergence_low_quality_confidence,
            convergence_max_low_quality_rounds: self.convergence_max_low_quality_rounds,
            convergence_identity_fail_fast_rounds: self.convergence_identity_fail_fast_rounds,
            convergence_max_dispatch_queries: self.convergence_max_dispatch_queries,
            aggressive_thorough_from_round: self.aggressive_thorough_from_round,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::StorageError;
    use async_trait::async_trait;

    struct NullStorage;

    #[async_trait]
    impl Storage for NullStorage {
        async fn read_json_or_null(&self, _key: &str) -> Result<Option<serde_json::Value>, StorageError> {
            Ok(None)
        }
        async fn read_text_or_null(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        async fn write_object(&self, _key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
            Ok(())
        }
        fn resolve_output_key(&self, parts: &[&str]) -> String {
            parts.join("/")
        }
        async fn object_exists(&self, _key: &str) -> Result<bool, StorageError> {
            Ok(false)
        }
    }

    #[test]
    fn unknown_fields_deserialize_silently() {
        let raw = r#"{"llmEnabled": false, "someFutureField": {"nested": true}}"#;
        let cfg: HarvesterConfig = serde_json::from_str(raw).unwrap();
        assert!(!cfg.llm_enabled);
        assert_eq!(cfg.convergence_max_rounds, 3);
    }

    #[test]
    fn default_matches_documented_values() {
        let cfg = HarvesterConfig::default();
        assert_eq!(cfg.convergence_max_rounds, 3);
        assert_eq!(cfg.search_provider, "dual");
        assert!(cfg.discovery_enabled);
    }

    #[tokio::test]
    async fn load_falls_back_to_default_when_key_absent() {
        let cfg = HarvesterConfig::load(&NullStorage, "config.json").await;
        assert_eq!(cfg.convergence_max_rounds, HarvesterConfig::default().convergence_max_rounds);
    }
}
