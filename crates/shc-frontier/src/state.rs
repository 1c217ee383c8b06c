//! `FrontierState` (§3): the process-wide record of queries issued, URLs
//! fetched, per-URL cooldowns, and per-domain stats.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cooldown::{cooldown_for_status, CooldownPolicy, CooldownReason};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub product_id: String,
    pub query_norm: String,
    pub first_ts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlCooldown {
    pub until_ts: i64,
    pub reason: CooldownReason,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UrlState {
    pub status: u16,
    pub fields_found: Vec<String>,
    pub cooldown: Option<UrlCooldown>,
    pub last_ts: i64,
    /// Count of prior 404s on this URL, used to escalate the cooldown
    /// reason (§8 "Cooldown"); monotone per §5 "Ordering guarantees".
    pub repeat_404_count: u32,
}

/// Per-domain rolling stats. `success_rate` is a supplemented diagnostic
/// field (§SPEC_FULL 12) that does not participate in any stop-condition
/// decision.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DomainStats {
    pub fetch_count: u64,
    pub success_count: u64,
}

impl DomainStats {
    pub fn success_rate(&self) -> f64 {
        if self.fetch_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.fetch_count as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FrontierState {
    pub queries: Vec<QueryRecord>,
    pub urls: HashMap<String, UrlState>,
    pub domain_stats: HashMap<String, DomainStats>,
}

#[derive(Debug, Clone)]
pub struct SkipUrlResult {
    pub skip: bool,
    pub reason: Option<CooldownReason>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFrontierSnapshot {
    pub query_count: usize,
    pub url_count: usize,
    pub field_yield: Vec<String>,
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonicalize_url(url: &str, strip_tracking_params: bool) -> String {
    if !strip_tracking_params {
        return url.to_string();
    }
    let Some((base, query)) = url.split_once('?') else { return url.to_string() };
    const TRACKING_PREFIXES: &[&str] = &["utm_", "gclid", "fbclid", "ref", "mc_", "igshid"];
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or("");
            !TRACKING_PREFIXES.iter().any(|p| key.starts_with(p))
        })
        .collect();
    if kept.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, kept.join("&"))
    }
}

impl FrontierState {
    /// `shouldSkipQuery` (§4.H): true iff the normalized `(productId, query)`
    /// pair was seen within `cooldown_seconds`.
    pub fn should_skip_query(&self, product_id: &str, query: &str, now_ts: i64, cooldown_seconds: i64) -> bool {
        let normalized = normalize_query(query);
        self.queries.iter().any(|q| {
            q.product_id == product_id
                && q.query_norm == normalized
                && now_ts - q.first_ts < cooldown_seconds
        })
    }

    pub fn record_query(&mut self, product_id: &str, query: &str, now_ts: i64) {
        let normalized = normalize_query(query);
        if self.queries.iter().any(|q| q.product_id == product_id && q.query_norm == normalized) {
            return;
        }
        self.queries.push(QueryRecord {
            product_id: product_id.to_string(),
            query_norm: normalized,
            first_ts: now_ts,
        });
    }

    /// `shouldSkipUrl` (§4.H).
    pub fn should_skip_url(&self, url: &str, now_ts: i64, strip_tracking_params: bool) -> SkipUrlResult {
        let canon = canonicalize_url(url, strip_tracking_params);
        match self.urls.get(&canon).and_then(|u| u.cooldown.as_ref()) {
            Some(cooldown) if cooldown.until_ts > now_ts => {
                SkipUrlResult { skip: true, reason: Some(cooldown.reason) }
            }
            _ => SkipUrlResult { skip: false, reason: None },
        }
    }

    /// `recordFetch` (§4.H). Imposes a cooldown per `cooldown_for_status`
    /// when the status warrants one.
    pub fn record_fetch(
        &mut self,
        url: &str,
        status: u16,
        fields_found: Vec<String>,
        now_ts: i64,
        strip_tracking_params: bool,
        policy: &CooldownPolicy,
    ) {
        let canon = canonicalize_url(url, strip_tracking_params);
        let host = host_of(&canon);
        let domain = self.domain_stats.entry(host).or_default();
        domain.fetch_count += 1;
        if (200..300).contains(&status) {
            domain.success_count += 1;
        }

        let entry = self.urls.entry(canon).or_default();
        let repeats_so_far = if status == 404 { entry.repeat_404_count } else { 0 };
        entry.status = status;
        if !fields_found.is_empty() {
            entry.fields_found.extend(fields_found);
            entry.fields_found.sort();
            entry.fields_found.dedup();
        }
        entry.last_ts = now_ts;
        if status == 404 {
            entry.repeat_404_count += 1;
        }
        if let Some((seconds, reason)) = cooldown_for_status(policy, status, repeats_so_far) {
            entry.cooldown = Some(UrlCooldown { until_ts: now_ts + seconds as i64, reason });
        }
    }

    pub fn snapshot_for_product(&self, product_id: &str) -> ProductFrontierSnapshot {
        let query_count = self.queries.iter().filter(|q| q.product_id == product_id).count();
        let mut field_yield = Vec::new();
        let mut url_count = 0;
        for url in self.urls.values() {
            if url.fields_found.is_empty() {
                continue;
            }
            url_count += 1;
            field_yield.extend(url.fields_found.iter().cloned());
        }
        field_yield.sort();
        field_yield.dedup();
        ProductFrontierSnapshot { query_count, url_count, field_yield }
    }
}

fn host_of(url: &str) -> String {
    let without_scheme = url.splitn(2, "://").nth(1).unwrap_or(url);
    without_scheme.split('/').next().unwrap_or(without_scheme).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_skip_query_true_within_cooldown_window() {
        let mut state = FrontierState::default();
        state.record_query("p1", "Razer Viper V3 Pro", 1_000);
        assert!(state.should_skip_query("p1", "razer viper v3 pro", 1_500, 3600));
        assert!(!state.should_skip_query("p1", "razer viper v3 pro", 5_000, 3600));
    }

    #[test]
    fn should_skip_query_scopes_by_product() {
        let mut state = FrontierState::default();
        state.record_query("p1", "razer viper", 1_000);
        assert!(!state.should_skip_query("p2", "razer viper", 1_500, 3600));
    }

    #[test]
    fn record_fetch_with_404_imposes_cooldown() {
        let mut state = FrontierState::default();
        let policy = CooldownPolicy::default();
        state.record_fetch("https://a.com/x", 404, vec![], 1_000, false, &policy);
        let result = state.should_skip_url("https://a.com/x", 1_500, false);
        assert!(result.skip);
        assert_eq!(result.reason, Some(CooldownReason::Status404));
    }

    #[test]
    fn repeated_404s_escalate_reason() {
        let mut state = FrontierState::default();
        let policy = CooldownPolicy::default();
        for ts in [1_000, 10_000, 20_000] {
            state.record_fetch("https://a.com/x", 404, vec![], ts, false, &policy);
        }
        let url = state.urls.get("https://a.com/x").unwrap();
        assert_eq!(url.cooldown.as_ref().unwrap().reason, CooldownReason::Status404Repeated);
    }

    #[test]
    fn tracking_params_stripped_when_configured() {
        let mut state = FrontierState::default();
        let policy = CooldownPolicy::default();
        state.record_fetch("https://a.com/x?utm_source=foo", 404, vec![], 1_000, true, &policy);
        let result = state.should_skip_url("https://a.com/x?utm_source=bar", 1_500, true);
        assert!(result.skip);
    }

    #[test]
    fn snapshot_reports_query_count_and_field_yield() {
        let mut state = FrontierState::default();
        let policy = CooldownPolicy::default();
        state.record_query("p1", "query one", 1_000);
        state.record_fetch("https://a.com/x", 200, vec!["weight".to_string()], 1_000, false, &policy);
        let snapshot = state.snapshot_for_product("p1");
        assert_eq!(snapshot.query_count, 1);
        assert_eq!(snapshot.field_yield, vec!["weight".to_string()]);
    }
}
