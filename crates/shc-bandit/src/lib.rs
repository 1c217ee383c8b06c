//! Bandit Scheduler (§4.F): orders items in a batch by an information-need
//! score with an exploration/exploit tradeoff, used when batching work
//! across multiple products.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// `explore`, `exploit`, or `balanced` — each selects a different weighting
/// of the three score components (§4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanditMode {
    Explore,
    Exploit,
    Balanced,
}

/// Per-item signal inputs the bandit scores (§4.F): "info_need" components
/// plus the data needed for "exploit_score".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanditMetadataRow {
    pub product_id: String,
    pub brand: String,
    pub key: String,
    pub missing_critical_count: u32,
    pub below_pass_count: u32,
    pub contradiction_count: u32,
    pub hypothesis_queue_len: u32,
    pub validated: bool,
    pub confidence: f64,
}

/// Per-mode α/β/γ weighting. Exact constants are an implementation detail
/// (§8 Open Questions); only the ordering properties (exploit dominates in
/// `Exploit` mode, explore dominates in `Explore` mode, info-need dominates
/// in `Balanced` mode) are contractual.
#[derive(Debug, Clone, Copy)]
struct ModeWeights {
    alpha: f64,
    beta: f64,
    gamma: f64,
}

fn weights_for_mode(mode: BanditMode) -> ModeWeights {
    match mode {
        BanditMode::Exploit => ModeWeights { alpha: 0.3, beta: 0.6, gamma: 0.1 },
        BanditMode::Explore => ModeWeights { alpha: 0.2, beta: 0.1, gamma: 0.7 },
        BanditMode::Balanced => ModeWeights { alpha: 0.6, beta: 0.25, gamma: 0.15 },
    }
}

/// Deterministic splitmix64-derived PRNG so `explore_bonus` is reproducible
/// across runs given the same `seed` and item key (§4.F).
fn deterministic_unit_interval(seed: u64, key: &str) -> f64 {
    let mut state = seed ^ fnv1a(key);
    state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

fn fnv1a(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn info_need(row: &BanditMetadataRow) -> f64 {
    let missing = row.missing_critical_count as f64 * 1.0;
    let below_pass = row.below_pass_count as f64 * 0.6;
    let contradictions = row.contradiction_count as f64 * 0.8;
    let hypothesis = row.hypothesis_queue_len as f64 * 0.3;
    missing + below_pass + contradictions + hypothesis
}

fn exploit_score(row: &BanditMetadataRow) -> f64 {
    if row.validated {
        row.confidence
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredBanditRow {
    pub key: String,
    pub info_need: f64,
    pub exploit_score: f64,
    pub explore_bonus: f64,
    pub bandit_score: f64,
}

#[derive(Debug, Clone)]
pub struct BanditRankResult {
    pub ordered_keys: Vec<String>,
    pub scored: Vec<ScoredBanditRow>,
}

pub struct RankBatchWithBanditArgs<'a> {
    pub seed: u64,
    pub mode: BanditMode,
    /// Additive per-brand shift applied after the weighted sum.
    pub brand_reward_index: Option<&'a HashMap<String, f64>>,
    pub metadata_rows: &'a [BanditMetadataRow],
}

/// `rankBatchWithBandit` (§4.F). Ties break deterministically by
/// `(productId, brand, key)`.
pub fn rank_batch_with_bandit(args: RankBatchWithBanditArgs<'_>) -> BanditRankResult {
    let weights = weights_for_mode(args.mode);

    let mut scored: Vec<(ScoredBanditRow, String, String)> = args
        .metadata_rows
        .iter()
        .map(|row| {
            let need = info_need(row);
            let exploit = exploit_score(row);
            let explore = deterministic_unit_interval(args.seed, &row.key);
            let brand_shift = args
                .brand_reward_index
                .and_then(|idx| idx.get(&row.brand))
                .copied()
                .unwrap_or(0.0);
            let score = weights.alpha * need + weights.beta * exploit + weights.gamma * explore + brand_shift;
            (
                ScoredBanditRow {
                    key: row.key.clone(),
                    info_need: need,
                    exploit_score: exploit,
                    explore_bonus: explore,
                    bandit_score: score,
                },
                row.product_id.clone(),
                row.brand.clone(),
            )
        })
        .collect();

    scored.sort_by(|(a, a_pid, a_brand), (b, b_pid, b_brand)| {
        b.bandit_score
            .partial_cmp(&a.bandit_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a_pid.cmp(b_pid))
            .then_with(|| a_brand.cmp(b_brand))
            .then_with(|| a.key.cmp(&b.key))
    });

    let ordered_keys = scored.iter().map(|(s, _, _)| s.key.clone()).collect();
    let scored_rows = scored.into_iter().map(|(s, _, _)| s).collect();

    debug!(mode = ?args.mode, rows = args.metadata_rows.len(), "bandit batch ranked");

    BanditRankResult { ordered_keys, scored: scored_rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, missing: u32, validated: bool, confidence: f64) -> BanditMetadataRow {
        BanditMetadataRow {
            product_id: "p1".to_string(),
            brand: "razer".to_string(),
            key: key.to_string(),
            missing_critical_count: missing,
            below_pass_count: 0,
            contradiction_count: 0,
            hypothesis_queue_len: 0,
            validated,
            confidence,
        }
    }

    #[test]
    fn deterministic_across_runs_with_same_seed() {
        let rows = vec![row("a", 1, false, 0.0), row("b", 0, true, 0.9)];
        let result_a = rank_batch_with_bandit(RankBatchWithBanditArgs {
            seed: 42,
            mode: BanditMode::Balanced,
            brand_reward_index: None,
            metadata_rows: &rows,
        });
        let result_b = rank_batch_with_bandit(RankBatchWithBanditArgs {
            seed: 42,
            mode: BanditMode::Balanced,
            brand_reward_index: None,
            metadata_rows: &rows,
        });
        assert_eq!(result_a.ordered_keys, result_b.ordered_keys);
        assert_eq!(
            result_a.scored[0].explore_bonus,
            result_b.scored[0].explore_bonus
        );
    }

    #[test]
    fn exploit_mode_prefers_high_confidence_validated_row() {
        let rows = vec![row("needy", 3, false, 0.0), row("validated", 0, true, 0.95)];
        let result = rank_batch_with_bandit(RankBatchWithBanditArgs {
            seed: 7,
            mode: BanditMode::Exploit,
            brand_reward_index: None,
            metadata_rows: &rows,
        });
        assert_eq!(result.ordered_keys[0], "validated");
    }

    #[test]
    fn balanced_mode_prefers_higher_info_need() {
        let rows = vec![row("needy", 5, false, 0.0), row("validated", 0, true, 0.95)];
        let result = rank_batch_with_bandit(RankBatchWithBanditArgs {
            seed: 7,
            mode: BanditMode::Balanced,
            brand_reward_index: None,
            metadata_rows: &rows,
        });
        assert_eq!(result.ordered_keys[0], "needy");
    }

    #[test]
    fn brand_reward_index_shifts_score() {
        let rows = vec![row("a", 1, false, 0.0), row("b", 1, false, 0.0)];
        let mut idx = HashMap::new();
        idx.insert("razer".to_string(), 5.0);
        let mut rows_b = rows.clone();
        rows_b[1].brand = "logitech".to_string();
        let result = rank_batch_with_bandit(RankBatchWithBanditArgs {
            seed: 1,
            mode: BanditMode::Balanced,
            brand_reward_index: Some(&idx),
            metadata_rows: &rows_b,
        });
        assert_eq!(result.ordered_keys[0], "a");
    }

    #[test]
    fn ties_break_deterministically_by_product_brand_key() {
        let rows = vec![row("z", 0, false, 0.0), row("a", 0, false, 0.0)];
        let result = rank_batch_with_bandit(RankBatchWithBanditArgs {
            seed: 1,
            mode: BanditMode::Balanced,
            brand_reward_index: None,
            metadata_rows: &rows,
        });
        // Both rows share product_id/brand and have zero info_need/exploit;
        // only the deterministic explore_bonus (keyed, not tied) can differ,
        // but if it ever does tie the key ordering must still be stable.
        let rerun = rank_batch_with_bandit(RankBatchWithBanditArgs {
            seed: 1,
            mode: BanditMode::Balanced,
            brand_reward_index: None,
            metadata_rows: &rows,
        });
        assert_eq!(result.ordered_keys, rerun.ordered_keys);
    }
}
