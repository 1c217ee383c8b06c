//! Identity Gate (§4.I): computes an identity certainty score from accepted
//! sources, and detects semantically significant ("identity-critical")
//! contradictions between them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use shc_contracts::{Catalog, Tier};

/// One source's identity-relevant claims, gathered during a round (§4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySource {
    pub tier: Tier,
    pub domain: String,
    pub approved_domain: bool,
    pub identity_match: bool,
    /// Authored per-source confidence bonus beyond the tier/count terms.
    pub reason_bonus: f64,
    pub connection: Option<String>,
    pub sensor_family: Option<String>,
    pub dimension_mm: Option<f64>,
    pub sku: Option<String>,
}

impl IdentitySource {
    fn is_accepted(&self) -> bool {
        self.identity_match && self.approved_domain
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityGateResult {
    pub certainty: f64,
    pub validated: bool,
    pub accepted_source_count: usize,
}

/// `evaluateIdentityGate` (§4.I).
pub fn evaluate_identity_gate(sources: &[IdentitySource]) -> IdentityGateResult {
    let accepted: Vec<&IdentitySource> = sources.iter().filter(|s| s.is_accepted()).collect();
    let manufacturer_accepted = accepted.iter().any(|s| s.tier == Tier::Manufacturer);
    let additional_accepted = accepted.iter().filter(|s| s.tier != Tier::Manufacturer).count();

    let contradictions = build_identity_critical_contradictions(sources, None);

    let mut certainty = 0.0;
    if manufacturer_accepted {
        certainty += 0.5;
    }
    if additional_accepted >= 2 {
        certainty += 0.45;
    }
    for source in &accepted {
        certainty += source.reason_bonus;
    }

    let cap = if contradictions.is_empty() { 0.95 } else { 1.0 };
    certainty = certainty.clamp(0.0, cap);

    let validated = manufacturer_accepted && additional_accepted >= 2 && contradictions.is_empty();

    debug!(
        accepted = accepted.len(),
        manufacturer_accepted,
        additional_accepted,
        contradictions = contradictions.len(),
        certainty,
        validated,
        "identity gate evaluated"
    );

    IdentityGateResult { certainty, validated, accepted_source_count: accepted.len() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    Connection,
    SensorFamily,
    Dimensions,
    Sku,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityContradiction {
    pub kind: ContradictionKind,
    pub detail: String,
}

fn normalize_alnum_upper(value: &str) -> String {
    value.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_uppercase()
}

fn same_canonical_alias(a: &str, b: &str, catalog: Option<&Catalog>) -> bool {
    let Some(catalog) = catalog else { return false };
    match (catalog.resolve(a), catalog.resolve(b)) {
        (Some(ca), Some(cb)) => ca == cb,
        _ => false,
    }
}

/// `buildIdentityCriticalContradictions` (§4.I): surfaces only semantically
/// significant disagreements between accepted sources, per field-specific
/// tolerance rules.
pub fn build_identity_critical_contradictions(
    sources: &[IdentitySource],
    connection_catalog: Option<&Catalog>,
) -> Vec<IdentityContradiction> {
    let accepted: Vec<&IdentitySource> = sources.iter().filter(|s| s.is_accepted()).collect();
    let mut contradictions = Vec::new();

    for i in 0..accepted.len() {
        for j in (i + 1)..accepted.len() {
            let a = accepted[i];
            let b = accepted[j];

            if let (Some(ca), Some(cb)) = (&a.connection, &b.connection) {
                let ca_l = ca.to_lowercase();
                let cb_l = cb.to_lowercase();
                let substrings = ca_l.contains(&cb_l) || cb_l.contains(&ca_l);
                if ca_l != cb_l && !substrings && !same_canonical_alias(ca, cb, connection_catalog) {
                    contradictions.push(IdentityContradiction {
                        kind: ContradictionKind::Connection,
                        detail: format!("{} vs {}", ca, cb),
                    });
                }
            }

            if let (Some(sa), Some(sb)) = (&a.sensor_family, &b.sensor_family) {
                if normalize_alnum_upper(sa) != normalize_alnum_upper(sb) {
                    contradictions.push(IdentityContradiction {
                        kind: ContradictionKind::SensorFamily,
                        detail: format!("{} vs {}", sa, sb),
                    });
                }
            }

            if let (Some(da), Some(db)) = (a.dimension_mm, b.dimension_mm) {
                if (da - db).abs() >= 3.0 {
                    contradictions.push(IdentityContradiction {
                        kind: ContradictionKind::Dimensions,
                        detail: format!("{:.1}mm vs {:.1}mm", da, db),
                    });
                }
            }

            if let (Some(ska), Some(skb)) = (&a.sku, &b.sku) {
                let shares_prefix = ska.len() >= 12
                    && skb.len() >= 12
                    && ska[..12].eq_ignore_ascii_case(&skb[..12]);
                if ska != skb && !shares_prefix {
                    contradictions.push(IdentityContradiction {
                        kind: ContradictionKind::Sku,
                        detail: format!("{} vs {}", ska, skb),
                    });
                }
            }
        }
    }

    contradictions
}
