//! Component databases (§3 "Component Database").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Controls how a mismatched property between a product and its canonical
/// component is treated (§3, §GLOSSARY "Variance policy").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VariancePolicy {
    Authoritative,
    Advisory,
    Free,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentProperty {
    pub value: serde_json::Value,
    pub variance_policy: VariancePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentItem {
    pub canonical_name: String,
    pub maker: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub properties: HashMap<String, ComponentProperty>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(rename = "__nonDiscovered", default)]
    pub non_discovered: bool,
}

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join("")
}

/// A single component type's items plus its alias index (§4.A
/// `findComponentByAlias`). The index is built once at load time and is
/// read-only thereafter (immutable after load, §5 "Shared resources").
#[derive(Debug, Clone, Default)]
pub struct ComponentDb {
    items: Vec<ComponentItem>,
    /// Lower-cased, whitespace-stripped canonical/alias -> index into `items`.
    alias_index: HashMap<String, usize>,
}

impl ComponentDb {
    pub fn new(items: Vec<ComponentItem>) -> Self {
        let mut alias_index = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            alias_index.insert(normalize_key(&item.canonical_name), idx);
            for alias in &item.aliases {
                alias_index.entry(normalize_key(alias)).or_insert(idx);
            }
        }
        ComponentDb { items, alias_index }
    }

    pub fn items(&self) -> &[ComponentItem] {
        &self.items
    }

    /// Canonical match first, then alias, both on the raw and the
    /// whitespace-stripped form of `query` (§4.A).
    pub fn find_by_alias(&self, query: &str) -> Option<&ComponentItem> {
        let normalized = normalize_key(query);
        self.alias_index.get(&normalized).map(|&idx| &self.items[idx])
    }

    /// Best fuzzy match above `threshold` (already clamped by the caller),
    /// using normalized Jaro-Winkler similarity (§4.A `fuzzyMatchComponent`).
    pub fn fuzzy_match(&self, query: &str, threshold: f64) -> Option<(&ComponentItem, f64)> {
        let normalized = normalize_key(query);
        let mut best: Option<(&ComponentItem, f64)> = None;
        for item in &self.items {
            let candidates = std::iter::once(&item.canonical_name).chain(item.aliases.iter());
            for candidate in candidates {
                let score = strsim::jaro_winkler(&normalized, &normalize_key(candidate));
                if score >= threshold {
                    if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
                        best = Some((item, score));
                    }
                }
            }
        }
        best
    }
}
