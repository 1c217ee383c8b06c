//! Known value catalogs (§3 "Known Value Catalog").

use serde::{Deserialize, Serialize};

use crate::contract::EnumPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogValue {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A named catalog of known values for one or more enum fields, referenced
/// from a `FieldContract`'s `enum_catalog.source` (§3, §4.A `getEnumCatalog`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub policy: EnumPolicy,
    pub values: Vec<CatalogValue>,
}

impl Catalog {
    /// Canonical-or-alias lookup, case-insensitive, matching §4.A's
    /// `normalizeCandidate` enum handling.
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        let needle = raw.trim().to_lowercase();
        for value in &self.values {
            if value.canonical.to_lowercase() == needle {
                return Some(&value.canonical);
            }
            if value.aliases.iter().any(|a| a.to_lowercase() == needle) {
                return Some(&value.canonical);
            }
        }
        None
    }
}
