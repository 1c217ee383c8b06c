//! A compiled category contract bundle (§4.A): the set of JSON artifacts
//! the engine loads once via the `Storage` collaborator and indexes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use shc_contracts::{Catalog, ComponentDb, ComponentItem, FieldContract};

/// Raw, serializable form of a category contract as it is read from
/// storage — one JSON document per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractBundleSource {
    pub category: String,
    /// Field order is authored explicitly rather than derived from map
    /// iteration order (§4.A `getFieldOrder`).
    pub field_order: Vec<String>,
    pub fields: HashMap<String, FieldContract>,
    #[serde(default)]
    pub catalogs: HashMap<String, Catalog>,
    #[serde(default)]
    pub components: HashMap<String, Vec<ComponentItem>>,
}

/// The loaded, indexed form used by `FieldRulesEngine`. Immutable after
/// load and shareable without synchronization (§5 "Shared resources").
pub struct ContractBundle {
    pub category: String,
    pub field_order: Vec<String>,
    pub fields: HashMap<String, FieldContract>,
    pub catalogs: HashMap<String, Catalog>,
    pub components: HashMap<String, ComponentDb>,
}

impl From<ContractBundleSource> for ContractBundle {
    fn from(src: ContractBundleSource) -> Self {
        let components = src
            .components
            .into_iter()
            .map(|(name, items)| (name, ComponentDb::new(items)))
            .collect();
        ContractBundle {
            category: src.category,
            field_order: src.field_order,
            fields: src.fields,
            catalogs: src.catalogs,
            components,
        }
    }
}
