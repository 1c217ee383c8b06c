//! NeedSet row types (§3 "NeedRow", §4.E).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NeedReason {
    Missing,
    LowConf,
    TierPrefUnmet,
    Conflict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedRow {
    pub field_key: String,
    pub need_score: f64,
    pub effective_confidence: f64,
    pub reasons: Vec<NeedReason>,
    pub required_level: crate::contract::RequiredLevel,
    pub tier_preference: Vec<u8>,
    pub min_refs: u32,
}
