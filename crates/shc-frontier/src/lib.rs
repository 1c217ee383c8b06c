//! Frontier Store (§4.H): process-wide tracking of queries issued, URLs
//! fetched, and the cooldowns they accrue, backed by a pluggable
//! persistence layer.

mod cooldown;
mod error;
mod persistence;
mod state;

pub use cooldown::{cooldown_for_status, CooldownPolicy, CooldownReason};
pub use error::FrontierError;
pub use persistence::{FrontierPersistence, JsonFrontierPersistence, SqliteFrontierPersistence};
pub use state::{
    DomainStats, FrontierState, ProductFrontierSnapshot, QueryRecord, SkipUrlResult, UrlCooldown, UrlState,
};
