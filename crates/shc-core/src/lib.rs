//! Facade crate (§10): collaborator traits, configuration, the run-event
//! stream, published-artifact writers, and the wiring that ties the nine
//! component crates together into one product run.
//!
//! Every other `shc-*` crate is pure and synchronous (or, for
//! `shc-evidence-index`'s write path and `shc-scheduler`'s round
//! suspension point, narrowly async). This crate is where the
//! collaborator-shaped I/O (§6) meets that pure core, and where precise
//! per-crate errors convert to `anyhow::Error` at the boundary (§11.2).

pub mod artifacts;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod events;
pub mod runner;

pub use collaborators::{Fetch, FetchError, FetchRequest, FetchResponse, Reasoning, ReasoningError, ReasoningRequest, ReasoningResponse, Storage, StorageError};
pub use config::HarvesterConfig;
pub use error::CoreError;
pub use events::{EventSink, NdjsonEventSink, RunEvent, RunEventKind};

/// Re-exports so a downstream composition point can depend on `shc-core`
/// alone for the whole stack.
pub mod prelude {
    pub use shc_bandit::{rank_batch_with_bandit, BanditMode, RankBatchWithBanditArgs};
    pub use shc_contracts::*;
    pub use shc_field_rules::{ContractBundle, ContractBundleSource, FieldRulesEngine};
    pub use shc_frontier::{FrontierPersistence, FrontierState, JsonFrontierPersistence, SqliteFrontierPersistence};
    pub use shc_identity_gate::{evaluate_identity_gate, IdentityGateResult, IdentitySource};
    pub use shc_needset::{compute_need_set, ComputeNeedSetArgs, IdentityContext as NeedSetIdentityContext, IdentityStatus, NeedSetWeights};
    pub use shc_runtime_gate::{apply_runtime_field_rules, evaluate_publish_gate, ApplyRuntimeFieldRulesArgs, GateResult, PublishGateArgs};
    pub use shc_scheduler::{run_convergence_loop, ProductRunner, RoundContext, RoundOutcome, SchedulerConfig};
    pub use shc_tier_retriever::build_tier_aware_field_retrieval;
}
