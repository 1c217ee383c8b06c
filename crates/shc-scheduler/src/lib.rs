//! Convergence Scheduler (§4.G): the multi-round control loop that drives a
//! single product run from an empty provenance map to a stop decision.
//!
//! This crate owns round shaping (`round_config`), stop-condition tracking
//! (`stop`), and the loop itself (`loop_`); it depends on `shc-needset` for
//! the NeedSet-driven dispatch between rounds and on `shc-field-rules` for
//! field contract lookups, but knows nothing about how a round is actually
//! executed — that's the `ProductRunner` trait's job, implemented by the
//! composition root.

mod config;
mod error;
mod loop_;
mod round_config;
mod stop;
mod types;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use loop_::{preview_dispatch, run_convergence_loop, ProductRunner, RunConvergenceLoopArgs};
pub use round_config::{
    build_round_config, select_round_search_provider, should_force_expected_field_retry,
    BuildRoundConfigArgs, RoundConfig, RoundProfile, SearchProvider,
};
pub use stop::{evaluate_stop_conditions, ConvergenceCounters};
pub use types::{
    ConvergenceResult, Mode, Progress, QueryPlan, RoundContext, RoundOutcome, RoundRecord,
    StopReason, UnknownReason,
};
