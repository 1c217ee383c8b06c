//! Structured event log (§6 "Published artifacts" — `run_events.ndjson`,
//! §9 Design Note "Event stream": "prefer appending a structured row to
//! emitting ad-hoc metrics"). `EventSink` ties `tracing` spans and the
//! append-only ndjson stream to a single source of truth (§11.1): every
//! site that would otherwise emit a metric instead appends a `RunEvent`
//! row, and the sink is free to also forward it to `tracing` for local
//! observability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collaborators::{Storage, StorageError};

/// The event kinds enumerated in §6. `payload` carries kind-specific
/// detail as a JSON blob rather than a per-kind struct, since the spec
/// does not fix a shape per kind beyond naming them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEventKind {
    RunStarted,
    SearchStarted,
    SearchFinished,
    FetchStarted,
    FetchFinished,
    ParseFinished,
    LlmStarted,
    VisualAssetCaptured,
    NeedsetComputed,
    SchedulerFallbackStarted,
    SchedulerFallbackSucceeded,
    SchedulerFallbackExhausted,
    ConvergenceRoundStarted,
    ConvergenceRoundCompleted,
    ConvergenceStop,
    RunCompleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub run_id: String,
    pub kind: RunEventKind,
    pub timestamp: String,
    pub payload: serde_json::Value,
}

/// A sink for `RunEvent` rows. Implementations append to
/// `run_events.ndjson` through the `Storage` collaborator; `record` also
/// emits a `tracing::debug!` so the same event shows up in the log stream
/// without a second write path.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, event: RunEvent) -> Result<(), StorageError>;
}

/// Appends one ndjson line per event to `{helperFilesRoot}/run_events.ndjson`
/// via `Storage::write_object`. Each call reads the existing blob, appends
/// a line, and writes it back; acceptable because events are emitted from
/// the single product worker (§5 "Shared resources").
pub struct NdjsonEventSink<'a> {
    storage: &'a dyn Storage,
    key: String,
}

impl<'a> NdjsonEventSink<'a> {
    pub fn new(storage: &'a dyn Storage, key: impl Into<String>) -> Self {
        NdjsonEventSink { storage, key: key.into() }
    }
}

#[async_trait]
impl<'a> EventSink for NdjsonEventSink<'a> {
    async fn record(&self, event: RunEvent) -> Result<(), StorageError> {
        let line = serde_json::to_string(&event).map_err(|e| StorageError::WriteFailed {
            key: self.key.clone(),
            detail: e.to_string(),
        })?;
        debug!(run_id = %event.run_id, kind = ?event.kind, "run event recorded");

        let mut existing = self
            .storage
            .read_text_or_null(&self.key)
            .await?
            .unwrap_or_default();
        if !existing.is_empty() && !existing.ends_with('\n') {
            existing.push('\n');
        }
        existing.push_str(&line);
        existing.push('\n');

        self.storage
            .write_object(&self.key, existing.into_bytes(), "application/x-ndjson")
            .await
    }
}
