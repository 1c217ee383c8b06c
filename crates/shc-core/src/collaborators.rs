//! External collaborator contracts (§6 "External interfaces"). The core
//! treats the CLI/GUI surfaces, the control-plane workbook compiler, the LLM
//! client, and the HTML fetcher as external; only these narrow contracts are
//! named. Implementations live outside this crate — production code injects
//! a concrete object-store-backed `Storage`, an HTTP `Fetch`, and a
//! model-API `Reasoning`; tests inject in-memory fakes.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures from any collaborator call. Per §7 "Persistence", a `Storage`
/// write failure bubbles to the scheduler as a terminal product failure
/// rather than being recovered locally like a validation failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed for {key}: {detail}")]
    ReadFailed { key: String, detail: String },
    #[error("storage write failed for {key}: {detail}")]
    WriteFailed { key: String, detail: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch timed out after {timeout_ms}ms: {url}")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("fetch transport error for {url}: {detail}")]
    Transport { url: String, detail: String },
}

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning call budget exhausted")]
    BudgetExhausted,
    #[error("reasoning response was not well-formed JSON: {detail}")]
    MalformedResponse { detail: String },
    #[error("reasoning transport error: {detail}")]
    Transport { detail: String },
}

/// `{readJsonOrNull, readTextOrNull, writeObject, resolveOutputKey,
/// objectExists}` (§6). The core assumes neither filesystem nor object
/// store semantics beyond these five operations.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn read_json_or_null(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;
    async fn read_text_or_null(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn write_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;
    fn resolve_output_key(&self, parts: &[&str]) -> String;
    async fn object_exists(&self, key: &str) -> Result<bool, StorageError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout_ms: u64,
}

/// `{status, bytes, final_url, text_hash, page_content_hash, trace}` (§6).
/// The core treats all HTTP semantics through `status`; it never inspects
/// headers itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub final_url: String,
    pub text_hash: String,
    pub page_content_hash: String,
    pub trace: String,
}

#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningRequest {
    pub model: String,
    pub messages: Vec<ReasoningMessage>,
    pub max_tokens: u32,
    pub reasoning_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningChoiceMessage {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningChoice {
    pub message: ReasoningChoiceMessage,
}

/// `{choices: [{message: {content}}], usage: {prompt_tokens,
/// completion_tokens}}` (§6). The core pays per the ledger entry it
/// produces from `usage`; per Design Note §9 "LLM responses" every response
/// is treated as untrusted JSON, parsed and validated against a typed
/// shape before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningResponse {
    pub choices: Vec<ReasoningChoice>,
    pub usage: ReasoningUsage,
}

#[async_trait]
pub trait Reasoning: Send + Sync {
    async fn complete(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError>;
}
