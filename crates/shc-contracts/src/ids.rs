//! Stable, content-derived identifiers.
//!
//! `doc_id` and `snippet_id` must be byte-equal across invocations for the
//! same inputs (§8 "round-trip/idempotence laws"); both are derived from a
//! truncated SHA-256 digest.

use sha2::{Digest, Sha256};

fn first16_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let hex = hex_encode(&digest);
    hex[..16].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// `doc_id = "doc_" + first16(sha256(content_hash|parser_version))`.
pub fn generate_doc_id(content_hash: &str, parser_version: &str) -> String {
    format!("doc_{}", first16_hex(&format!("{}|{}", content_hash, parser_version)))
}

/// `snippet_id = "sn_" + first16(sha256(content_hash|parser_version|chunk_index))`.
///
/// Stable across re-indexing of identical content: the same document
/// re-ingested with the same parser version produces the same snippet IDs
/// for the same chunk indices.
pub fn generate_stable_snippet_id(
    content_hash: &str,
    parser_version: &str,
    chunk_index: usize,
) -> String {
    format!(
        "sn_{}",
        first16_hex(&format!("{}|{}|{}", content_hash, parser_version, chunk_index))
    )
}
