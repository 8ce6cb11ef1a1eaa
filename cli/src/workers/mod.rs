// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deterministic stand-in workers
//!
//! One module per swarm. None of these talk to a real platform; they derive
//! every number from the input text so the same request always produces the
//! same pipeline report.

pub mod content;
pub mod distribution;
pub mod research;
pub mod safety;

pub use content::{ScriptWriter, ThumbnailDesigner};
pub use distribution::{NetworkAnnouncer, PlatformPublisher};
pub use research::{NicheAnalyst, TrendFetcher};
pub use safety::{ContentModerator, HumanReviewGate};

use serde_json::{Map, Value};

/// FNV-1a over the input bytes. Stable across runs and platforms.
pub(crate) fn stable_hash(input: &str) -> u64 {
    input.bytes().fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Locate the content draft inside a `content_data` payload.
///
/// Accepts either a bare draft (`{"title": ..., "script": ...}`) or a
/// content phase result (`{"results": [envelope...], "phase": "content"}`),
/// in which case the first successful envelope whose result has a `title`
/// is used. Returns an empty map when nothing matches.
pub fn resolve_draft(content_data: &Value) -> Map<String, Value> {
    if content_data.get("title").is_some() {
        return content_data.as_object().cloned().unwrap_or_default();
    }

    content_data
        .get("results")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|envelope| envelope.get("status").and_then(Value::as_str) == Some("success"))
        .filter_map(|envelope| envelope.get("result").and_then(Value::as_object))
        .find(|result| result.contains_key("title"))
        .cloned()
        .unwrap_or_default()
}

pub(crate) fn draft_str<'a>(draft: &'a Map<String, Value>, key: &str) -> &'a str {
    draft.get(key).and_then(Value::as_str).unwrap_or_default()
}
