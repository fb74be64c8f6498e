//! Normalization of raw provider responses.
//!
//! Provider responses vary in shape, so text and usage are read by ordered
//! lists of extractors. The first extractor that finds something wins.

use serde_json::Value;

use super::types::{ChatReply, TokenUsage};

type TextExtractor = fn(&Value) -> Option<String>;
type UsageProbe = fn(&Value) -> Option<&Value>;

const TEXT_EXTRACTORS: &[TextExtractor] = &[direct_text, candidate_parts, raw_string];
const USAGE_PROBES: &[UsageProbe] = &[usage_metadata, nested_usage_metadata, generic_usage];

/// Normalize a raw response into content plus usage.
pub fn normalize(raw: &Value) -> ChatReply {
    ChatReply {
        content: extract_text(raw),
        usage: extract_usage(raw),
    }
}

/// Reply text, or an empty string when no known shape matches.
pub fn extract_text(raw: &Value) -> String {
    TEXT_EXTRACTORS
        .iter()
        .find_map(|extract| extract(raw))
        .unwrap_or_default()
}

/// Token usage from the first usage location present. Missing counters are 0.
pub fn extract_usage(raw: &Value) -> TokenUsage {
    let Some(usage) = USAGE_PROBES.iter().find_map(|probe| probe(raw)) else {
        return TokenUsage::default();
    };
    let count = |field: &str| usage.get(field).and_then(Value::as_u64).unwrap_or(0);
    TokenUsage {
        prompt_token_count: count("promptTokenCount"),
        candidates_token_count: count("candidatesTokenCount"),
        total_token_count: count("totalTokenCount"),
    }
}

// ============================================================================
// Text extractors
// ============================================================================

/// `{"text": "..."}`. An empty string counts as absent.
fn direct_text(raw: &Value) -> Option<String> {
    raw.get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// `{"candidates": [{"content": {"parts": [{"text": "..."}, ...]}}]}`, parts joined.
fn candidate_parts(raw: &Value) -> Option<String> {
    let parts = raw
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    Some(
        parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect(),
    )
}

/// The response is itself a string.
fn raw_string(raw: &Value) -> Option<String> {
    raw.as_str().map(String::from)
}

// ============================================================================
// Usage probes
// ============================================================================

fn usage_metadata(raw: &Value) -> Option<&Value> {
    present(raw.get("usageMetadata"))
}

fn nested_usage_metadata(raw: &Value) -> Option<&Value> {
    present(raw.get("usage")?.get("metadata"))
}

fn generic_usage(raw: &Value) -> Option<&Value> {
    present(raw.get("usage"))
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
