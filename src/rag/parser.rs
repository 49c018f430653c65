//! Validation of free-text provider output into an [`AnswerResult`]
//!
//! This is the only place that trusts the shape of provider output. Every
//! field is coerced and defaulted here; nothing downstream sees raw JSON.

use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::models::AnswerResult;
use crate::models::Confidence;

/// Gap reported when no usable JSON object could be extracted
pub const PARSE_FAILURE_GAP: &str = "Unable to parse structured response";

/// Turns raw provider text into an [`AnswerResult`]. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse the first top-level JSON object found in `raw`.
    ///
    /// Malformed output degrades to a low-confidence passthrough of `raw`.
    #[must_use]
    pub fn parse(&self, raw: &str) -> AnswerResult {
        match find_json_object(raw) {
            Some(object) => coerce(object, raw),
            None => {
                warn!("Provider output contained no parseable JSON object; passing text through");
                fallback(raw)
            }
        }
    }
}

fn fallback(raw: &str) -> AnswerResult {
    AnswerResult {
        answer: raw.to_string(),
        confidence: Confidence::Low,
        key_points: Vec::new(),
        gaps: vec![PARSE_FAILURE_GAP.to_string()],
        sources_used: Vec::new(),
    }
}

fn coerce(object: Map<String, Value>, raw: &str) -> AnswerResult {
    let answer = match object.get("answer") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => raw.to_string(),
    };

    let confidence = match object.get("confidence") {
        Some(Value::String(s)) => Confidence::parse_lenient(s).unwrap_or_else(|| {
            debug!("Coercing unknown confidence '{}' to low", s);
            Confidence::Low
        }),
        _ => Confidence::Low,
    };

    AnswerResult {
        answer,
        confidence,
        key_points: string_array(object.get("key_points")),
        gaps: string_array(object.get("gaps")),
        sources_used: index_array(object.get("sources_used")),
    }
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn index_array(value: Option<&Value>) -> Vec<usize> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            if let Some(n) = item.as_u64() {
                return usize::try_from(n).ok();
            }
            // Some models emit 2.0 for 2
            item.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as usize)
        })
        .collect()
}

/// First balanced `{...}` span in `text` that parses as a JSON object.
///
/// Spans that fail to parse are skipped as a whole, so an object nested in
/// broken JSON is never mistaken for the answer.
fn find_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut offset = 0;
    while let Some(start) = text[offset..].find('{').map(|i| i + offset) {
        let end = balanced_end(&text[start..])? + start;
        match serde_json::from_str::<Value>(&text[start..end]) {
            Ok(Value::Object(object)) => return Some(object),
            _ => offset = end,
        }
    }
    None
}

/// Byte length of the balanced object opening at `text[0]`.
///
/// Braces inside JSON strings are ignored.
pub(crate) fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> AnswerResult {
        ResponseParser::new().parse(raw)
    }

    #[test]
    fn test_plain_prose_passes_through() {
        let raw = "The refund window is 30 days, I think.";
        let result = parse(raw);
        assert_eq!(result.answer, raw);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.gaps, vec![PARSE_FAILURE_GAP.to_string()]);
        assert!(result.key_points.is_empty());
        assert!(result.sources_used.is_empty());
    }

    #[test]
    fn test_well_formed_object() {
        let raw = r#"{"answer":"Refunds take 30 days [policy.pdf, Refunds]","confidence":"high","key_points":["30 days"],"gaps":[],"sources_used":[0,2]}"#;
        let result = parse(raw);
        assert_eq!(result.answer, "Refunds take 30 days [policy.pdf, Refunds]");
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.key_points, vec!["30 days".to_string()]);
        assert!(result.gaps.is_empty());
        assert_eq!(result.sources_used, vec![0, 2]);
    }

    #[test]
    fn test_object_wrapped_in_prose_and_fences() {
        let raw = "Sure! Here you go:\n```json\n{\"answer\": \"Yes.\", \"confidence\": \"medium\", \"sources_used\": [1]}\n```\nHope that helps.";
        let result = parse(raw);
        assert_eq!(result.answer, "Yes.");
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.sources_used, vec![1]);
    }

    #[test]
    fn test_invalid_confidence_becomes_low() {
        let result = parse(r#"{"answer":"ok","confidence":"urgent","sources_used":[0]}"#);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.answer, "ok");
        assert_eq!(result.sources_used, vec![0]);
    }

    #[test]
    fn test_wrong_field_types_default() {
        let raw = r#"{"answer":"ok","confidence":3,"key_points":"one","gaps":null,"sources_used":"0,1"}"#;
        let result = parse(raw);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.key_points.is_empty());
        assert!(result.gaps.is_empty());
        assert!(result.sources_used.is_empty());
    }

    #[test]
    fn test_missing_answer_defaults_to_raw_text() {
        let raw = r#"{"confidence":"high"}"#;
        let result = parse(raw);
        assert_eq!(result.answer, raw);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_source_indices_keep_only_non_negative_integers() {
        let result = parse(r#"{"answer":"a","sources_used":[0,-1,2.0,1.5,"3",4]}"#);
        assert_eq!(result.sources_used, vec![0, 2, 4]);
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let raw = r#"{"answer":"use {curly} braces } carefully","confidence":"low"}"#;
        assert_eq!(parse(raw).answer, "use {curly} braces } carefully");
    }

    #[test]
    fn test_broken_json_falls_back() {
        for raw in [
            "{\"answer\": \"unterminated",
            "{answer: no quotes}",
            "{{}",
            "",
            "}",
            "[1, 2, 3]",
        ] {
            let result = parse(raw);
            assert_eq!(result.answer, raw, "input {raw:?}");
            assert_eq!(result.gaps, vec![PARSE_FAILURE_GAP.to_string()], "input {raw:?}");
        }
    }

    #[test]
    fn test_skips_unparseable_span_before_real_object() {
        let raw = r#"Context {not json} then {"answer":"found","confidence":"medium"}"#;
        let result = parse(raw);
        assert_eq!(result.answer, "found");
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[test]
    fn test_balanced_end_handles_escapes() {
        let text = r#"{"a":"quote \" and brace }"} trailing"#;
        let end = balanced_end(text).unwrap();
        assert_eq!(&text[..end], r#"{"a":"quote \" and brace }"}"#);
    }
}
