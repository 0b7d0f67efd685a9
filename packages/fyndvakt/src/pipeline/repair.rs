//! Response repair parser - turn free-form scoring-service text into a
//! validated [`Analysis`].
//!
//! The scoring service enforces no output schema. Replies wrap JSON in
//! prose, carry trailing commas, bare keys, single quotes, raw newlines
//! inside strings, or get truncated mid-object. `parse_analysis` is a total
//! function over all of that:
//!
//! 1. Strip code fences, take the first `{` .. last `}` window, strict parse.
//! 2. Apply deterministic repairs in order (each idempotent), re-parse.
//! 3. Regex-scan for a 1-5 score near the word "score" and build a minimal
//!    fallback result.
//!
//! Whatever parses is then clamped and defaulted field by field, so the
//! caller always receives a well-formed result and never an error.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde_json::Value;

use crate::types::analysis::{Analysis, ProfitEstimate, FALLBACK_MODEL};

/// Confidence stamped on results recovered by the regex fallback stage.
const FALLBACK_CONFIDENCE: f32 = 0.3;

/// How much raw text to keep as reasoning when no JSON could be recovered.
const EXCERPT_CHARS: usize = 200;

/// Parse a raw scoring-service reply. Total: never fails, never panics.
pub fn parse_analysis(raw: &str, model_id: &str) -> Analysis {
    let defenced = strip_code_fences(raw);

    if let Some(window) = object_window(defenced) {
        if let Ok(value) = serde_json::from_str::<Value>(window) {
            return sanitize(&value, model_id);
        }

        let repaired = repair_json(window);
        if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
            return sanitize(&value, model_id);
        }
    }

    fallback_from_text(raw)
}

/// Strip markdown code fences the model sometimes wraps JSON in.
fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// The substring from the first `{` to the last `}`, if any.
fn object_window(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Apply all repair stages in order.
fn repair_json(window: &str) -> String {
    let repaired = strip_trailing_commas(window);
    let repaired = quote_bare_keys(&repaired);
    let repaired = normalize_quotes(&repaired);
    let repaired = escape_control_chars(&repaired);
    balance_closers(&repaired)
}

/// Remove commas that directly precede a closing brace or bracket.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
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
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Quote bare object keys: `{score: 4}` becomes `{"score": 4}`.
fn quote_bare_keys(text: &str) -> String {
    static BARE_KEY: OnceLock<Regex> = OnceLock::new();
    let re = BARE_KEY.get_or_init(|| {
        Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_-]*)\s*:"#).expect("bare-key pattern compiles")
    });
    re.replace_all(text, "$1\"$2\":").into_owned()
}

/// Convert single-quoted strings to double-quoted ones, escaping any double
/// quotes nested inside them.
fn normalize_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                out.push(c);
                escaped = true;
            }
            '"' if in_single => out.push_str("\\\""),
            '"' if !in_single => {
                in_double = !in_double;
                out.push(c);
            }
            '\'' if !in_double => {
                in_single = !in_single;
                out.push('"');
            }
            _ => out.push(c),
        }
    }

    out
}

/// Escape raw control characters inside string literals.
fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    out.push(c);
                    escaped = true;
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }

    out
}

/// Close any unterminated string and append missing `}` / `]` closers.
fn balance_closers(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
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
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut out = text.to_string();
    if in_string {
        out.push('"');
    }
    if !stack.is_empty() {
        // A truncated reply can end in a comma; closing after it would
        // reintroduce the trailing comma the earlier stage removed.
        let trimmed = out.trim_end().len();
        if out[..trimmed].ends_with(',') {
            out.truncate(trimmed - 1);
        }
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

/// Clamp and default every field of a parsed object.
fn sanitize(value: &Value, model_id: &str) -> Analysis {
    let score = value
        .get("score")
        .and_then(score_value)
        .unwrap_or(3)
        .clamp(1, 5) as u8;

    let confidence = value
        .get("confidence")
        .and_then(number_value)
        .filter(|c| c.is_finite())
        .unwrap_or(0.5)
        .clamp(0.0, 1.0) as f32;

    let reasoning = string_field(value, "reasoning", "No reasoning available");
    let recommendation = string_field(value, "recommendation", "No recommendation available");

    let factors = match value.get("factors").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    let factors = if factors.is_empty() {
        vec!["No factors listed".to_string()]
    } else {
        factors
    };

    let profit = value
        .get("profit_analysis")
        .cloned()
        .and_then(|v| serde_json::from_value::<ProfitEstimate>(v).ok());

    Analysis {
        score,
        confidence,
        reasoning,
        factors,
        recommendation,
        profit,
        analyzed_at: Utc::now(),
        model: model_id.to_string(),
    }
}

/// Accept a score as integer, float, or numeric string.
fn score_value(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return f.is_finite().then(|| f.round() as i64);
    }
    v.as_str().and_then(|s| s.trim().parse::<i64>().ok())
}

fn number_value(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn string_field(value: &Value, key: &str, default: &str) -> String {
    match value.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

/// Final stage: no JSON recoverable. Scan for a score near the word "score"
/// and keep an excerpt of the raw text as reasoning.
fn fallback_from_text(raw: &str) -> Analysis {
    static SCORE_NEAR: OnceLock<Regex> = OnceLock::new();
    let re = SCORE_NEAR.get_or_init(|| {
        Regex::new(r"(?i)score\D{0,10}?([1-5])").expect("score pattern compiles")
    });

    let score = re
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .unwrap_or(3);

    let mut excerpt: String = raw.chars().take(EXCERPT_CHARS).collect();
    if raw.chars().count() > EXCERPT_CHARS {
        excerpt.push_str("...");
    }

    Analysis {
        score,
        confidence: FALLBACK_CONFIDENCE,
        reasoning: excerpt,
        factors: vec!["Unstructured response".to_string()],
        recommendation: "Review the raw response manually".to_string(),
        profit: None,
        analyzed_at: Utc::now(),
        model: FALLBACK_MODEL.to_string(),
    }
}
