//! Request parameters for `ask` and `query`, parsed from loosely-typed JSON.
//!
//! Numbers may arrive as JSON numbers or numeric strings. Anything that is
//! not a finite number falls back to the documented default; numbers outside
//! the documented range are truncated toward zero and clamped into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use teidaishu_core::Error;
use teidaishu_core::generation::{MAX_OUTPUT_TOKENS, MIN_OUTPUT_TOKENS};

use crate::search::MAX_TOP_K;

pub const MAX_CHARS_LIMIT: i64 = 20_000;
pub const MAX_DOCS_LIMIT: i64 = 50;

pub const DEFAULT_ASK_TOP_K: i64 = 20;
pub const DEFAULT_MAX_DOCS: i64 = 8;
pub const DEFAULT_CTX_MAX_CHARS: i64 = 1200;
pub const DEFAULT_TEMPERATURE: f64 = 0.4;
pub const DEFAULT_MAX_OUTPUT_TOKENS: i64 = 800;

pub const DEFAULT_QUERY_TOP_K: i64 = 10;
pub const DEFAULT_QUERY_MAX_CHARS: i64 = 1200;

/// Read a value as a finite number, accepting numeric strings.
fn as_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Truncate toward zero and clamp into `[lo, hi]`; non-numbers give `default`.
pub fn clamp_int(value: Option<&Value>, lo: i64, hi: i64, default: i64) -> i64 {
    match as_number(value) {
        Some(n) => (n.trunc() as i64).clamp(lo, hi),
        None => default,
    }
}

/// Truthiness: `false`, `0`, `""`, and `null` are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The question text: `q` if truthy, else `query`, trimmed.
fn read_query(body: &Value) -> Result<String, Error> {
    let raw = [body.get("q"), body.get("query")]
        .into_iter()
        .flatten()
        .find(|v| truthy(v));

    let text = match raw {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    if text.is_empty() {
        return Err(Error::MalformedInput("missing_q".into()));
    }
    Ok(text)
}

fn read_object(body: &Value) -> Result<&serde_json::Map<String, Value>, Error> {
    body.as_object()
        .ok_or_else(|| Error::MalformedInput("bad_json".into()))
}

fn read_filter(body: &serde_json::Map<String, Value>) -> Option<Value> {
    body.get("filter").filter(|f| f.is_object()).cloned()
}

/// Parameters for the answer pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskParams {
    pub query: String,
    pub top_k: u32,
    pub max_docs: usize,
    pub ctx_max_chars: usize,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub dedup_sid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl AskParams {
    /// Defaults for everything except the question.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_ASK_TOP_K as u32,
            max_docs: DEFAULT_MAX_DOCS as usize,
            ctx_max_chars: DEFAULT_CTX_MAX_CHARS as usize,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS as u32,
            dedup_sid: true,
            filter: None,
        }
    }

    /// Parse a request body. Fails only on a non-object body or a missing
    /// question; every other field falls back to its default.
    pub fn from_json(body: &Value) -> Result<Self, Error> {
        let map = read_object(body)?;
        let query = read_query(body)?;

        let temperature = as_number(map.get("temperature")).unwrap_or(DEFAULT_TEMPERATURE);
        let dedup_sid = match map.get("dedup_sid") {
            None => true,
            Some(v) => truthy(v),
        };

        Ok(Self {
            query,
            top_k: clamp_int(map.get("topk"), 1, i64::from(MAX_TOP_K), DEFAULT_ASK_TOP_K) as u32,
            max_docs: clamp_int(map.get("max_docs"), 1, MAX_DOCS_LIMIT, DEFAULT_MAX_DOCS) as usize,
            ctx_max_chars: clamp_int(
                map.get("ctx_max_chars"),
                1,
                MAX_CHARS_LIMIT,
                DEFAULT_CTX_MAX_CHARS,
            ) as usize,
            temperature,
            max_output_tokens: clamp_int(
                map.get("max_output_tokens"),
                i64::from(MIN_OUTPUT_TOKENS),
                i64::from(MAX_OUTPUT_TOKENS),
                DEFAULT_MAX_OUTPUT_TOKENS,
            ) as u32,
            dedup_sid,
            filter: read_filter(map),
        })
    }
}

/// Parameters for the raw similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub query: String,
    pub top_k: u32,
    pub with_text: bool,
    pub max_chars: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl QueryParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_QUERY_TOP_K as u32,
            with_text: false,
            max_chars: DEFAULT_QUERY_MAX_CHARS as usize,
            filter: None,
        }
    }

    pub fn from_json(body: &Value) -> Result<Self, Error> {
        let map = read_object(body)?;
        let query = read_query(body)?;

        Ok(Self {
            query,
            top_k: clamp_int(map.get("topk"), 1, i64::from(MAX_TOP_K), DEFAULT_QUERY_TOP_K) as u32,
            with_text: map.get("with_text").is_some_and(truthy),
            max_chars: clamp_int(
                map.get("max_chars"),
                1,
                MAX_CHARS_LIMIT,
                DEFAULT_QUERY_MAX_CHARS,
            ) as usize,
            filter: read_filter(map),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamp_int_rules() {
        assert_eq!(clamp_int(None, 1, 50, 10), 10);
        assert_eq!(clamp_int(Some(&json!(null)), 1, 50, 10), 10);
        assert_eq!(clamp_int(Some(&json!("abc")), 1, 50, 10), 10);
        assert_eq!(clamp_int(Some(&json!(true)), 1, 50, 10), 10);
        assert_eq!(clamp_int(Some(&json!(7.9)), 1, 50, 10), 7);
        assert_eq!(clamp_int(Some(&json!(" 12 ")), 1, 50, 10), 12);
        assert_eq!(clamp_int(Some(&json!(999)), 1, 50, 10), 50);
        assert_eq!(clamp_int(Some(&json!(-3)), 1, 50, 10), 1);
    }

    #[test]
    fn truthiness() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!("0")));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!({})));
    }

    #[test]
    fn ask_defaults() {
        let params = AskParams::from_json(&json!({"q": "  何か質問  "})).unwrap();
        assert_eq!(params, AskParams::new("何か質問"));
        assert_eq!(params.top_k, 20);
        assert_eq!(params.max_docs, 8);
        assert_eq!(params.ctx_max_chars, 1200);
        assert_eq!(params.temperature, 0.4);
        assert_eq!(params.max_output_tokens, 800);
        assert!(params.dedup_sid);
    }

    #[test]
    fn ask_fields_are_clamped() {
        let params = AskParams::from_json(&json!({
            "query": "hi",
            "topk": 80,
            "max_docs": "3",
            "ctx_max_chars": 50000,
            "temperature": "1.5",
            "max_output_tokens": 0,
            "dedup_sid": 0,
            "filter": {"sub": "japan"}
        }))
        .unwrap();
        assert_eq!(params.top_k, 50);
        assert_eq!(params.max_docs, 3);
        assert_eq!(params.ctx_max_chars, 20000);
        assert_eq!(params.temperature, 1.5);
        assert_eq!(params.max_output_tokens, 1);
        assert!(!params.dedup_sid);
        assert_eq!(params.filter, Some(json!({"sub": "japan"})));
    }

    #[test]
    fn dedup_sid_null_is_false() {
        let params = AskParams::from_json(&json!({"q": "x", "dedup_sid": null})).unwrap();
        assert!(!params.dedup_sid);
    }

    #[test]
    fn q_takes_priority_unless_empty() {
        let params = QueryParams::from_json(&json!({"q": "", "query": "fallback"})).unwrap();
        assert_eq!(params.query, "fallback");
        let params = QueryParams::from_json(&json!({"q": "first", "query": "second"})).unwrap();
        assert_eq!(params.query, "first");
    }

    #[test]
    fn missing_or_blank_question_is_rejected() {
        for body in [json!({}), json!({"q": "   "}), json!({"topk": 3})] {
            let err = AskParams::from_json(&body).unwrap_err();
            assert!(matches!(err, Error::MalformedInput(ref m) if m == "missing_q"));
        }
    }

    #[test]
    fn non_object_body_is_bad_json() {
        for body in [json!(null), json!([1, 2]), json!("q")] {
            let err = QueryParams::from_json(&body).unwrap_err();
            assert!(matches!(err, Error::MalformedInput(ref m) if m == "bad_json"));
        }
    }

    #[test]
    fn query_defaults_and_flags() {
        let params = QueryParams::from_json(&json!({"q": "x"})).unwrap();
        assert_eq!(params, QueryParams::new("x"));
        assert!(!params.with_text);

        let params =
            QueryParams::from_json(&json!({"q": "x", "with_text": 1, "max_chars": 300, "filter": 5}))
                .unwrap();
        assert!(params.with_text);
        assert_eq!(params.max_chars, 300);
        assert!(params.filter.is_none());
    }
}
