//! Core types for PageState

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::Result;

/// Opaque id of one run of a scripted scenario
pub type SessionId = String;

/// Opaque id of a document context within a session
pub type FrameId = String;

/// Derived `type:args` identifier of an assertion
pub type QueryKey = String;

/// Assertions of one frame, keyed by query key
pub type FrameAssertions = IndexMap<QueryKey, Assertion>;

/// Assertions of one session (or one derived state), keyed by frame id
pub type SessionAssertions = IndexMap<FrameId, FrameAssertions>;

/// Observed value of an assertion
///
/// Serialized untagged, so recordings carry plain JSON values. Whole
/// numbers are written as integers (`3`, not `3.0`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum AssertionResult {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Arrays and objects, compared structurally
    Structured(Value),
}

impl AssertionResult {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AssertionResult::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Largest magnitude below which every whole `f64` is an exact integer
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Serialize for AssertionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            AssertionResult::Null => serializer.serialize_unit(),
            AssertionResult::Boolean(b) => serializer.serialize_bool(*b),
            AssertionResult::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            AssertionResult::Number(n) => serializer.serialize_f64(*n),
            AssertionResult::String(s) => serializer.serialize_str(s),
            AssertionResult::Structured(v) => v.serialize(serializer),
        }
    }
}

impl From<Value> for AssertionResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AssertionResult::Null,
            Value::Bool(b) => AssertionResult::Boolean(b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => AssertionResult::Number(f),
                None => AssertionResult::Structured(Value::Number(n)),
            },
            Value::String(s) => AssertionResult::String(s),
            other => AssertionResult::Structured(other),
        }
    }
}

impl From<bool> for AssertionResult {
    fn from(b: bool) -> Self {
        AssertionResult::Boolean(b)
    }
}

impl From<f64> for AssertionResult {
    fn from(n: f64) -> Self {
        AssertionResult::Number(n)
    }
}

impl From<i64> for AssertionResult {
    fn from(n: i64) -> Self {
        AssertionResult::Number(n as f64)
    }
}

impl From<&str> for AssertionResult {
    fn from(s: &str) -> Self {
        AssertionResult::String(s.to_string())
    }
}

impl From<String> for AssertionResult {
    fn from(s: String) -> Self {
        AssertionResult::String(s)
    }
}

impl std::fmt::Display for AssertionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssertionResult::Null => write!(f, "null"),
            AssertionResult::Boolean(b) => write!(f, "{}", b),
            AssertionResult::Number(n) => write!(f, "{}", n),
            AssertionResult::String(s) => write!(f, "{:?}", s),
            AssertionResult::Structured(v) => write!(f, "{}", v),
        }
    }
}

/// Operator under which an assertion's result is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparison {
    #[default]
    #[serde(rename = "=", alias = "===")]
    Equal,
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparison::Equal => write!(f, "="),
            Comparison::AtLeast => write!(f, ">="),
            Comparison::AtMost => write!(f, "<="),
        }
    }
}

/// A single observed fact about page state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// Assertion kind, e.g. `query`, `count`, `url`
    #[serde(rename = "type")]
    pub kind: String,

    /// Arguments characterizing what was checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,

    #[serde(default)]
    pub result: AssertionResult,

    #[serde(default)]
    pub comparison: Comparison,

    /// Derived on first record when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<QueryKey>,
}

impl Assertion {
    pub fn new(kind: impl Into<String>, args: Vec<Value>, result: impl Into<AssertionResult>) -> Self {
        Self {
            kind: kind.into(),
            args: Some(args),
            result: result.into(),
            comparison: Comparison::Equal,
            key: None,
        }
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn with_key(mut self, key: impl Into<QueryKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The stored key, or the one `generate_key` derives for it
    pub fn query_key(&self) -> QueryKey {
        match &self.key {
            Some(key) => key.clone(),
            None => generate_key(&self.kind, self.args.as_deref()),
        }
    }
}

/// Derive the key for a `(type, args)` pair.
///
/// `type` joined by `:` with the compact JSON of `args`, or with an empty
/// string when there are no args. Object members serialize in sorted
/// order, so structurally identical args always yield the same key.
pub fn generate_key(kind: &str, args: Option<&[Value]>) -> QueryKey {
    let args = match args {
        Some(args) => serde_json::to_string(args).unwrap_or_default(),
        None => String::new(),
    };
    format!("{}:{}", kind, args)
}

/// Total number of assertions across all frames of a state
pub fn assertion_count(state: &SessionAssertions) -> usize {
    state.values().map(|frame| frame.len()).sum()
}

/// SHA-256 signature of a state, independent of frame and key order
pub fn state_digest(state: &SessionAssertions) -> Result<String> {
    let canonical: BTreeMap<&str, BTreeMap<&str, &Assertion>> = state
        .iter()
        .map(|(frame_id, frame)| {
            let asserts = frame.iter().map(|(key, a)| (key.as_str(), a)).collect();
            (frame_id.as_str(), asserts)
        })
        .collect();

    let bytes = serde_json::to_vec(&canonical)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
