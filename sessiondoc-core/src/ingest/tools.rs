//! Tool-invocation extraction
//!
//! Recognizes tool calls written in several notations. The primary notation
//! is the invocation tag:
//!
//! ```text
//! <invoke name="read_file">
//! <parameter name="target_file">src/main.rs</parameter>
//! </invoke>
//! ```
//!
//! Only when the primary notation matches nothing are the fallbacks tried, in
//! order: a key/value call description (`{"tool": "grep", "args": {...}}`), a
//! `<tool name="...">...</tool>` tag, and bare `name(arg=value)` calls. The
//! first fallback that yields any call wins; notations are never merged.

use crate::types::{Arguments, LogicalClock, ToolUsage};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static INVOKE_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<invoke\s+name=["']([^"']+)["']"#).unwrap());

static PARAMETER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<parameter\s+name=["']([^"']+)["']\s*>(.*?)</parameter>"#).unwrap()
});

static KEY_VALUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{["']tool["']\s*:\s*["'](\w+)["'].*?["']args["']\s*:\s*(\{[^}]+\})"#)
        .unwrap()
});

static TOOL_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<tool\s+name=["'](\w+)["']>(.*?)</tool>"#).unwrap()
});

static FUNCTION_CALL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*\(\s*([^)]+)\)").unwrap());

static KEYWORD_ARG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^,\s)]+))"#).unwrap()
});

/// The notation a tool call was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notation {
    /// `<invoke name="...">` (primary)
    InvokeTag,
    /// `{"tool": "...", "args": {...}}`
    KeyValue,
    /// `<tool name="...">...</tool>`
    ToolTag,
    /// `name(arg=value, ...)`
    FunctionCall,
}

impl Notation {
    /// Fallback notations in priority order.
    pub const FALLBACKS: [Notation; 3] =
        [Notation::KeyValue, Notation::ToolTag, Notation::FunctionCall];

    pub fn as_str(&self) -> &'static str {
        match self {
            Notation::InvokeTag => "invoke_tag",
            Notation::KeyValue => "key_value",
            Notation::ToolTag => "tool_tag",
            Notation::FunctionCall => "function_call",
        }
    }

    /// Scan the whole text for non-overlapping calls in this notation.
    ///
    /// Private-looking names (leading underscore) are dropped in the fallback
    /// notations only.
    fn scan(&self, content: &str) -> Vec<RawCall> {
        let calls: Vec<RawCall> = match self {
            Notation::InvokeTag => INVOKE_TAG_REGEX
                .captures_iter(content)
                .map(|caps| {
                    let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
                    RawCall {
                        name: caps[1].to_string(),
                        arguments: parse_parameter_tags(invoke_body(content, whole)),
                    }
                })
                .collect(),
            Notation::KeyValue => KEY_VALUE_REGEX
                .captures_iter(content)
                .map(|caps| RawCall {
                    name: caps[1].to_string(),
                    arguments: parse_json_object(&caps[2]),
                })
                .collect(),
            Notation::ToolTag => TOOL_TAG_REGEX
                .captures_iter(content)
                .map(|caps| {
                    let body = caps[2].trim();
                    let mut arguments = parse_json_object(body);
                    if arguments.is_empty() {
                        arguments = parse_parameter_tags(body);
                    }
                    RawCall {
                        name: caps[1].to_string(),
                        arguments,
                    }
                })
                .collect(),
            Notation::FunctionCall => FUNCTION_CALL_REGEX
                .captures_iter(content)
                .map(|caps| RawCall {
                    name: caps[1].to_string(),
                    arguments: parse_keyword_args(&caps[2]),
                })
                .collect(),
        };

        if *self == Notation::InvokeTag {
            return calls;
        }
        calls
            .into_iter()
            .filter(|call| !call.name.starts_with('_'))
            .collect()
    }
}

impl std::fmt::Display for Notation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A call recognized by a notation, before timestamps are assigned.
#[derive(Debug)]
struct RawCall {
    name: String,
    arguments: Arguments,
}

/// Result of one extraction pass.
#[derive(Debug, Default)]
pub struct ToolExtraction {
    /// Which notation produced the calls; `None` when nothing matched
    pub notation: Option<Notation>,
    /// Calls in document order
    pub usages: Vec<ToolUsage>,
}

/// Extracts [`ToolUsage`] events from session text.
///
/// The logical clock persists across calls, so timestamps keep increasing
/// when several transcripts are loaded into one session.
#[derive(Debug, Clone)]
pub struct ToolExtractor {
    clock: LogicalClock,
}

impl ToolExtractor {
    /// Create an extractor whose first call is stamped at `origin`.
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self {
            clock: LogicalClock::new(origin),
        }
    }

    /// Current logical time (the stamp the next call would receive).
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Extract all tool calls from `content`.
    pub fn extract(&mut self, content: &str) -> ToolExtraction {
        let Some((notation, calls)) = std::iter::once(Notation::InvokeTag)
            .chain(Notation::FALLBACKS)
            .map(|notation| (notation, notation.scan(content)))
            .find(|(_, calls)| !calls.is_empty())
        else {
            tracing::debug!("no tool calls found");
            return ToolExtraction::default();
        };

        let usages: Vec<ToolUsage> = calls
            .into_iter()
            .map(|call| ToolUsage::new(call.name, self.clock.tick(), call.arguments))
            .collect();

        tracing::debug!(
            notation = %notation,
            count = usages.len(),
            "extracted tool calls"
        );

        ToolExtraction {
            notation: Some(notation),
            usages,
        }
    }

    pub fn reset(&mut self) {
        self.clock.reset();
    }
}

/// Text between an invocation tag and its closing tag (or the next invocation).
fn invoke_body(content: &str, start: usize) -> &str {
    let rest = &content[start..];
    let end = [rest.find("</invoke>"), rest.find("<invoke")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    &rest[..end]
}

fn parse_parameter_tags(body: &str) -> Arguments {
    PARAMETER_REGEX
        .captures_iter(body)
        .map(|caps| (caps[1].to_string(), Value::String(caps[2].trim().to_string())))
        .collect()
}

/// Parse a JSON object, returning an empty map for anything else.
fn parse_json_object(text: &str) -> Arguments {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Arguments::new(),
        Err(e) => {
            tracing::trace!(error = %e, "tool arguments are not a JSON object");
            Arguments::new()
        }
    }
}

fn parse_keyword_args(text: &str) -> Arguments {
    KEYWORD_ARG_REGEX
        .captures_iter(text)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            (caps[1].to_string(), Value::String(value.to_string()))
        })
        .collect()
}
