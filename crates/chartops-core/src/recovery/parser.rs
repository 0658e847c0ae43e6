//! Stages 3 and 4: strict parse, then one quote-repairing retry
//!
//! The single retry is a type transition: a [`CleanCandidate`] can be turned
//! into a [`RepairedCandidate`] exactly once, and a repaired candidate has no
//! way to be repaired again.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::command::FieldMapping;
use crate::error::StructuralParseError;

lazy_static! {
    /// `key : value` with optional single or double quotes on either side.
    /// Unquoted values run up to the next comma, brace or bracket.
    static ref KEY_VALUE: Regex = Regex::new(
        r#"(?:"(\w+)"|'(\w+)'|(\w+))\s*:\s*(?:"([^"]*)"|'([^']*)'|([^,}\]]+))"#
    )
    .unwrap();
    static ref NUMERIC_LITERAL: Regex =
        Regex::new(r"^-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?$").unwrap();
}

/// Parse `candidate` as exactly one object.
///
/// Scalars are kept as text, `null` members are treated as absent, nested
/// values keep their compact serialized form.
pub fn parse_strict(candidate: &str) -> Result<FieldMapping, StructuralParseError> {
    match serde_json::from_str::<Value>(candidate)? {
        Value::Object(members) => Ok(members
            .into_iter()
            .filter_map(|(key, value)| member_text(value).map(|text| (key, text)))
            .collect()),
        Value::Array(_) => Err(StructuralParseError::NotAnObject("an array")),
        Value::String(_) => Err(StructuralParseError::NotAnObject("a string")),
        Value::Number(_) => Err(StructuralParseError::NotAnObject("a number")),
        Value::Bool(_) => Err(StructuralParseError::NotAnObject("a boolean")),
        Value::Null => Err(StructuralParseError::NotAnObject("null")),
    }
}

fn member_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Rebuild every `key : value` token with conformant quoting
pub fn repair_quotes(candidate: &str) -> String {
    KEY_VALUE
        .replace_all(candidate, |caps: &Captures<'_>| {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            let value = caps
                .get(4)
                .or_else(|| caps.get(5))
                .or_else(|| caps.get(6))
                .map_or("", |m| m.as_str());
            render_pair(key, value.trim())
        })
        .into_owned()
}

fn render_pair(key: &str, value: &str) -> String {
    if is_bare_literal(value) {
        format!("\"{}\": {}", key, value)
    } else {
        format!("\"{}\": \"{}\"", key, value.replace('"', "\\\""))
    }
}

fn is_bare_literal(value: &str) -> bool {
    matches!(value, "true" | "false" | "null") || NUMERIC_LITERAL.is_match(value)
}

/// Candidate text that has not been through quote repair.
///
/// Deliberately neither `Clone` nor `Copy`: [`repair`](Self::repair) consumes it.
///
/// ```compile_fail
/// use chartops_core::recovery::CleanCandidate;
///
/// let clean = CleanCandidate::new("{plotName:a,operation:delete}");
/// let _first = clean.repair();
/// let _second = clean.repair();
/// ```
#[derive(Debug)]
pub struct CleanCandidate<'a> {
    text: &'a str,
}

impl<'a> CleanCandidate<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn parse(&self) -> Result<FieldMapping, StructuralParseError> {
        parse_strict(self.text)
    }

    /// Spend the one permitted repair
    pub fn repair(self) -> RepairedCandidate {
        RepairedCandidate {
            text: repair_quotes(self.text),
        }
    }
}

/// Candidate text after its single quote repair
#[derive(Debug, Clone)]
pub struct RepairedCandidate {
    text: String,
}

impl RepairedCandidate {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn parse(&self) -> Result<FieldMapping, StructuralParseError> {
        parse_strict(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_parse_object() {
        let mapping =
            parse_strict(r#"{"plotName":"a","operation":"delete","extra":null,"n":3}"#).unwrap();

        assert_eq!(mapping.get("plotName"), Some("a"));
        assert_eq!(mapping.get("n"), Some("3"));
        assert!(!mapping.contains_key("extra"));
    }

    #[test]
    fn test_strict_parse_rejects_non_objects() {
        assert!(matches!(
            parse_strict(r#"["plotName"]"#),
            Err(StructuralParseError::NotAnObject("an array"))
        ));
        assert!(matches!(
            parse_strict(r#"{"plotName":"a",}"#),
            Err(StructuralParseError::Syntax(_))
        ));
        assert!(parse_strict("").is_err());
    }

    #[test]
    fn test_repair_quotes_unquoted_keys_and_values() {
        let repaired = repair_quotes("{plotName:sales chart,operation:'create',size:3,hidden:false}");
        assert_eq!(
            repaired,
            r#"{"plotName": "sales chart","operation": "create","size": 3,"hidden": false}"#
        );

        let mapping = parse_strict(&repaired).unwrap();
        assert_eq!(mapping.get("plotName"), Some("sales chart"));
        assert_eq!(mapping.get("size"), Some("3"));
    }

    #[test]
    fn test_repair_escapes_embedded_quotes() {
        let repaired = repair_quotes(r#"{plotName:say "hi",operation:delete}"#);
        let mapping = parse_strict(&repaired).unwrap();
        assert_eq!(mapping.get("plotName"), Some(r#"say "hi""#));
    }

    #[test]
    fn test_bare_literals() {
        assert!(is_bare_literal("null"));
        assert!(is_bare_literal("-2.5"));
        assert!(is_bare_literal("1e3"));
        assert!(!is_bare_literal("True"));
        assert!(!is_bare_literal("1-2"));
        assert!(!is_bare_literal("007"));
        assert!(!is_bare_literal("-01.5"));
        assert!(is_bare_literal("0.5"));
        assert!(!is_bare_literal("BayCode"));
    }

    #[test]
    fn test_single_repair_transition() {
        let clean = CleanCandidate::new("{'plotName':'a','operation':'delete'}");
        assert!(clean.parse().is_err());

        let repaired = clean.repair();
        let mapping = repaired.parse().unwrap();
        assert_eq!(mapping.get("operation"), Some("delete"));
    }

    #[test]
    fn test_leading_zeros_are_quoted() {
        let repaired = repair_quotes("{plotName:007,operation:delete}");
        assert_eq!(repaired, r#"{"plotName": "007","operation": "delete"}"#);
        assert_eq!(parse_strict(&repaired).unwrap().get("plotName"), Some("007"));
    }

    #[test]
    fn test_repair_cannot_fix_truncation() {
        let repaired = CleanCandidate::new(r#"{"plotName":"a","operation":"del"#).repair();
        assert!(repaired.parse().is_err());
    }
}
