//! Rule derivation
//!
//! Turns the expectation map of an [`EndpointSpec`](crate::EndpointSpec) into
//! a [`RuleSet`]: one natural-language rule per field, ready to be sent to the
//! validation oracle.
//!
//! An expectation is authored either as a terse example value (`"blue"`, `3`,
//! `["#fff"]`) or as an explicit instruction (`"must be one of: 16:9, 1:1"`).
//! The two are told apart by [`classify_text`], the single heuristic decision
//! point of this module.
//!
//! Derivation is pure and total: every descriptor maps to a rule, degenerate
//! inputs map to permissive rules, and no I/O is performed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Text longer than this many characters is always taken as an instruction.
pub const INSTRUCTION_MIN_LENGTH: usize = 20;

/// Rule emitted for null or absent descriptors
pub const OPTIONAL_RULE: &str = "field is optional.";

/// Rule emitted for nested object descriptors
pub const OBJECT_RULE: &str = "must be an object matching the expected structure.";

/// Field name to natural-language rule, ordered by field name.
pub type RuleSet = BTreeMap<String, String>;

/// Expectation descriptor for a single payload field
///
/// Deserializes from any JSON/YAML value, so configuration can mix example
/// values and instructions freely:
///
/// ```yaml
/// expected_fields:
///   prompt: must be a non-empty string describing the image
///   style: blue
///   count: 3
///   note: ~
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Expectation {
    /// `null` or absent: no constraint
    Optional,
    /// Author-supplied instruction, used verbatim
    Instruction(String),
    /// Example string value, used only to infer the type
    Example(String),
    /// Example number
    Number(Number),
    /// Example boolean
    Boolean(bool),
    /// Example array
    Array(Vec<Value>),
    /// Example nested structure
    Object(Map<String, Value>),
}

/// How a free-text descriptor is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Instruction,
    Example,
}

/// Decide whether a text descriptor is an instruction or an example value.
///
/// Text is an instruction when it is longer than [`INSTRUCTION_MIN_LENGTH`]
/// characters or contains one of `must`, `should`, `required`, `valid`,
/// `match`, `be a`, `be an` anywhere in it (case-insensitive substring, so
/// `invalid email` and `matches ^a` count too).
pub fn classify_text(text: &str) -> TextKind {
    if text.chars().count() > INSTRUCTION_MIN_LENGTH || instruction_pattern().is_match(text) {
        TextKind::Instruction
    } else {
        TextKind::Example
    }
}

fn instruction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(must|should|required|valid|match|be an?)")
            .expect("instruction keyword pattern is a valid regex")
    })
}

impl Expectation {
    /// Build a text expectation, classifying it as instruction or example
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        match classify_text(&text) {
            TextKind::Instruction => Expectation::Instruction(text),
            TextKind::Example => Expectation::Example(text),
        }
    }

    /// The natural-language rule for this descriptor
    pub fn rule(&self) -> String {
        match self {
            Expectation::Optional => OPTIONAL_RULE.to_string(),
            Expectation::Instruction(text) => text.clone(),
            Expectation::Example(text) => {
                format!("must be a non-empty string (example: `{}`)", text)
            }
            Expectation::Number(n) => format!("must be a number (example: `{}`)", n),
            Expectation::Boolean(b) => format!("must be a boolean (example: `{}`)", b),
            Expectation::Array(items) if items.is_empty() => "must be an array".to_string(),
            Expectation::Array(items) => {
                format!("must be an array with {} element(s)", items.len())
            }
            Expectation::Object(_) => OBJECT_RULE.to_string(),
        }
    }

    /// Short type label
    pub fn kind(&self) -> &'static str {
        match self {
            Expectation::Optional => "optional",
            Expectation::Instruction(_) => "instruction",
            Expectation::Example(_) => "string",
            Expectation::Number(_) => "number",
            Expectation::Boolean(_) => "boolean",
            Expectation::Array(_) => "array",
            Expectation::Object(_) => "object",
        }
    }
}

impl From<Value> for Expectation {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Expectation::Optional,
            Value::String(s) => Expectation::text(s),
            Value::Number(n) => Expectation::Number(n),
            Value::Bool(b) => Expectation::Boolean(b),
            Value::Array(items) => Expectation::Array(items),
            Value::Object(map) => Expectation::Object(map),
        }
    }
}

impl From<Expectation> for Value {
    fn from(expectation: Expectation) -> Self {
        match expectation {
            Expectation::Optional => Value::Null,
            Expectation::Instruction(s) | Expectation::Example(s) => Value::String(s),
            Expectation::Number(n) => Value::Number(n),
            Expectation::Boolean(b) => Value::Bool(b),
            Expectation::Array(items) => Value::Array(items),
            Expectation::Object(map) => Value::Object(map),
        }
    }
}

impl From<&str> for Expectation {
    fn from(text: &str) -> Self {
        Expectation::text(text)
    }
}

/// Derive one rule per expected field.
pub fn derive(expected_fields: &BTreeMap<String, Expectation>) -> RuleSet {
    expected_fields
        .iter()
        .map(|(field, expectation)| (field.clone(), expectation.rule()))
        .collect()
}

/// Derive rules straight from a JSON object of descriptors.
///
/// Non-object input has no fields and yields an empty rule set.
pub fn derive_from_json(expected_fields: &Value) -> RuleSet {
    match expected_fields {
        Value::Object(map) => map
            .iter()
            .map(|(field, descriptor)| (field.clone(), Expectation::from(descriptor.clone()).rule()))
            .collect(),
        _ => RuleSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn fields(value: Value) -> BTreeMap<String, Expectation> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_long_text_is_verbatim() {
        let rules = derive(&fields(json!({
            "prompt": "must be a non-empty string describing the image"
        })));
        assert_eq!(rules["prompt"], "must be a non-empty string describing the image");
    }

    #[test]
    fn test_short_text_is_example() {
        let rules = derive(&fields(json!({ "style": "blue" })));
        assert_eq!(rules["style"], "must be a non-empty string (example: `blue`)");
    }

    #[test]
    fn test_number_boolean_and_null() {
        let rules = derive(&fields(json!({ "count": 3, "hd": true, "note": null })));
        assert_eq!(rules["count"], "must be a number (example: `3`)");
        assert_eq!(rules["hd"], "must be a boolean (example: `true`)");
        assert_eq!(rules["note"], "field is optional.");
    }

    #[test]
    fn test_arrays() {
        let rules = derive(&fields(json!({ "colors": ["#fff", "#000"], "tags": [] })));
        assert_eq!(rules["colors"], "must be an array with 2 element(s)");
        assert_eq!(rules["tags"], "must be an array");
    }

    #[test]
    fn test_nested_object() {
        let rules = derive(&fields(json!({ "size": { "w": 1, "h": 1 } })));
        assert_eq!(rules["size"], OBJECT_RULE);
    }

    #[test]
    fn test_classify_keywords() {
        assert_eq!(classify_text("required"), TextKind::Instruction);
        assert_eq!(classify_text("Must be set"), TextKind::Instruction);
        assert_eq!(classify_text("SHOULD exist"), TextKind::Instruction);
        assert_eq!(classify_text("be an email"), TextKind::Instruction);
        assert_eq!(classify_text("valid url"), TextKind::Instruction);
        assert_eq!(classify_text("match /a+/"), TextKind::Instruction);
        assert_eq!(classify_text("blue"), TextKind::Example);
        assert_eq!(classify_text("16:9"), TextKind::Example);
        assert_eq!(classify_text(""), TextKind::Example);
    }

    #[test]
    fn test_classify_keywords_inside_words() {
        for text in ["invalid email", "matches ^a", "requiredness", "maybe a url", "invalidated"] {
            assert_eq!(classify_text(text), TextKind::Instruction, "{:?}", text);
        }
        let rules = derive(&fields(json!({ "email": "invalid email" })));
        assert_eq!(rules["email"], "invalid email");
    }

    #[test]
    fn test_classify_length_boundary() {
        let twenty = "abcdefghijklmnopqrst";
        assert_eq!(twenty.len(), 20);
        assert_eq!(classify_text(twenty), TextKind::Example);

        let twenty_one = "abcdefghijklmnopqrstu";
        assert_eq!(classify_text(twenty_one), TextKind::Instruction);

        // Counted in characters, not bytes
        let accented = "éééééééééé";
        assert!(accented.len() > 20);
        assert_eq!(classify_text(accented), TextKind::Example);
    }

    #[test]
    fn test_expectation_roundtrips_through_value() {
        let original = json!({ "a": "blue", "b": null, "c": [1] });
        let parsed = fields(original.clone());
        assert_eq!(parsed["a"], Expectation::Example("blue".to_string()));
        assert_eq!(parsed["b"], Expectation::Optional);
        assert_eq!(serde_json::to_value(&parsed).unwrap(), original);
    }

    #[test]
    fn test_derive_from_json() {
        let rules = derive_from_json(&json!({ "count": 3 }));
        assert_eq!(rules["count"], "must be a number (example: `3`)");
        assert!(derive_from_json(&json!(["count"])).is_empty());
    }

    #[test]
    fn test_rules_keep_field_order() {
        let rules = derive(&fields(json!({ "b": 1, "a": 2 })));
        let keys: Vec<_> = rules.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    fn descriptor() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            ".{0,40}".prop_map(Value::String),
            prop::collection::vec(any::<u8>().prop_map(|n| json!(n)), 0..5).prop_map(Value::Array),
        ]
    }

    proptest! {
        #[test]
        fn prop_derive_is_deterministic(
            map in prop::collection::btree_map("[a-z_]{1,12}", descriptor(), 0..8)
        ) {
            let expected: BTreeMap<String, Expectation> = map
                .into_iter()
                .map(|(k, v)| (k, Expectation::from(v)))
                .collect();
            let first = derive(&expected);
            let second = derive(&expected);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), expected.len());
            prop_assert!(first.values().all(|rule| !rule.is_empty()));
        }
    }
}
