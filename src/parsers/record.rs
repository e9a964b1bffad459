//! Fixed-shape mappings: a declared set of required and optional fields.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Error;
use crate::parsers::{finish, parse_error, Ctor, Parsed, Parser};
use crate::util::indent;

/// One declared field of a [`dict_exp`] parser.
///
/// Optionality is a property of a field's place in a record, not of a
/// parser, so it lives here rather than as a parser variant; a stray
/// "optional" marker outside a record is unrepresentable.
pub enum Field {
    /// The key must be present.
    Required(Rc<Parser>),
    /// The key may be absent; when present, the value must match.
    Optional(Rc<Parser>),
}

impl Field {
    pub(crate) fn parser(&self) -> &Parser {
        match self {
            Field::Required(parser) | Field::Optional(parser) => parser,
        }
    }

    pub(crate) fn is_required(&self) -> bool {
        matches!(self, Field::Required(_))
    }
}

/// Matches mappings with exactly the declared keys.
///
/// Unknown keys are a failure; missing required keys are a failure; every
/// violation is reported, not just the first.
pub struct DictExpParser {
    fields: IndexMap<String, Field>,
    pub(crate) ctor: Option<Ctor>,
}

impl DictExpParser {
    pub(crate) fn is_matching(&self, target: &Value, shallow: bool) -> bool {
        let Some(object) = target.as_object() else {
            return false;
        };
        if object.keys().any(|key| !self.fields.contains_key(key.as_str())) {
            return false;
        }
        for (key, field) in &self.fields {
            if field.is_required() && !object.contains_key(key) {
                return false;
            }
        }
        if shallow {
            return true;
        }
        for (key, field) in &self.fields {
            if let Some(value) = object.get(key) {
                if !field.parser().is_matching(value, false) {
                    return false;
                }
            }
        }
        true
    }

    pub(crate) fn syntax_string(&self, expand: bool) -> String {
        let mut body = String::from("{");
        for (key, field) in &self.fields {
            let syntax = field.parser().syntax_string(expand);
            if field.is_required() {
                body.push_str(&format!("\n  {key}: {syntax},"));
            } else {
                body.push_str(&format!("\n  {key}: ?({syntax}),"));
            }
        }
        body.push_str("\n}");
        indent(&body, "  ")
    }

    pub(crate) fn parse_value(&self, target: &Value) -> Result<Parsed, Error> {
        let Some(object) = target.as_object() else {
            return Err(parse_error(self.syntax_string(true), target, vec![]));
        };
        let mut details: Vec<String> = object
            .keys()
            .filter(|key| !self.fields.contains_key(key.as_str()))
            .map(|key| format!("Unexpected key \"{key}\""))
            .collect();
        details.extend(
            self.fields
                .iter()
                .filter(|(key, field)| field.is_required() && !object.contains_key(*key))
                .map(|(key, _)| format!("Expected key \"{key}\"")),
        );
        if !details.is_empty() {
            return Err(parse_error(self.syntax_string(true), target, details));
        }
        // The structural level is now verified; field values report their
        // own mismatches precisely from their own parses.
        let mut parsed = IndexMap::new();
        for (key, field) in &self.fields {
            if let Some(value) = object.get(key) {
                parsed.insert(key.clone(), field.parser().parse_value(value, true)?);
            }
        }
        finish(&self.ctor, Parsed::Fields(parsed))
    }
}

/// A required field. Shorthand for use in [`dict_exp`] declarations.
pub fn req(parser: impl Into<Rc<Parser>>) -> Field {
    Field::Required(parser.into())
}

/// An optional field. Shorthand for use in [`dict_exp`] declarations.
pub fn opt(parser: impl Into<Rc<Parser>>) -> Field {
    Field::Optional(parser.into())
}

/// A parser matching mappings with exactly the declared fields.
///
/// ```
/// use dectree::prelude::*;
/// use serde_json::json;
///
/// let point = dict_exp([
///     ("x", req(typed(ValueType::Int))),
///     ("y", req(typed(ValueType::Int))),
///     ("label", opt(typed(ValueType::Str))),
/// ]);
/// assert!(point.is_matching(&json!({"x": 1, "y": 2}), false));
/// assert!(!point.is_matching(&json!({"x": 1}), false));
/// assert!(!point.is_matching(&json!({"x": 1, "y": 2, "z": 3}), false));
/// ```
pub fn dict_exp<K, I>(fields: I) -> Parser
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Field)>,
{
    Parser::DictExp(DictExpParser {
        fields: fields
            .into_iter()
            .map(|(key, field)| (key.into(), field))
            .collect(),
        ctor: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{typed, ValueType};
    use serde_json::json;

    #[test]
    fn test_every_violation_reported() {
        let p = dict_exp([
            ("a", req(typed(ValueType::Int))),
            ("b", req(typed(ValueType::Int))),
        ]);
        let err = p
            .parse_value(&json!({"b": 1, "c": 2, "d": 3}), false)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unexpected key \"c\""), "{message}");
        assert!(message.contains("Unexpected key \"d\""), "{message}");
        assert!(message.contains("Expected key \"a\""), "{message}");
    }

    #[test]
    fn test_shallow_checks_structure_only() {
        let p = dict_exp([
            ("a", req(typed(ValueType::Int))),
            ("b", opt(typed(ValueType::Int))),
        ]);
        // Wrong field value passes a shallow check but not a deep one.
        assert!(p.is_matching(&json!({"a": "x"}), true));
        assert!(!p.is_matching(&json!({"a": "x"}), false));
        // Structure is checked even under shallow.
        assert!(!p.is_matching(&json!({"b": 1}), true));
        assert!(!p.is_matching(&json!({"a": 1, "z": 1}), true));
    }
}
