//! Homogeneous containers: lists and open-keyed mappings.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Error;
use crate::parsers::{finish, parse_error, Ctor, Parsed, Parser};

/// Matches any list whose every element matches the inner parser.
pub struct ListOfParser {
    inner: Rc<Parser>,
    pub(crate) ctor: Option<Ctor>,
}

impl ListOfParser {
    pub(crate) fn is_matching(&self, target: &Value, shallow: bool) -> bool {
        let Some(items) = target.as_array() else {
            return false;
        };
        items.iter().all(|item| self.inner.is_matching(item, shallow))
    }

    pub(crate) fn syntax_string(&self, expand: bool) -> String {
        format!("{}[]", self.inner.syntax_string(expand))
    }

    pub(crate) fn parse_value(&self, target: &Value, blind: bool) -> Result<Parsed, Error> {
        let Some(items) = target.as_array() else {
            return Err(parse_error(self.syntax_string(true), target, vec![]));
        };
        if !blind && !items.iter().all(|item| self.inner.is_matching(item, false)) {
            return Err(parse_error(self.syntax_string(true), target, vec![]));
        }
        let parsed = items
            .iter()
            .map(|item| self.inner.parse_value(item, true))
            .collect::<Result<Vec<_>, _>>()?;
        finish(&self.ctor, Parsed::Seq(parsed))
    }
}

/// Matches any mapping whose every value matches the inner parser and
/// whose every key satisfies an optional predicate.
pub struct DictOfParser {
    inner: Rc<Parser>,
    key_is_allowed: Option<Box<dyn Fn(&str) -> bool>>,
    pub(crate) ctor: Option<Ctor>,
}

impl DictOfParser {
    fn key_allowed(&self, key: &str) -> bool {
        match &self.key_is_allowed {
            Some(allowed) => allowed(key),
            None => true,
        }
    }

    pub(crate) fn is_matching(&self, target: &Value, shallow: bool) -> bool {
        let Some(object) = target.as_object() else {
            return false;
        };
        if !object.keys().all(|key| self.key_allowed(key)) {
            return false;
        }
        object
            .values()
            .all(|value| self.inner.is_matching(value, shallow))
    }

    pub(crate) fn syntax_string(&self, expand: bool) -> String {
        format!("{{ [str]: {} }}", self.inner.syntax_string(expand))
    }

    pub(crate) fn parse_value(&self, target: &Value, blind: bool) -> Result<Parsed, Error> {
        let Some(object) = target.as_object() else {
            return Err(parse_error(self.syntax_string(true), target, vec![]));
        };
        // Every rejected key is reported, not just the first.
        let details: Vec<String> = object
            .keys()
            .filter(|key| !self.key_allowed(key))
            .map(|key| format!("Unexpected key \"{key}\""))
            .collect();
        if !details.is_empty() {
            return Err(parse_error(self.syntax_string(true), target, details));
        }
        let mut parsed = IndexMap::new();
        for (key, value) in object {
            parsed.insert(key.clone(), self.inner.parse_value(value, blind)?);
        }
        finish(&self.ctor, Parsed::Fields(parsed))
    }
}

/// A parser matching lists of elements that match `inner`.
pub fn list_of(inner: impl Into<Rc<Parser>>) -> Parser {
    Parser::ListOf(ListOfParser {
        inner: inner.into(),
        ctor: None,
    })
}

/// A parser matching mappings from arbitrary keys to values matching
/// `inner`.
pub fn dict_of(inner: impl Into<Rc<Parser>>) -> Parser {
    Parser::DictOf(DictOfParser {
        inner: inner.into(),
        key_is_allowed: None,
        ctor: None,
    })
}

/// Like [`dict_of`], but every key must additionally satisfy
/// `key_is_allowed`.
pub fn dict_of_keyed<F>(inner: impl Into<Rc<Parser>>, key_is_allowed: F) -> Parser
where
    F: Fn(&str) -> bool + 'static,
{
    Parser::DictOf(DictOfParser {
        inner: inner.into(),
        key_is_allowed: Some(Box::new(key_is_allowed)),
        ctor: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{dict_exp, req, typed, ValueType};
    use crate::testing::*;
    use serde_json::json;

    #[test]
    fn test_shallow_propagates_to_elements() {
        // Leaf checks still run under shallow; the flag is passed through,
        // not consumed here.
        let p = list_of(typed(ValueType::Int));
        assert!(!p.is_matching(&json!([1, "2", 3]), true));
        assert!(!p.is_matching(&json!("not a list"), true));

        let p = dict_of(typed(ValueType::Int));
        assert!(!p.is_matching(&json!({"a": "x"}), true));

        // The flag reaching each element is observable through a record,
        // which skips per-field matching when shallow.
        let p = list_of(dict_exp([("a", req(typed(ValueType::Int)))]));
        assert!(p.is_matching(&json!([{"a": "x"}]), true));
        assert!(!p.is_matching(&json!([{"a": "x"}]), false));
        assert!(!p.is_matching(&json!([{"b": 1}]), true));
    }

    #[test]
    fn test_key_predicate_checked_even_shallow() {
        let p = dict_of_keyed(typed(ValueType::Int), |key| key.len() == 1);
        assert!(p.is_matching(&json!({"a": 1}), true));
        assert!(!p.is_matching(&json!({"ab": 1}), true));
        assert_no_parse(&p, json!({"ab": 1}));
    }
}
