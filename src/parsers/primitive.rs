//! Leaf parsers: exact types, exact values, and finite enumerations.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::Error;
use crate::parsers::{finish, parse_error, Ctor, Parsed, Parser, ValueType};

/// Matches values whose runtime type is exactly one [`ValueType`].
pub struct TypeParser {
    ty: ValueType,
    pub(crate) ctor: Option<Ctor>,
}

impl TypeParser {
    pub(crate) fn is_matching(&self, target: &Value) -> bool {
        self.ty.matches(target)
    }

    pub(crate) fn syntax_string(&self) -> String {
        self.ty.name().to_string()
    }

    // Re-verifies even on a blind parse; the check is O(1) and keeps a
    // mis-promised `blind` from constructing garbage.
    pub(crate) fn parse_value(&self, target: &Value) -> Result<Parsed, Error> {
        if !self.is_matching(target) {
            return Err(parse_error(self.syntax_string(), target, vec![]));
        }
        finish(&self.ctor, Parsed::Json(target.clone()))
    }
}

/// Matches exactly one value.
pub struct ConstParser {
    value: Value,
    pub(crate) ctor: Option<Ctor>,
}

impl ConstParser {
    pub(crate) fn is_matching(&self, target: &Value) -> bool {
        *target == self.value
    }

    pub(crate) fn syntax_string(&self) -> String {
        format!("const {}", self.value)
    }

    pub(crate) fn parse_value(&self, target: &Value) -> Result<Parsed, Error> {
        if !self.is_matching(target) {
            return Err(parse_error(self.syntax_string(), target, vec![]));
        }
        finish(&self.ctor, Parsed::Json(target.clone()))
    }
}

/// Matches members of a finite set of values.
///
/// Also records the set of member types and rejects by type before any
/// equality check, so `"1"` never matches an enumeration of integers and
/// `null` is an ordinary member like any other.
pub struct EnumeratedParser {
    values: Vec<Value>,
    types: HashSet<ValueType>,
    pub(crate) ctor: Option<Ctor>,
}

impl EnumeratedParser {
    pub(crate) fn is_matching(&self, target: &Value) -> bool {
        if !self.types.contains(&ValueType::of(target)) {
            return false;
        }
        self.values.contains(target)
    }

    pub(crate) fn syntax_string(&self) -> String {
        let members: Vec<String> = self.values.iter().map(Value::to_string).collect();
        format!("enum[{}]", members.join(", "))
    }

    pub(crate) fn parse_value(&self, target: &Value) -> Result<Parsed, Error> {
        if !self.is_matching(target) {
            return Err(parse_error(self.syntax_string(), target, vec![]));
        }
        finish(&self.ctor, Parsed::Json(target.clone()))
    }
}

/// A parser matching values of exactly the given runtime type.
///
/// No coercion, no subtyping: `typed(ValueType::Int)` rejects `true`,
/// `1.5`, and `"1"` alike.
pub fn typed(ty: ValueType) -> Parser {
    Parser::Type(TypeParser { ty, ctor: None })
}

/// A parser matching exactly one value. `constant(Value::Null)` is the
/// usual way to admit `null` into a [`union`](crate::parsers::union).
pub fn constant(value: impl Into<Value>) -> Parser {
    Parser::Const(ConstParser {
        value: value.into(),
        ctor: None,
    })
}

/// A parser matching any member of a finite set. Duplicate members are
/// dropped; member order is kept for syntax strings.
pub fn enumerated<I>(values: I) -> Parser
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let mut members: Vec<Value> = Vec::new();
    for value in values {
        let value = value.into();
        if !members.contains(&value) {
            members.push(value);
        }
    }
    let types = members.iter().map(ValueType::of).collect();
    Parser::Enumerated(EnumeratedParser {
        values: members,
        types,
        ctor: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use serde_json::json;

    #[test]
    fn test_enumerated_membership() {
        let p = enumerated([json!(1), json!(2), json!(3), json!(null)]);
        assert_roundtrip(&p, json!(1));
        assert_roundtrip(&p, json!(null));
        // Equal-looking values of other types are rejected by type name.
        assert_no_parse(&p, json!("1"));
        assert_no_parse(&p, json!(4));
        assert_no_parse(&p, json!(true));
    }

    #[test]
    fn test_enumerated_syntax() {
        let p = enumerated([json!("a"), json!(1), json!(1)]);
        assert_eq!(p.syntax_string(false), "enum[\"a\", 1]");
    }
}
