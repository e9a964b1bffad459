//! The identity wrapper: a constructor on top of another parser.

use std::rc::Rc;

use serde_json::Value;

use crate::error::Error;
use crate::parsers::{finish, Ctor, Parsed, Parser};

/// Matches whatever its inner parser matches, then applies a constructor.
///
/// Exists so a transform can be layered over any parser, shared ones
/// included, without introducing a fresh variant.
pub struct IdentityParser {
    inner: Rc<Parser>,
    pub(crate) ctor: Option<Ctor>,
}

impl IdentityParser {
    pub(crate) fn is_matching(&self, target: &Value, shallow: bool) -> bool {
        self.inner.is_matching(target, shallow)
    }

    pub(crate) fn syntax_string(&self, expand: bool) -> String {
        self.inner.syntax_string(expand)
    }

    pub(crate) fn parse_value(&self, target: &Value, blind: bool) -> Result<Parsed, Error> {
        let parsed = self.inner.parse_value(target, blind)?;
        finish(&self.ctor, parsed)
    }
}

/// A parser that matches like `inner` and applies `ctor` on top of
/// whatever `inner` produced.
pub fn identity<P, F>(inner: P, ctor: F) -> Parser
where
    P: Into<Rc<Parser>>,
    F: Fn(Parsed) -> Result<Parsed, Error> + 'static,
{
    Parser::Identity(IdentityParser {
        inner: inner.into(),
        ctor: Some(Box::new(ctor)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{typed, ValueType};
    use serde_json::json;

    fn wrapped(parsed: Parsed) -> Result<Parsed, Error> {
        Ok(Parsed::Json(json!({ "wrapped": parsed.into_json() })))
    }

    #[test]
    fn test_constructors_nest() {
        let p = identity(identity(typed(ValueType::Int), wrapped), wrapped);
        let out = p.parse_value(&json!(1), false).unwrap();
        assert_eq!(out.into_json(), json!({"wrapped": {"wrapped": 1}}));
    }
}
