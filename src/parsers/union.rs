//! Ordered alternation with backtracking.

use serde_json::Value;

use crate::error::Error;
use crate::parsers::{finish, parse_error, Ctor, Parsed, Parser};
use crate::util::indent;

/// Matches the first alternative, in declaration order, that fully parses.
///
/// A value may shallowly resemble several alternatives but deeply satisfy
/// only one, so construction probes each shallow-matching alternative with
/// a full parse and traps its [`ParseError`](crate::ParseError) before
/// moving on. When every attempt fails, the raised error aggregates every
/// alternative's message.
pub struct UnionParser {
    alternatives: Vec<Parser>,
    pub(crate) ctor: Option<Ctor>,
}

impl UnionParser {
    pub(crate) fn is_matching(&self, target: &Value, shallow: bool) -> bool {
        self.alternatives
            .iter()
            .any(|alternative| alternative.is_matching(target, shallow))
    }

    pub(crate) fn syntax_string(&self, expand: bool) -> String {
        let body: String = self
            .alternatives
            .iter()
            .map(|alternative| {
                format!(
                    "\n| {}",
                    alternative.syntax_string(expand).trim_start_matches(' ')
                )
            })
            .collect();
        indent(&body, "  ")
    }

    pub(crate) fn parse_value(&self, target: &Value) -> Result<Parsed, Error> {
        let mut details: Vec<String> = Vec::new();
        for alternative in &self.alternatives {
            if !alternative.is_matching(target, true) {
                continue;
            }
            match alternative.parse_value(target, false) {
                Ok(parsed) => return finish(&self.ctor, parsed),
                Err(Error::Parse(err)) => details.push(err.to_string()),
                // Construction errors are caller bugs, not grammar
                // violations; they escape the probe.
                Err(err) => return Err(err),
            }
        }
        Err(parse_error(self.syntax_string(true), target, details))
    }
}

/// A parser matching any one of `alternatives`, tried in order.
///
/// ```
/// use dectree::prelude::*;
/// use serde_json::json;
///
/// let p = union([constant(serde_json::Value::Null), typed(ValueType::Int)]);
/// assert!(p.is_matching(&json!(null), false));
/// assert!(p.is_matching(&json!(3), false));
/// assert!(!p.is_matching(&json!("3"), false));
/// ```
pub fn union<I>(alternatives: I) -> Parser
where
    I: IntoIterator<Item = Parser>,
{
    Parser::Union(UnionParser {
        alternatives: alternatives.into_iter().collect(),
        ctor: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{dict_exp, list_of, req, typed, ValueType};
    use crate::testing::*;
    use serde_json::json;

    #[test]
    fn test_first_full_parse_wins() {
        let p = union([
            list_of(typed(ValueType::Int)),
            list_of(typed(ValueType::Str)),
        ]);
        assert_roundtrip(&p, json!(["a", "b"]));
        assert_roundtrip(&p, json!([1, 2]));
        assert_no_parse(&p, json!([1, "b"]));

        // Records defer field checks to the full parse, so both
        // alternatives pass the probe and the failed first attempt is
        // trapped before the second one wins.
        let p = union([
            dict_exp([("a", req(typed(ValueType::Int)))]),
            dict_exp([("a", req(typed(ValueType::Str)))]),
        ]);
        assert_roundtrip(&p, json!({"a": "x"}));
        assert_roundtrip(&p, json!({"a": 1}));
        assert_no_parse(&p, json!({"a": true}));
    }

    #[test]
    fn test_all_failures_aggregated() {
        let p = union([
            dict_exp([("a", req(typed(ValueType::Int)))]),
            dict_exp([("a", req(typed(ValueType::Str)))]),
        ]);
        let message = p
            .parse_value(&json!({"a": true}), false)
            .unwrap_err()
            .to_string();
        // Both alternatives were attempted; each one's own failure
        // message is carried into the union error.
        assert!(message.contains("Failed to parse true"), "{message}");
        assert!(message.contains("int"), "{message}");
        assert!(message.contains("str"), "{message}");
    }
}
