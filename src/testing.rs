//! Helpers used by tests throughout the crate.

use serde_json::Value;

use crate::error::Error;
use crate::parsers::Parser;

/// Assert that `parser` accepts `value` and produces `expected` after
/// reassembling the parse result as JSON.
#[track_caller]
pub(crate) fn assert_parse_eq(parser: &Parser, value: Value, expected: Value) {
    assert!(
        parser.is_matching(&value, false),
        "expected {value} to match {}",
        parser.syntax_string(true)
    );
    match parser.parse_value(&value, false) {
        Ok(parsed) => assert_eq!(parsed.into_json(), expected),
        Err(err) => panic!("parse failed: {err}"),
    }
}

/// Assert that `parser` accepts `value` unchanged.
#[track_caller]
pub(crate) fn assert_roundtrip(parser: &Parser, value: Value) {
    assert_parse_eq(parser, value.clone(), value);
}

/// Assert that `parser` rejects `value`, from both recognition and
/// construction, with a parse error rather than anything worse.
#[track_caller]
pub(crate) fn assert_no_parse(parser: &Parser, value: Value) {
    assert!(
        !parser.is_matching(&value, false),
        "expected {value} not to match {}",
        parser.syntax_string(true)
    );
    match parser.parse_value(&value, false) {
        Ok(parsed) => panic!("expected parse of {value} to fail, got {parsed:?}"),
        Err(Error::Parse(_)) => {}
        Err(err) => panic!("expected a parse error, got: {err}"),
    }
}
