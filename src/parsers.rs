//! The parser algebra: combinators that recognise JSON values.
//!
//! A [`Parser`] is a tagged tree of matcher variants. Each variant supports
//! three operations:
//!
//! -   [`Parser::is_matching`] - structural recognition, no construction.
//!     The `shallow` flag flows through to every child check; what it
//!     trims is per-field matching in fixed-shape records ([`dict_exp`]),
//!     which is how [`union`] probes alternatives cheaply before
//!     committing to one.
//!
//! -   [`Parser::parse_value`] - recognition plus construction. The `blind`
//!     flag promises that the caller has just verified the structure, so
//!     re-verification can be skipped; containers use it to keep a full
//!     parse linear in the size of the value instead of quadratic.
//!
//! -   [`Parser::syntax_string`] - a human-readable grammar fragment, used
//!     in every parse-error message.
//!
//! Every variant carries an optional *constructor*, a callback that
//! transforms the already-parsed inner result (see [`Parsed`]). Recursive
//! grammars are expressed with a [`Scope`] of named productions and
//! late-bound references into it.

mod containers;
mod primitive;
mod record;
mod scope;
mod union;
mod value;
mod wrap;

use serde_json::Value;

use crate::error::{Error, ParseError};

pub use containers::{dict_of, dict_of_keyed, list_of, DictOfParser, ListOfParser};
pub use primitive::{constant, enumerated, typed, ConstParser, EnumeratedParser, TypeParser};
pub use record::{dict_exp, opt, req, DictExpParser, Field};
pub use scope::{Scope, ScopedParser, DEFAULT_RECURSION_LIMIT};
pub use union::{union, UnionParser};
pub use value::{Parsed, ValueType};
pub use wrap::{identity, IdentityParser};

/// A constructor callback: transforms the parsed inner value.
///
/// Errors returned here are treated as the caller's bugs, not grammar
/// violations: [`union`] does not trap them while probing alternatives.
pub type Ctor = Box<dyn Fn(Parsed) -> Result<Parsed, Error>>;

/// A matcher for JSON values, built from the constructor functions in this
/// module ([`typed`], [`constant`], [`enumerated`], [`list_of`],
/// [`dict_of`], [`dict_exp`], [`union`], [`identity`]) and from
/// [`Scope::scoped`] references.
pub enum Parser {
    /// Matches values of exactly one runtime type.
    Type(TypeParser),
    /// Matches one exact value.
    Const(ConstParser),
    /// Matches members of a finite set of values.
    Enumerated(EnumeratedParser),
    /// Matches lists whose every element matches an inner parser.
    ListOf(ListOfParser),
    /// Matches mappings whose every value matches an inner parser.
    DictOf(DictOfParser),
    /// Matches mappings with a fixed set of declared keys.
    DictExp(DictExpParser),
    /// Matches the first of several alternatives that fully parses.
    Union(UnionParser),
    /// Matches whatever an inner parser matches; applies a constructor.
    Identity(IdentityParser),
    /// A late-bound reference to a named production in a [`Scope`].
    Scoped(ScopedParser),
}

impl Parser {
    /// Check whether `target` has the structure this parser recognises,
    /// without running any constructors.
    ///
    /// Every variant passes `shallow` through to its children unchanged;
    /// containers still verify their own structure and visit every
    /// element. A fixed-shape record ([`dict_exp`]) is where the flag
    /// takes effect: under `shallow` it checks unknown and missing keys
    /// but skips per-field matching. Structural checks are never skipped.
    ///
    /// # Panics
    ///
    /// If a scoped reference reached through this parser names a production
    /// its scope never defined. (That is a bug in the grammar, not in the
    /// value; [`Parser::parse_value`] reports it as an error instead.)
    pub fn is_matching(&self, target: &Value, shallow: bool) -> bool {
        match self {
            Parser::Type(p) => p.is_matching(target),
            Parser::Const(p) => p.is_matching(target),
            Parser::Enumerated(p) => p.is_matching(target),
            Parser::ListOf(p) => p.is_matching(target, shallow),
            Parser::DictOf(p) => p.is_matching(target, shallow),
            Parser::DictExp(p) => p.is_matching(target, shallow),
            Parser::Union(p) => p.is_matching(target, shallow),
            Parser::Identity(p) => p.is_matching(target, shallow),
            Parser::Scoped(p) => p.is_matching(target, shallow),
        }
    }

    /// Check that `target` matches, then build the constructor-transformed
    /// result.
    ///
    /// `blind` promises the caller has already verified the structure; it
    /// skips re-verification, not safety: a container handed the wrong
    /// kind of value still fails with a [`ParseError`].
    pub fn parse_value(&self, target: &Value, blind: bool) -> Result<Parsed, Error> {
        match self {
            Parser::Type(p) => p.parse_value(target),
            Parser::Const(p) => p.parse_value(target),
            Parser::Enumerated(p) => p.parse_value(target),
            Parser::ListOf(p) => p.parse_value(target, blind),
            Parser::DictOf(p) => p.parse_value(target, blind),
            Parser::DictExp(p) => p.parse_value(target),
            Parser::Union(p) => p.parse_value(target),
            Parser::Identity(p) => p.parse_value(target, blind),
            Parser::Scoped(p) => p.parse_value(target, blind),
        }
    }

    /// A human-readable rendering of the grammar this parser accepts.
    ///
    /// With `expand` set, a scoped reference at the top renders its target
    /// production inline (once); below that, references render by name, so
    /// recursive grammars print finitely.
    pub fn syntax_string(&self, expand: bool) -> String {
        match self {
            Parser::Type(p) => p.syntax_string(),
            Parser::Const(p) => p.syntax_string(),
            Parser::Enumerated(p) => p.syntax_string(),
            Parser::ListOf(p) => p.syntax_string(expand),
            Parser::DictOf(p) => p.syntax_string(expand),
            Parser::DictExp(p) => p.syntax_string(expand),
            Parser::Union(p) => p.syntax_string(expand),
            Parser::Identity(p) => p.syntax_string(expand),
            Parser::Scoped(p) => p.syntax_string(expand),
        }
    }

    /// Replace this parser's constructor.
    ///
    /// The callback receives the parsed inner value and returns the value
    /// the parse should produce instead.
    ///
    /// ```
    /// use dectree::prelude::*;
    /// use serde_json::json;
    ///
    /// let p = typed(ValueType::Int).construct(|parsed| {
    ///     Ok(Parsed::Json(json!({ "boxed": parsed.into_json() })))
    /// });
    /// let out = p.parse_value(&json!(7), false).unwrap();
    /// assert_eq!(out.into_json(), json!({ "boxed": 7 }));
    /// ```
    pub fn construct<F>(self, ctor: F) -> Parser
    where
        F: Fn(Parsed) -> Result<Parsed, Error> + 'static,
    {
        let ctor: Ctor = Box::new(ctor);
        match self {
            Parser::Type(mut p) => {
                p.ctor = Some(ctor);
                Parser::Type(p)
            }
            Parser::Const(mut p) => {
                p.ctor = Some(ctor);
                Parser::Const(p)
            }
            Parser::Enumerated(mut p) => {
                p.ctor = Some(ctor);
                Parser::Enumerated(p)
            }
            Parser::ListOf(mut p) => {
                p.ctor = Some(ctor);
                Parser::ListOf(p)
            }
            Parser::DictOf(mut p) => {
                p.ctor = Some(ctor);
                Parser::DictOf(p)
            }
            Parser::DictExp(mut p) => {
                p.ctor = Some(ctor);
                Parser::DictExp(p)
            }
            Parser::Union(mut p) => {
                p.ctor = Some(ctor);
                Parser::Union(p)
            }
            Parser::Identity(mut p) => {
                p.ctor = Some(ctor);
                Parser::Identity(p)
            }
            Parser::Scoped(mut p) => {
                p.ctor = Some(ctor);
                Parser::Scoped(p)
            }
        }
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.syntax_string(false))
    }
}

/// Run the optional constructor over a parsed result.
pub(crate) fn finish(ctor: &Option<Ctor>, parsed: Parsed) -> Result<Parsed, Error> {
    match ctor {
        Some(ctor) => ctor(parsed),
        None => Ok(parsed),
    }
}

/// Build the standard parse failure for a value that did not match.
pub(crate) fn parse_error(syntax: String, target: &Value, details: Vec<String>) -> Error {
    Error::Parse(ParseError::new(target, &syntax, details))
}
