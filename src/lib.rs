//! Declarative decision trees over JSON configuration.
//!
//! A configuration document declares a *schema* (which named attributes of
//! your objects are selectable, and which output keys exist) and a tree of
//! conditions over those attributes. [`SolutionTree`] validates the
//! document, compiles it, and then annotates objects:
//!
//! ```
//! use dectree::{Selectors, SolutionTree};
//! use serde_json::json;
//!
//! struct Apple {
//!     family: String,
//!     color: String,
//! }
//!
//! let config = json!({
//!     "schema": {
//!         "selectors": {
//!             "family": ["Granny Green", "Juicy Red"],
//!             "color": ["green", "red", "blue"]
//!         },
//!         "output": { "is good": "bool" }
//!     },
//!     "apply first": [
//!         {
//!             "when": { "family": "Granny Green", "color": "green" },
//!             "set": { "is good": true }
//!         },
//!         { "when": {}, "set": { "is good": false } }
//!     ]
//! });
//!
//! let selectors = Selectors::new()
//!     .with("family", |apple: &Apple| apple.family.clone())
//!     .with("color", |apple: &Apple| apple.color.clone());
//! let tree = SolutionTree::new(&config, selectors).unwrap();
//!
//! let apple = Apple { family: "Granny Green".into(), color: "green".into() };
//! assert_eq!(tree.match_update(&apple).get("is good"), Some(&json!(true)));
//!
//! let apple = Apple { family: "Juicy Red".into(), color: "green".into() };
//! assert_eq!(tree.match_update(&apple).get("is good"), Some(&json!(false)));
//! ```
//!
//! # How validation works
//!
//! The configuration is parsed twice. First against a fixed meta-grammar
//! that accepts the outer `{"schema": …, "apply first" | "apply all": […]}`
//! shape. Then the `schema` half is interpreted: each type expression
//! (`"bool"`, `"str"`, `"number"`, a list of scalar literals, or, for
//! output keys, `{"list of": <type>}`) is lifted into a parser, and a
//! grammar for the switch half is synthesised *from those parsers*. A
//! `when` clause naming an undeclared selector, or a `set` clause giving an
//! output key a value of the wrong type, is therefore a compile-time
//! [`ParseError`] with the same quality of message as any structural
//! mismatch.
//!
//! # The parser algebra
//!
//! The machinery underneath is a small combinator library over
//! [`serde_json::Value`], usable on its own via [`parsers`]:
//!
//! ```
//! use dectree::prelude::*;
//! use serde_json::json;
//!
//! // A recursive grammar: arbitrarily nested pairs of integers.
//! let scope = Scope::new("Pairs", |scoped| {
//!     [(
//!         "pair",
//!         union([
//!             typed(ValueType::Int),
//!             dict_exp([
//!                 ("left", req(scoped("pair"))),
//!                 ("right", req(scoped("pair"))),
//!             ]),
//!         ]),
//!     )]
//! });
//! let pair = scope.get_scoped_parser("pair").unwrap();
//!
//! assert!(pair.is_matching(&json!({"left": 1, "right": {"left": 2, "right": 3}}), false));
//! assert!(!pair.is_matching(&json!({"left": 1, "right": "2"}), false));
//! ```
//!
//! Matching and construction are separate phases: `is_matching` recognises
//! structure, `parse_value` additionally runs each parser's *constructor*
//! callback over the parsed result. The compiler is itself the largest
//! client of this mechanism: its constructors return matchers, queries,
//! setters, and whole switch nodes.
//!
//! # Evaluation
//!
//! [`SolutionTree::match_update`] walks the compiled tree against one
//! object and returns a fresh output mapping. `apply first` stops at the
//! first matching condition; `apply all` visits every condition; a
//! condition's `also` block runs only when its own `when` matched. Selector
//! callables run at most once per evaluation; results are memoised in a
//! per-evaluation [`MatchContext`].
//!
//! The compiled tree is immutable. Errors are classified in three kinds:
//! [`LoadError`] for file problems, [`ParseError`] for grammar violations,
//! and [`ConstructionError`] for configurations that ask the host program
//! for something it never supplied.

#![deny(missing_docs)]

mod compile;
mod error;
mod load;
pub mod parsers;
#[cfg(test)]
mod testing;
mod tree;
mod util;

pub use error::{ConstructionError, Error, LoadError, ParseError};
pub use load::load_config;
pub use parsers::{Field, Parsed, Parser, Scope, ValueType};
pub use tree::{
    Condition, MatchContext, Query, SelectorFn, Selectors, Setter, SolutionTree, Switch,
    ValueMatcher,
};

/// The common imports for building grammars by hand.
///
/// Everything here is also reachable through [`parsers`] and the crate
/// root; the prelude just keeps grammar-heavy code readable.
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::parsers::{
        constant, dict_exp, dict_of, dict_of_keyed, enumerated, identity, list_of, opt, req, typed,
        union, Field, Parsed, Parser, Scope, ValueType,
    };
}
