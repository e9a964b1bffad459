//! Named production tables and the late-bound references that make
//! recursive grammars possible.
//!
//! A production that names itself (or a sibling) cannot own its target
//! without creating a cycle. Instead, a [`Scope`] owns every production,
//! and a scoped reference holds a non-owning pointer into the scope plus a
//! production name, resolved on every call. The assembler callable that
//! builds the production table receives a factory for such references, so
//! it can mention productions that are not defined yet.

use std::cell::{Cell, OnceCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ConstructionError, Error, ParseError};
use crate::parsers::{finish, Ctor, Parsed, Parser};
use crate::util::indent;

/// Ceiling on nested scoped resolutions, unless overridden with
/// [`Scope::with_recursion_limit`].
///
/// Structural recursion is bounded by the value being parsed; only a
/// left-recursive grammar can keep resolving references without consuming
/// anything, and this counter turns that into a parse error instead of a
/// stack overflow.
pub const DEFAULT_RECURSION_LIMIT: usize = 128;

pub(crate) struct ScopeData {
    name: String,
    productions: OnceCell<IndexMap<String, Rc<Parser>>>,
    depth: Cell<usize>,
    recursion_limit: Cell<usize>,
}

impl ScopeData {
    fn productions(&self) -> &IndexMap<String, Rc<Parser>> {
        self.productions
            .get()
            .expect("internal error: scope used before assembly")
    }

    fn resolve(&self, name: &str) -> Option<Rc<Parser>> {
        self.productions().get(name).cloned()
    }
}

/// A named table of mutually recursive parser productions.
///
/// ```
/// use dectree::prelude::*;
/// use serde_json::json;
///
/// // Nested lists of integers.
/// let scope = Scope::new("Nest", |scoped| {
///     [("item", union([typed(ValueType::Int), list_of(scoped("item"))]))]
/// });
/// let item = scope.get_scoped_parser("item").unwrap();
/// assert!(item.is_matching(&json!([1, [2, [3]]]), false));
/// assert!(!item.is_matching(&json!([1, ["2"]]), false));
/// ```
pub struct Scope {
    data: Rc<ScopeData>,
}

impl Scope {
    /// Build a scope by running `assemble` once.
    ///
    /// The assembler receives a factory that turns a production name into a
    /// scoped reference; the references resolve lazily, so the assembler
    /// may use them for productions it has not defined yet. The assembler
    /// returns the full production table.
    pub fn new<K, I, F>(name: impl Into<String>, assemble: F) -> Scope
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Parser)>,
        F: FnOnce(&dyn Fn(&str) -> Parser) -> I,
    {
        let data = Rc::new(ScopeData {
            name: name.into(),
            productions: OnceCell::new(),
            depth: Cell::new(0),
            recursion_limit: Cell::new(DEFAULT_RECURSION_LIMIT),
        });
        let weak = Rc::downgrade(&data);
        let scoped = move |production: &str| -> Parser {
            Parser::Scoped(ScopedParser {
                scope: weak.clone(),
                name: production.to_string(),
                ctor: None,
            })
        };
        let productions: IndexMap<String, Rc<Parser>> = assemble(&scoped)
            .into_iter()
            .map(|(key, parser)| (key.into(), Rc::new(parser)))
            .collect();
        data.productions
            .set(productions)
            .ok()
            .expect("internal error: scope assembled twice");
        Scope { data }
    }

    /// Override the recursion ceiling for references into this scope.
    pub fn with_recursion_limit(self, limit: usize) -> Scope {
        self.data.recursion_limit.set(limit);
        self
    }

    /// The scope's name, as rendered in syntax strings.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Look up a production by name.
    ///
    /// A missing name is a [`ConstructionError`]: the grammar's wiring is
    /// wrong, not the value being parsed.
    pub fn get_scoped_parser(&self, name: &str) -> Result<&Parser, Error> {
        match self.data.productions().get(name) {
            Some(parser) => Ok(parser.as_ref()),
            None => Err(ConstructionError::UnknownProduction {
                scope: self.data.name.clone(),
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// A fresh late-bound reference to one of this scope's productions.
    ///
    /// Equivalent to the factory the assembler receives; useful for
    /// building entry-point parsers outside the scope itself.
    pub fn scoped(&self, name: &str) -> Parser {
        Parser::Scoped(ScopedParser {
            scope: Rc::downgrade(&self.data),
            name: name.to_string(),
            ctor: None,
        })
    }
}

/// A late-bound reference to a named production in a [`Scope`].
///
/// Holds the scope weakly and resolves by name on every call; this is what
/// lets a production mention itself without a cycle in the ownership
/// graph. The owning [`Scope`] must stay alive for as long as any of its
/// references are used.
pub struct ScopedParser {
    scope: Weak<ScopeData>,
    name: String,
    pub(crate) ctor: Option<Ctor>,
}

impl ScopedParser {
    fn scope(&self) -> Rc<ScopeData> {
        self.scope
            .upgrade()
            .expect("internal error: scope dropped while its references were in use")
    }

    pub(crate) fn is_matching(&self, target: &Value, shallow: bool) -> bool {
        let scope = self.scope();
        let Some(_guard) = DepthGuard::enter(&scope) else {
            // Over the ceiling nothing parses either, so recognition and
            // construction stay consistent.
            return false;
        };
        let parser = scope.resolve(&self.name).unwrap_or_else(|| {
            panic!(
                "scoped parser construction failed, {}::{} does not exist",
                scope.name, self.name
            )
        });
        parser.is_matching(target, shallow)
    }

    pub(crate) fn syntax_string(&self, expand: bool) -> String {
        let scope = self.scope();
        if !expand {
            return format!("{}::{}", scope.name, self.name);
        }
        match scope.resolve(&self.name) {
            Some(parser) => indent(
                &format!(
                    "{}::{} = \n{}",
                    scope.name,
                    self.name,
                    parser.syntax_string(false)
                ),
                "  ",
            ),
            None => format!("{}::{} (undefined)", scope.name, self.name),
        }
    }

    pub(crate) fn parse_value(&self, target: &Value, blind: bool) -> Result<Parsed, Error> {
        let scope = self.scope();
        let Some(_guard) = DepthGuard::enter(&scope) else {
            return Err(Error::Parse(ParseError::recursion_limit(
                &scope.name,
                &self.name,
                scope.recursion_limit.get(),
            )));
        };
        let parser = scope
            .resolve(&self.name)
            .ok_or_else(|| ConstructionError::UnknownProduction {
                scope: scope.name.clone(),
                name: self.name.clone(),
            })?;
        let parsed = parser.parse_value(target, blind)?;
        finish(&self.ctor, parsed)
    }
}

/// Increments the scope's resolution depth for the duration of one call.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    fn enter(scope: &'a ScopeData) -> Option<DepthGuard<'a>> {
        let depth = scope.depth.get() + 1;
        if depth > scope.recursion_limit.get() {
            return None;
        }
        scope.depth.set(depth);
        Some(DepthGuard {
            depth: &scope.depth,
        })
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}
