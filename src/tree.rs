//! The compiled decision tree: matchers, queries, setters, conditions,
//! switches, and the evaluator that walks them.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::compile;
use crate::error::Error;
use crate::load;

/// A selector: extracts one named attribute of an input object as a JSON
/// value.
pub type SelectorFn<O> = dyn Fn(&O) -> Value;

/// The host-supplied table of selectors.
///
/// Every name listed under the configuration's `schema.selectors` must
/// have an entry here; extra entries are harmless.
///
/// ```
/// use dectree::Selectors;
///
/// struct Apple { color: String, weight: f64 }
///
/// let selectors = Selectors::new()
///     .with("color", |apple: &Apple| apple.color.clone())
///     .with("weight", |apple: &Apple| apple.weight);
/// ```
pub struct Selectors<O> {
    table: HashMap<String, Rc<SelectorFn<O>>>,
}

impl<O> Selectors<O> {
    /// An empty table.
    pub fn new() -> Selectors<O> {
        Selectors {
            table: HashMap::new(),
        }
    }

    /// Register a selector under `name`. Whatever it returns is converted
    /// into a JSON value for matching.
    pub fn with<T, F>(mut self, name: impl Into<String>, selector: F) -> Selectors<O>
    where
        T: Into<Value>,
        F: Fn(&O) -> T + 'static,
    {
        self.table
            .insert(name.into(), Rc::new(move |object| selector(object).into()));
        self
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Rc<SelectorFn<O>>> {
        self.table.get(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

impl<O> Default for Selectors<O> {
    fn default() -> Selectors<O> {
        Selectors::new()
    }
}

impl<O> fmt::Debug for Selectors<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_tuple("Selectors").field(&names).finish()
    }
}

/// Per-evaluation state: memoises selector calls so that each selector
/// runs at most once per input object.
///
/// Created fresh by [`SolutionTree::match_update`]; never share one across
/// evaluations.
pub struct MatchContext {
    cache: HashMap<String, Value>,
}

impl MatchContext {
    /// An empty cache for one evaluation pass.
    pub fn new() -> MatchContext {
        MatchContext {
            cache: HashMap::new(),
        }
    }

    /// The selected value for `name`, computing it on first use.
    pub(crate) fn select<O>(
        &mut self,
        name: &str,
        selector: &SelectorFn<O>,
        object: &O,
    ) -> &Value {
        if !self.cache.contains_key(name) {
            self.cache.insert(name.to_string(), selector(object));
        }
        &self.cache[name]
    }
}

impl Default for MatchContext {
    fn default() -> MatchContext {
        MatchContext::new()
    }
}

/// A predicate over one selector: accepts an object when the selected
/// value is a member of a finite acceptance set.
pub struct ValueMatcher<O> {
    name: String,
    selector: Rc<SelectorFn<O>>,
    values: Vec<Value>,
}

impl<O> ValueMatcher<O> {
    /// A matcher accepting the given values of the named selector.
    /// Duplicates in `values` are dropped.
    pub fn new(
        name: impl Into<String>,
        selector: Rc<SelectorFn<O>>,
        values: impl IntoIterator<Item = Value>,
    ) -> ValueMatcher<O> {
        let mut accepted: Vec<Value> = Vec::new();
        for value in values {
            if !accepted.contains(&value) {
                accepted.push(value);
            }
        }
        ValueMatcher {
            name: name.into(),
            selector,
            values: accepted,
        }
    }

    /// Whether the acceptance set is empty (nothing can ever match).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `object`'s selected value is in the acceptance set.
    pub fn matches(&self, object: &O, context: &mut MatchContext) -> bool {
        let selected = context.select(&self.name, self.selector.as_ref(), object);
        self.values.contains(selected)
    }

    /// Intersect the acceptance sets, keeping this matcher's selector.
    /// An empty intersection means no object could satisfy both, so there
    /// is no matcher to return.
    pub fn intersect(&self, other: &ValueMatcher<O>) -> Option<ValueMatcher<O>> {
        let values: Vec<Value> = self
            .values
            .iter()
            .filter(|value| other.values.contains(value))
            .cloned()
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(ValueMatcher {
            name: self.name.clone(),
            selector: Rc::clone(&self.selector),
            values,
        })
    }
}

impl<O> Clone for ValueMatcher<O> {
    fn clone(&self) -> ValueMatcher<O> {
        ValueMatcher {
            name: self.name.clone(),
            selector: Rc::clone(&self.selector),
            values: self.values.clone(),
        }
    }
}

impl<O> PartialEq for ValueMatcher<O> {
    /// Acceptance-set equality, order-insensitive; the selector callable
    /// itself is not compared.
    fn eq(&self, other: &ValueMatcher<O>) -> bool {
        self.name == other.name
            && self.values.len() == other.values.len()
            && self.values.iter().all(|value| other.values.contains(value))
    }
}

impl<O> fmt::Debug for ValueMatcher<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueMatcher({} in {:?})", self.name, self.values)
    }
}

/// A conjunction of matchers keyed by selector name: an object matches a
/// query when every constituent matcher accepts it. The empty query
/// matches everything.
pub struct Query<O> {
    matchers: IndexMap<String, ValueMatcher<O>>,
    selectors: Rc<Selectors<O>>,
}

impl<O> Query<O> {
    /// A query over the given matchers.
    pub fn new(
        matchers: IndexMap<String, ValueMatcher<O>>,
        selectors: Rc<Selectors<O>>,
    ) -> Query<O> {
        Query {
            matchers,
            selectors,
        }
    }

    /// Whether every matcher accepts `object`.
    pub fn matches(&self, object: &O, context: &mut MatchContext) -> bool {
        self.matchers
            .values()
            .all(|matcher| matcher.matches(object, context))
    }

    /// The query matching exactly the objects both queries match, or
    /// `None` when no object could match both.
    ///
    /// Commutative and associative; the empty query is the unit.
    pub fn intersect(&self, other: &Query<O>) -> Option<Query<O>> {
        let mut matchers = self.matchers.clone();
        for (name, matcher) in &other.matchers {
            match matchers.get(name) {
                Some(existing) => {
                    let narrowed = existing.intersect(matcher)?;
                    matchers.insert(name.clone(), narrowed);
                }
                None => {
                    matchers.insert(name.clone(), matcher.clone());
                }
            }
        }
        Some(Query {
            matchers,
            selectors: Rc::clone(&self.selectors),
        })
    }
}

impl<O> Clone for Query<O> {
    fn clone(&self) -> Query<O> {
        Query {
            matchers: self.matchers.clone(),
            selectors: Rc::clone(&self.selectors),
        }
    }
}

impl<O> PartialEq for Query<O> {
    fn eq(&self, other: &Query<O>) -> bool {
        self.matchers.len() == other.matchers.len()
            && self.matchers.iter().all(|(name, matcher)| {
                other
                    .matchers
                    .get(name)
                    .is_some_and(|theirs| matcher == theirs)
            })
    }
}

impl<O> fmt::Debug for Query<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query {:?}", self.matchers)
    }
}

/// An immutable update merged into the output mapping when a condition's
/// query succeeds. Later applications overwrite earlier values for the
/// same key.
#[derive(Clone, Debug, PartialEq)]
pub struct Setter {
    updates: Map<String, Value>,
}

impl Setter {
    /// A setter applying the given updates.
    pub fn new(updates: Map<String, Value>) -> Setter {
        Setter { updates }
    }

    /// Merge the updates into `output`, overwriting existing keys.
    pub fn apply(&self, output: &mut Map<String, Value>) {
        for (key, value) in &self.updates {
            output.insert(key.clone(), value.clone());
        }
    }
}

/// One rule of the tree: a query, an optional setter, an optional
/// documentation annotation, and an optional nested switch.
pub struct Condition<O> {
    query: Query<O>,
    setter: Option<Setter>,
    annotation: Option<String>,
    subconditions: Option<Switch<O>>,
}

impl<O> Condition<O> {
    /// Assemble a condition.
    pub fn new(
        query: Query<O>,
        setter: Option<Setter>,
        annotation: Option<String>,
        subconditions: Option<Switch<O>>,
    ) -> Condition<O> {
        Condition {
            query,
            setter,
            annotation,
            subconditions,
        }
    }

    /// The configuration author's `_annotation`, if any.
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Evaluate the query; on success apply the setter, then recurse into
    /// the nested switch. Returns whether the query succeeded.
    pub fn matches(
        &self,
        object: &O,
        context: &mut MatchContext,
        output: &mut Map<String, Value>,
    ) -> bool {
        if !self.query.matches(object, context) {
            return false;
        }
        if let Some(setter) = &self.setter {
            setter.apply(output);
        }
        if let Some(subconditions) = &self.subconditions {
            subconditions.matches(object, context, output);
        }
        true
    }
}

impl<O> fmt::Debug for Condition<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Condition {} [{:?}, {:?}]",
            self.annotation.as_deref().unwrap_or(""),
            self.query,
            self.setter
        )
    }
}

/// An ordered list of conditions with one of two traversal semantics.
pub enum Switch<O> {
    /// Evaluate in order, stop after the first condition that matches.
    ApplyFirst(Vec<Condition<O>>),
    /// Evaluate every condition; each match applies independently, and
    /// later matches overwrite earlier output keys.
    ApplyAll(Vec<Condition<O>>),
}

impl<O> Switch<O> {
    /// Walk the conditions; returns whether at least one matched.
    pub fn matches(
        &self,
        object: &O,
        context: &mut MatchContext,
        output: &mut Map<String, Value>,
    ) -> bool {
        match self {
            Switch::ApplyFirst(conditions) => conditions
                .iter()
                .any(|condition| condition.matches(object, context, output)),
            Switch::ApplyAll(conditions) => {
                let mut matched = false;
                for condition in conditions {
                    if condition.matches(object, context, output) {
                        matched = true;
                    }
                }
                matched
            }
        }
    }
}

impl<O> fmt::Debug for Switch<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Switch::ApplyFirst(conditions) => f.debug_tuple("ApplyFirst").field(conditions).finish(),
            Switch::ApplyAll(conditions) => f.debug_tuple("ApplyAll").field(conditions).finish(),
        }
    }
}

/// A compiled decision tree.
///
/// Construction validates the configuration twice (against the fixed
/// meta-schema, then against a grammar derived from the configuration's
/// own `selectors`/`output` declarations) and compiles it. The tree is
/// immutable afterwards; each evaluation produces a fresh output mapping.
///
/// ```
/// use dectree::{Selectors, SolutionTree};
/// use serde_json::json;
///
/// struct Apple { color: String }
///
/// let config = json!({
///     "schema": {
///         "selectors": { "color": ["red", "green"] },
///         "output": { "is good": "bool" }
///     },
///     "apply first": [
///         { "when": { "color": "green" }, "set": { "is good": true } },
///         { "when": {}, "set": { "is good": false } }
///     ]
/// });
/// let selectors = Selectors::new().with("color", |apple: &Apple| apple.color.clone());
/// let tree = SolutionTree::new(&config, selectors).unwrap();
///
/// let verdict = tree.match_update(&Apple { color: "green".into() });
/// assert_eq!(verdict.get("is good"), Some(&json!(true)));
/// ```
pub struct SolutionTree<O> {
    root: Switch<O>,
}

impl<O: 'static> SolutionTree<O> {
    /// Validate and compile `config` against the host `selectors`.
    pub fn new(config: &Value, selectors: Selectors<O>) -> Result<SolutionTree<O>, Error> {
        let selectors = Rc::new(selectors);
        let root = compile::compile(config, &selectors)?;
        Ok(SolutionTree { root })
    }

    /// Load a configuration file, then validate and compile it.
    pub fn from_file(
        path: impl AsRef<Path>,
        selectors: Selectors<O>,
    ) -> Result<SolutionTree<O>, Error> {
        let config = load::load_config(path.as_ref())?;
        SolutionTree::new(&config, selectors)
    }

    /// Evaluate one object, accumulating output annotations.
    ///
    /// Never fails; a selector that panics propagates its panic.
    pub fn match_update(&self, object: &O) -> Map<String, Value> {
        let mut context = MatchContext::new();
        let mut output = Map::new();
        self.root.matches(object, &mut context, &mut output);
        output
    }
}

impl<O> fmt::Debug for SolutionTree<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionTree")
            .field("root", &self.root)
            .finish()
    }
}
