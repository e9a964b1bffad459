//! Three-phase compilation of a JSON configuration into a decision tree.
//!
//! Phase A checks the outer shape against a fixed meta-grammar and splits
//! the document into its `schema` half and its switch half. Phase B lifts
//! the schema's type expressions into parsers. Phase C synthesises a
//! grammar *from those parsers* (the `when` clause accepts exactly the
//! declared selectors at their declared types, the `set` clause exactly
//! the declared output keys) and runs it over the switch half, emitting
//! the compiled tree through constructor callbacks.
//!
//! Synthesising the body grammar from the user's own schema is the point:
//! a `when` clause naming an undeclared selector fails compilation with
//! the same quality of message as any type mismatch.

use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{Map, Value};

use crate::error::{ConstructionError, Error};
use crate::parsers::{
    constant, dict_exp, dict_of, enumerated, identity, list_of, opt, req, typed, union, Field,
    Parsed, Parser, Scope, ValueType,
};
use crate::tree::{Condition, Query, Selectors, Setter, Switch, ValueMatcher};

const WHEN_CLAUSE: &str = "when";
const SET_CLAUSE: &str = "set";
const ALSO_CLAUSE: &str = "also";
const ANNOTATION_CLAUSE: &str = "_annotation";

const APPLY_FIRST: &str = "apply first";
const APPLY_ALL: &str = "apply all";

const REQUIRED_PRESENT: &str = "internal error: required field missing after a successful parse";

/// Validate `config` and compile it into an evaluation tree.
pub(crate) fn compile<O: 'static>(
    config: &Value,
    selectors: &Rc<Selectors<O>>,
) -> Result<Switch<O>, Error> {
    let parts = split_config(config)?;
    trace!("configuration outer shape accepted");

    let (selectors_schema, output_schema) = interpret_schema(&parts.schema)?;
    debug!(
        "schema declares {} selectors and {} output keys",
        selectors_schema.len(),
        output_schema.len()
    );
    for name in selectors_schema.keys() {
        if !selectors.contains(name) {
            return Err(ConstructionError::MissingSelector(name.clone()).into());
        }
    }

    parse_switch(&parts.tree, selectors_schema, output_schema, selectors)
}

/// The two halves of a configuration document.
struct RootParts {
    schema: Value,
    tree: Value,
}

/// Phase A: the outer meta-grammar.
///
/// Accepts `{"schema": …, "apply first": […]}` or the `apply all`
/// equivalent. The schema is only checked to be a mapping with `selectors`
/// and `output` mappings; deep validation is phase B's job.
fn split_config(config: &Value) -> Result<RootParts, Error> {
    let scope = Scope::new("Full", |scoped| {
        [
            (
                "Schema",
                dict_exp([
                    ("selectors", req(typed(ValueType::Dict))),
                    ("output", req(typed(ValueType::Dict))),
                ]),
            ),
            (
                "root",
                union([
                    dict_exp([
                        ("schema", req(scoped("Schema"))),
                        (APPLY_FIRST, req(typed(ValueType::List))),
                    ])
                    .construct(|parsed| Ok(Parsed::node(reassemble_root(parsed, APPLY_FIRST)))),
                    dict_exp([
                        ("schema", req(scoped("Schema"))),
                        (APPLY_ALL, req(typed(ValueType::List))),
                    ])
                    .construct(|parsed| Ok(Parsed::node(reassemble_root(parsed, APPLY_ALL)))),
                ]),
            ),
        ]
    });
    let parsed = scope.get_scoped_parser("root")?.parse_value(config, false)?;
    Ok(parsed.into_node::<RootParts>())
}

fn reassemble_root(parsed: Parsed, switch_key: &str) -> RootParts {
    let mut fields = parsed.into_fields();
    let schema = fields
        .shift_remove("schema")
        .expect(REQUIRED_PRESENT)
        .into_json();
    let conditions = fields
        .shift_remove(switch_key)
        .expect(REQUIRED_PRESENT)
        .into_json();
    let mut tree = Map::new();
    tree.insert(switch_key.to_string(), conditions);
    RootParts {
        schema,
        tree: Value::Object(tree),
    }
}

/// A schema half lifted into parsers: name → value parser.
type ParserTable = IndexMap<String, Rc<Parser>>;

/// Phase B: interpret the type sublanguage.
///
/// `"bool"`, `"str"`, `"number"`, and scalar-literal lists are legal for
/// selectors; output keys additionally accept `{"list of": <type>}`. Each
/// surface form's constructor returns the parser it denotes.
fn interpret_schema(schema: &Value) -> Result<(ParserTable, ParserTable), Error> {
    let scope = Scope::new("Schema", |scoped| {
        [
            (
                "bool_type",
                constant("bool").construct(|_| Ok(Parsed::node(typed(ValueType::Bool)))),
            ),
            (
                "str_type",
                constant("str").construct(|_| Ok(Parsed::node(typed(ValueType::Str)))),
            ),
            (
                "number_type",
                constant("number").construct(|_| {
                    Ok(Parsed::node(union([
                        typed(ValueType::Int),
                        typed(ValueType::Float),
                    ])))
                }),
            ),
            (
                "enum",
                list_of(union([
                    constant(Value::Null),
                    typed(ValueType::Str),
                    typed(ValueType::Int),
                    typed(ValueType::Float),
                    typed(ValueType::Bool),
                ]))
                .construct(|parsed| {
                    let members: Vec<Value> = parsed
                        .into_seq()
                        .into_iter()
                        .map(Parsed::into_json)
                        .collect();
                    Ok(Parsed::node(enumerated(members)))
                }),
            ),
            (
                "array",
                dict_exp([(
                    "list of",
                    req(union([
                        scoped("bool_type"),
                        scoped("str_type"),
                        scoped("number_type"),
                        scoped("enum"),
                    ])),
                )])
                .construct(|parsed| {
                    let mut fields = parsed.into_fields();
                    let element = fields
                        .shift_remove("list of")
                        .expect(REQUIRED_PRESENT)
                        .into_node::<Parser>();
                    Ok(Parsed::node(list_of(element)))
                }),
            ),
            (
                "root",
                dict_exp([
                    (
                        "selectors",
                        req(dict_of(union([
                            scoped("bool_type"),
                            scoped("str_type"),
                            scoped("number_type"),
                            scoped("enum"),
                        ]))),
                    ),
                    (
                        "output",
                        req(dict_of(union([
                            scoped("bool_type"),
                            scoped("str_type"),
                            scoped("number_type"),
                            scoped("enum"),
                            scoped("array"),
                        ]))),
                    ),
                ]),
            ),
        ]
    });
    let parsed = scope.get_scoped_parser("root")?.parse_value(schema, false)?;
    let mut fields = parsed.into_fields();
    let selectors = parser_table(fields.shift_remove("selectors").expect(REQUIRED_PRESENT));
    let output = parser_table(fields.shift_remove("output").expect(REQUIRED_PRESENT));
    Ok((selectors, output))
}

fn parser_table(parsed: Parsed) -> ParserTable {
    parsed
        .into_fields()
        .into_iter()
        .map(|(name, parser)| (name, Rc::new(parser.into_node::<Parser>())))
        .collect()
}

/// Phase C: synthesise the body grammar and parse the switch half.
fn parse_switch<O: 'static>(
    tree: &Value,
    selectors_schema: ParserTable,
    output_schema: ParserTable,
    selectors: &Rc<Selectors<O>>,
) -> Result<Switch<O>, Error> {
    let scope = Scope::new("SolutionTree", |scoped| {
        // Each declared selector becomes an optional `when` field taking a
        // single value or a list of values of the declared type; either way
        // the constructor packages a matcher over that selector.
        let mut when_fields: Vec<(String, Field)> = Vec::new();
        for (name, value_parser) in &selectors_schema {
            let selector = Rc::clone(
                selectors
                    .get(name)
                    .expect("internal error: selector presence checked before synthesis"),
            );
            let single = {
                let name = name.clone();
                let selector = Rc::clone(&selector);
                identity(Rc::clone(value_parser), move |parsed| {
                    Ok(Parsed::node(ValueMatcher::new(
                        name.clone(),
                        Rc::clone(&selector),
                        [parsed.into_json()],
                    )))
                })
            };
            let multi = {
                let name = name.clone();
                let selector = Rc::clone(&selector);
                list_of(Rc::clone(value_parser)).construct(move |parsed| {
                    let values: Vec<Value> = parsed
                        .into_seq()
                        .into_iter()
                        .map(Parsed::into_json)
                        .collect();
                    Ok(Parsed::node(ValueMatcher::new(
                        name.clone(),
                        Rc::clone(&selector),
                        values,
                    )))
                })
            };
            when_fields.push((name.clone(), opt(union([single, multi]))));
        }
        let when_clause = {
            let selectors = Rc::clone(selectors);
            dict_exp(when_fields).construct(move |parsed| {
                let matchers: IndexMap<String, ValueMatcher<O>> = parsed
                    .into_fields()
                    .into_iter()
                    .map(|(name, matcher)| (name, matcher.into_node::<ValueMatcher<O>>()))
                    .collect();
                Ok(Parsed::node(Query::new(matchers, Rc::clone(&selectors))))
            })
        };

        let set_fields: Vec<(String, Field)> = output_schema
            .iter()
            .map(|(name, value_parser)| (name.clone(), opt(Rc::clone(value_parser))))
            .collect();
        let set_clause = dict_exp(set_fields).construct(|parsed| {
            let updates: Map<String, Value> = parsed
                .into_fields()
                .into_iter()
                .map(|(name, value)| (name, value.into_json()))
                .collect();
            Ok(Parsed::node(Setter::new(updates)))
        });

        let condition = dict_exp([
            (ANNOTATION_CLAUSE, opt(typed(ValueType::Str))),
            (WHEN_CLAUSE, req(scoped("WhenClause"))),
            (SET_CLAUSE, req(scoped("SetClause"))),
            (
                ALSO_CLAUSE,
                opt(union([
                    // A bare list of subconditions reads as apply-first.
                    list_of(scoped("Condition")).construct(|parsed| {
                        Ok(Parsed::node(Switch::ApplyFirst(conditions_from::<O>(
                            parsed,
                        ))))
                    }),
                    scoped("SwitchAll"),
                    scoped("SwitchFirst"),
                ])),
            ),
        ])
        .construct(|parsed| {
            let mut fields = parsed.into_fields();
            let annotation =
                fields
                    .shift_remove(ANNOTATION_CLAUSE)
                    .map(|parsed| match parsed.into_json() {
                        Value::String(text) => text,
                        _ => unreachable!("annotation parses as a string"),
                    });
            let query = fields
                .shift_remove(WHEN_CLAUSE)
                .expect(REQUIRED_PRESENT)
                .into_node::<Query<O>>();
            let setter = fields
                .shift_remove(SET_CLAUSE)
                .map(|parsed| parsed.into_node::<Setter>());
            let subconditions = fields
                .shift_remove(ALSO_CLAUSE)
                .map(|parsed| parsed.into_node::<Switch<O>>());
            Ok(Parsed::node(Condition::new(
                query,
                setter,
                annotation,
                subconditions,
            )))
        });

        let switch_first =
            dict_exp([(APPLY_FIRST, req(list_of(scoped("Condition"))))]).construct(|parsed| {
                let mut fields = parsed.into_fields();
                let conditions =
                    conditions_from::<O>(fields.shift_remove(APPLY_FIRST).expect(REQUIRED_PRESENT));
                Ok(Parsed::node(Switch::ApplyFirst(conditions)))
            });
        let switch_all =
            dict_exp([(APPLY_ALL, req(list_of(scoped("Condition"))))]).construct(|parsed| {
                let mut fields = parsed.into_fields();
                let conditions =
                    conditions_from::<O>(fields.shift_remove(APPLY_ALL).expect(REQUIRED_PRESENT));
                Ok(Parsed::node(Switch::ApplyAll(conditions)))
            });

        [
            ("SwitchFirst", switch_first),
            ("SwitchAll", switch_all),
            ("WhenClause", when_clause),
            ("SetClause", set_clause),
            ("Condition", condition),
        ]
    });

    let root = union([scope.scoped("SwitchAll"), scope.scoped("SwitchFirst")]);
    let parsed = root.parse_value(tree, false)?;
    trace!("switch body compiled");
    Ok(parsed.into_node::<Switch<O>>())
}

fn conditions_from<O: 'static>(parsed: Parsed) -> Vec<Condition<O>> {
    parsed
        .into_seq()
        .into_iter()
        .map(|condition| condition.into_node::<Condition<O>>())
        .collect()
}
