//! Runtime typing of JSON values and the dynamic result of a parse.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

/// The runtime type of a JSON value, as matched by `typed` and reported in
/// error messages.
///
/// Integral and floating-point numbers are distinct types: the schema
/// sublanguage treats the enum members `1` and `1.0` as different values,
/// and `typed(ValueType::Int)` must not accept `1.5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// JSON `null`.
    Null,
    /// JSON `true` / `false`.
    Bool,
    /// A JSON number with no fractional representation.
    Int,
    /// A JSON number carried as a float.
    Float,
    /// A JSON string.
    Str,
    /// A JSON array.
    List,
    /// A JSON object.
    Dict,
}

impl ValueType {
    /// The runtime type of a concrete value.
    pub fn of(value: &Value) -> ValueType {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(n) if n.is_f64() => ValueType::Float,
            Value::Number(_) => ValueType::Int,
            Value::String(_) => ValueType::Str,
            Value::Array(_) => ValueType::List,
            Value::Object(_) => ValueType::Dict,
        }
    }

    /// The name used in syntax strings.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::List => "list",
            ValueType::Dict => "dict",
        }
    }

    pub(crate) fn matches(self, value: &Value) -> bool {
        ValueType::of(value) == self
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The output of a successful parse.
///
/// Recognition works on plain [`Value`]s; construction may replace any part
/// of the tree with an arbitrary host value through a constructor callback.
/// `Parsed` is the glue between those two worlds: containers collect their
/// children into [`Parsed::Seq`] / [`Parsed::Fields`], and constructors
/// either pass results through or collapse them into a [`Parsed::Node`].
///
/// A grammar with no constructors round-trips: [`Parsed::into_json`]
/// reassembles exactly the value that was parsed.
pub enum Parsed {
    /// A JSON fragment, untouched by any constructor.
    Json(Value),
    /// The elements of a matched list, each possibly transformed.
    Seq(Vec<Parsed>),
    /// The entries of a matched mapping, each possibly transformed.
    Fields(IndexMap<String, Parsed>),
    /// A value built by a constructor callback.
    Node(Box<dyn Any>),
}

impl Parsed {
    /// Wrap a host value produced by a constructor.
    pub fn node<T: Any>(value: T) -> Parsed {
        Parsed::Node(Box::new(value))
    }

    /// Reassemble the plain JSON value this parse produced.
    ///
    /// # Panics
    ///
    /// If any part of the tree was replaced by a constructor-built node.
    pub fn into_json(self) -> Value {
        match self {
            Parsed::Json(value) => value,
            Parsed::Seq(items) => Value::Array(items.into_iter().map(Parsed::into_json).collect()),
            Parsed::Fields(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, value.into_json()))
                    .collect(),
            ),
            Parsed::Node(_) => {
                panic!("internal error: constructor node where plain JSON was expected")
            }
        }
    }

    /// The entries of a parsed mapping.
    ///
    /// # Panics
    ///
    /// If this parse did not produce a mapping.
    pub fn into_fields(self) -> IndexMap<String, Parsed> {
        match self {
            Parsed::Fields(fields) => fields,
            Parsed::Json(Value::Object(object)) => object
                .into_iter()
                .map(|(key, value)| (key, Parsed::Json(value)))
                .collect(),
            other => panic!("internal error: expected parsed fields, got {other:?}"),
        }
    }

    /// The elements of a parsed list.
    ///
    /// # Panics
    ///
    /// If this parse did not produce a list.
    pub fn into_seq(self) -> Vec<Parsed> {
        match self {
            Parsed::Seq(items) => items,
            Parsed::Json(Value::Array(items)) => items.into_iter().map(Parsed::Json).collect(),
            other => panic!("internal error: expected a parsed sequence, got {other:?}"),
        }
    }

    /// Unwrap a constructor-built node of a known type.
    ///
    /// # Panics
    ///
    /// If this is not a node, or the node holds a different type.
    pub fn into_node<T: Any>(self) -> T {
        match self {
            Parsed::Node(node) => *node
                .downcast::<T>()
                .unwrap_or_else(|_| panic!("internal error: downcast failed")),
            other => panic!("internal error: expected a constructor node, got {other:?}"),
        }
    }
}

impl From<Value> for Parsed {
    fn from(value: Value) -> Parsed {
        Parsed::Json(value)
    }
}

impl fmt::Debug for Parsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parsed::Json(value) => write!(f, "Json({value})"),
            Parsed::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Parsed::Fields(fields) => {
                write!(f, "Fields(")?;
                f.debug_map().entries(fields.iter()).finish()?;
                write!(f, ")")
            }
            Parsed::Node(_) => write!(f, "Node(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_type_of() {
        assert_eq!(ValueType::of(&json!(null)), ValueType::Null);
        assert_eq!(ValueType::of(&json!(true)), ValueType::Bool);
        assert_eq!(ValueType::of(&json!(3)), ValueType::Int);
        assert_eq!(ValueType::of(&json!(-3)), ValueType::Int);
        assert_eq!(ValueType::of(&json!(3.5)), ValueType::Float);
        assert_eq!(ValueType::of(&json!("3")), ValueType::Str);
        assert_eq!(ValueType::of(&json!([])), ValueType::List);
        assert_eq!(ValueType::of(&json!({})), ValueType::Dict);
    }

    #[test]
    fn test_bool_is_not_int() {
        // 0 and false are different values of different types.
        assert!(!ValueType::Int.matches(&json!(true)));
        assert!(!ValueType::Bool.matches(&json!(0)));
    }

    #[test]
    fn test_into_json_round_trip() {
        let fields: IndexMap<String, Parsed> = [
            ("a".to_string(), Parsed::Json(json!(1))),
            (
                "b".to_string(),
                Parsed::Seq(vec![Parsed::Json(json!(2)), Parsed::Json(json!("x"))]),
            ),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            Parsed::Fields(fields).into_json(),
            json!({"a": 1, "b": [2, "x"]})
        );
    }
}
