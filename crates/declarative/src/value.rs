//! Tri-state typed values
//!
//! Every attribute value is [`Value::Known`], [`Value::Null`] or
//! [`Value::Unknown`]. Unknown marks a computed attribute whose value is only
//! available after the remote operation completes.

use crate::document::{AttributePath, Document};
use crate::error::{Error, Result};
use std::fmt;

/// Kind of a value, used for type checks and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Int64,
    Float64,
    Bool,
    List,
    Object,
    Null,
    Unknown,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Object => "object",
            Self::Null => "null",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A concrete value
#[derive(Debug, Clone)]
pub enum Known {
    String(String),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    List(Vec<Value>),
    Object(Document),
}

impl Known {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Int64(_) => ValueKind::Int64,
            Self::Float64(_) => ValueKind::Float64,
            Self::Bool(_) => ValueKind::Bool,
            Self::List(_) => ValueKind::List,
            Self::Object(_) => ValueKind::Object,
        }
    }
}

impl PartialEq for Known {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Attribute value with known / null / unknown state
///
/// Equality is structural except that [`Value::Unknown`] is never equal to
/// anything, another Unknown included. The diff engine relies on this to
/// treat pending values as changed.
#[derive(Debug, Clone)]
pub enum Value {
    Known(Known),
    Null,
    Unknown,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Unknown, _) | (_, Self::Unknown) => false,
            _ => false,
        }
    }
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::Known(Known::String(value.into()))
    }

    pub fn int64(value: i64) -> Self {
        Self::Known(Known::Int64(value))
    }

    pub fn float64(value: f64) -> Self {
        Self::Known(Known::Float64(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::Known(Known::Bool(value))
    }

    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Known(Known::List(values.into_iter().collect()))
    }

    pub fn object(document: Document) -> Self {
        Self::Known(Known::Object(document))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Known(known) => known.kind(),
            Self::Null => ValueKind::Null,
            Self::Unknown => ValueKind::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whether this value or anything nested inside it is Unknown
    pub fn contains_unknown(&self) -> bool {
        match self {
            Self::Unknown => true,
            Self::Null => false,
            Self::Known(Known::List(items)) => items.iter().any(Value::contains_unknown),
            Self::Known(Known::Object(doc)) => doc.values().any(Value::contains_unknown),
            Self::Known(_) => false,
        }
    }

    /// Return the known value if it has the requested kind
    pub fn as_kind(&self, kind: ValueKind) -> Result<&Known> {
        match self {
            Self::Known(known) if known.kind() == kind => Ok(known),
            other => Err(Error::TypeMismatch {
                path: AttributePath::root(),
                expected: kind,
                found: other.kind(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self.as_kind(ValueKind::String)? {
            Known::String(s) => Ok(s),
            other => Err(mismatch(ValueKind::String, other.kind())),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self.as_kind(ValueKind::Int64)? {
            Known::Int64(n) => Ok(*n),
            other => Err(mismatch(ValueKind::Int64, other.kind())),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self.as_kind(ValueKind::Float64)? {
            Known::Float64(n) => Ok(*n),
            other => Err(mismatch(ValueKind::Float64, other.kind())),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self.as_kind(ValueKind::Bool)? {
            Known::Bool(b) => Ok(*b),
            other => Err(mismatch(ValueKind::Bool, other.kind())),
        }
    }

    pub fn as_list(&self) -> Result<&[Value]> {
        match self.as_kind(ValueKind::List)? {
            Known::List(items) => Ok(items),
            other => Err(mismatch(ValueKind::List, other.kind())),
        }
    }

    pub fn as_object(&self) -> Result<&Document> {
        match self.as_kind(ValueKind::Object)? {
            Known::Object(doc) => Ok(doc),
            other => Err(mismatch(ValueKind::Object, other.kind())),
        }
    }

    /// Replace every Unknown (at any depth) with Null
    pub fn resolve_unknowns(self) -> Self {
        match self {
            Self::Unknown => Self::Null,
            Self::Known(Known::List(items)) => {
                Self::list(items.into_iter().map(Value::resolve_unknowns))
            }
            Self::Known(Known::Object(doc)) => Self::object(doc.resolve_unknowns()),
            other => other,
        }
    }

    /// Render the id form of a value (`"7"` for both `Int64(7)` and `String("7")`)
    pub fn id_string(&self) -> Option<String> {
        match self {
            Self::Known(Known::String(s)) if !s.is_empty() => Some(s.clone()),
            Self::Known(Known::Int64(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn mismatch(expected: ValueKind, found: ValueKind) -> Error {
    Error::TypeMismatch {
        path: AttributePath::root(),
        expected,
        found,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Unknown => f.write_str("(known after apply)"),
            Self::Known(Known::String(s)) => write!(f, "{s:?}"),
            Self::Known(Known::Int64(n)) => write!(f, "{n}"),
            Self::Known(Known::Float64(n)) => write!(f, "{n}"),
            Self::Known(Known::Bool(b)) => write!(f, "{b}"),
            Self::Known(Known::List(items)) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Known(Known::Object(doc)) => {
                f.write_str("{")?;
                for (i, (name, value)) in doc.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} = {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::int64(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::int64(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::float64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::bool(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Self::object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_never_equal() {
        assert_ne!(Value::Unknown, Value::Unknown);
        assert_ne!(Value::Unknown, Value::Null);
        assert_ne!(Value::int64(1), Value::Unknown);
    }

    #[test]
    fn test_known_equality() {
        assert_eq!(Value::string("latte"), Value::string("latte"));
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::int64(1), Value::float64(1.0));
        assert_eq!(
            Value::list([Value::int64(1), Value::int64(2)]),
            Value::list([Value::int64(1), Value::int64(2)])
        );
    }

    #[test]
    fn test_list_containing_unknown_is_not_equal() {
        let a = Value::list([Value::Unknown]);
        let b = Value::list([Value::Unknown]);
        assert_ne!(a, b);
        assert!(a.contains_unknown());
    }

    #[test]
    fn test_as_kind_coercion() {
        assert_eq!(Value::int64(7).as_i64().unwrap(), 7);
        assert_eq!(Value::string("x").as_str().unwrap(), "x");
        assert!((Value::float64(2.5).as_f64().unwrap() - 2.5).abs() < f64::EPSILON);

        match Value::string("7").as_i64() {
            Err(Error::TypeMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, ValueKind::Int64);
                assert_eq!(found, ValueKind::String);
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_null_and_unknown_do_not_coerce() {
        assert!(matches!(
            Value::Null.as_str(),
            Err(Error::TypeMismatch {
                found: ValueKind::Null,
                ..
            })
        ));
        assert!(matches!(
            Value::Unknown.as_bool(),
            Err(Error::TypeMismatch {
                found: ValueKind::Unknown,
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_unknowns() {
        let value = Value::list([Value::Unknown, Value::int64(3)]).resolve_unknowns();
        assert_eq!(value, Value::list([Value::Null, Value::int64(3)]));
    }

    #[test]
    fn test_id_string() {
        assert_eq!(Value::int64(7).id_string().as_deref(), Some("7"));
        assert_eq!(Value::string("12").id_string().as_deref(), Some("12"));
        assert_eq!(Value::string("").id_string(), None);
        assert_eq!(Value::Unknown.id_string(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Unknown.to_string(), "(known after apply)");
        assert_eq!(
            Value::list([Value::string("a"), Value::int64(2)]).to_string(),
            "[\"a\", 2]"
        );
    }
}
