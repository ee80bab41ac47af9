//! Resource documents and attribute paths
//!
//! A [`Document`] is an ordered mapping from attribute name to [`Value`].
//! An attribute missing from the document is *omitted*, which the diff
//! engine treats differently from an attribute explicitly set to Null.

use crate::error::{Error, Result};
use crate::schema::{Attribute, AttributeType, Schema};
use crate::value::{Known, Value};
use std::fmt;

/// One step in an attribute path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Attribute(String),
    Index(usize),
}

/// Location of a (possibly nested) attribute, e.g. `items[0].coffee.id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn attribute(name: &str) -> Self {
        Self(vec![PathStep::Attribute(name.to_string())])
    }

    /// Extend the path with an attribute name
    pub fn child(&self, name: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Attribute(name.to_string()));
        Self(steps)
    }

    /// Extend the path with a list index
    pub fn index(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(index));
        Self(steps)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => f.write_str(name)?,
                PathStep::Attribute(name) => write!(f, ".{name}")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// How strictly a document is checked against its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Caller-supplied plan: required attributes must be present, Unknown only on computed
    Desired,
    /// Persisted or post-apply state: no Unknown anywhere
    State,
    /// Data source configuration: like `Desired`, computed attributes must be omitted
    Config,
}

/// Ordered mapping from attribute name to value
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(name, value)| other.get(name).is_some_and(|v| v == value))
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document and validate it as a desired plan against `schema`
    pub fn build<I, K>(schema: &Schema, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let doc: Self = entries.into_iter().collect();
        doc.validate(schema, Validation::Desired)?;
        Ok(doc)
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Value of an attribute, treating omitted as Null
    pub fn value_or_null(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Set an attribute, keeping its position if already present
    pub fn set(&mut self, name: &str, value: Value) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every Unknown (at any depth) with Null
    pub fn resolve_unknowns(self) -> Self {
        self.entries
            .into_iter()
            .map(|(name, value)| (name, value.resolve_unknowns()))
            .collect()
    }

    /// Check the document against `schema`
    pub fn validate(&self, schema: &Schema, mode: Validation) -> Result<()> {
        validate_object(self, schema, &AttributePath::root(), mode)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut doc = Self::new();
        for (name, value) in iter {
            doc.set(&name.into(), value);
        }
        doc
    }
}

fn validate_object(
    doc: &Document,
    schema: &Schema,
    path: &AttributePath,
    mode: Validation,
) -> Result<()> {
    for (name, _) in doc.iter() {
        if schema.attribute(name).is_none() {
            return Err(Error::violation(
                &path.child(name),
                "attribute is not defined in the schema",
            ));
        }
    }

    for (name, attribute) in schema.attributes() {
        let attr_path = path.child(name);
        match doc.get(name) {
            None => {
                if attribute.required && mode != Validation::State {
                    return Err(Error::violation(&attr_path, "required attribute is missing"));
                }
            }
            Some(value) => validate_value(value, attribute, &attr_path, mode)?,
        }
    }
    Ok(())
}

fn validate_value(
    value: &Value,
    attribute: &Attribute,
    path: &AttributePath,
    mode: Validation,
) -> Result<()> {
    match value {
        Value::Unknown => match mode {
            Validation::State => Err(Error::violation(path, "unknown value in state")),
            _ if !attribute.computed => Err(Error::violation(
                path,
                "only computed attributes may be unknown",
            )),
            _ => Ok(()),
        },
        Value::Null => {
            if attribute.required && mode != Validation::State {
                Err(Error::violation(path, "required attribute is null"))
            } else {
                Ok(())
            }
        }
        Value::Known(_) if mode == Validation::Config && attribute.is_computed_only() => Err(
            Error::violation(path, "computed attribute cannot be configured"),
        ),
        Value::Known(known) => validate_known(known, &attribute.ty, attribute.computed, path, mode),
    }
}

/// `computed` is the flag of the attribute owning `known`; list elements
/// may only be unknown under a computed attribute.
fn validate_known(
    known: &Known,
    ty: &AttributeType,
    computed: bool,
    path: &AttributePath,
    mode: Validation,
) -> Result<()> {
    let expected = ty.kind();
    if known.kind() != expected {
        return Err(Error::TypeMismatch {
            path: path.clone(),
            expected,
            found: known.kind(),
        });
    }

    match (known, ty) {
        (Known::List(items), AttributeType::List(element)) => {
            for (index, item) in items.iter().enumerate() {
                let item_path = path.index(index);
                match item {
                    Value::Known(inner) => {
                        validate_known(inner, element, computed, &item_path, mode)?;
                    }
                    Value::Null => {
                        return Err(Error::violation(&item_path, "list elements cannot be null"));
                    }
                    Value::Unknown if mode == Validation::State => {
                        return Err(Error::violation(&item_path, "unknown value in state"));
                    }
                    Value::Unknown if !computed => {
                        return Err(Error::violation(
                            &item_path,
                            "only computed attributes may be unknown",
                        ));
                    }
                    Value::Unknown => {}
                }
            }
            Ok(())
        }
        (Known::Object(doc), AttributeType::Object(schema)) => {
            validate_object(doc, schema, path, mode)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeType, Schema};
    use crate::value::ValueKind;

    fn order_schema() -> Schema {
        Schema::new()
            .with_attribute("id", Attribute::computed(AttributeType::int64()))
            .with_attribute("quantity", Attribute::required(AttributeType::int64()))
            .with_attribute("note", Attribute::optional(AttributeType::string()))
    }

    #[test]
    fn test_path_display() {
        let path = AttributePath::attribute("items").index(0).child("coffee").child("id");
        assert_eq!(path.to_string(), "items[0].coffee.id");
        assert_eq!(AttributePath::root().to_string(), "<root>");
    }

    #[test]
    fn test_set_keeps_order() {
        let mut doc = Document::new().with("a", 1).with("b", 2);
        doc.set("a", Value::int64(3));
        let names: Vec<_> = doc.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(doc.get("a"), Some(&Value::int64(3)));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = Document::new().with("a", 1).with("b", "x");
        let b = Document::new().with("b", "x").with("a", 1);
        assert_eq!(a, b);
        assert_ne!(a, Document::new().with("a", 1));
    }

    #[test]
    fn test_omitted_differs_from_null() {
        let doc = Document::new().with("note", Value::Null);
        assert!(doc.contains("note"));
        assert!(!doc.contains("quantity"));
        assert_eq!(doc.value_or_null("quantity"), Value::Null);
    }

    #[test]
    fn test_build_valid_document() {
        let doc = Document::build(&order_schema(), [("quantity", Value::int64(2))]).unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_build_missing_required() {
        let err = Document::build(&order_schema(), [("note", Value::string("hot"))]).unwrap_err();
        match err {
            Error::SchemaViolation { path, .. } => assert_eq!(path.to_string(), "quantity"),
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_build_unknown_attribute() {
        let err = Document::build(
            &order_schema(),
            [("quantity", Value::int64(2)), ("colour", Value::string("red"))],
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { .. }));
    }

    #[test]
    fn test_build_type_mismatch() {
        let err = Document::build(&order_schema(), [("quantity", Value::string("two"))])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: ValueKind::Int64,
                found: ValueKind::String,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_only_on_computed() {
        let schema = order_schema();
        let doc = Document::new()
            .with("id", Value::Unknown)
            .with("quantity", Value::int64(1));
        assert!(doc.validate(&schema, Validation::Desired).is_ok());
        assert!(doc.validate(&schema, Validation::State).is_err());

        let doc = Document::new().with("quantity", Value::Unknown);
        assert!(doc.validate(&schema, Validation::Desired).is_err());
    }

    fn violation_path(result: Result<()>) -> String {
        match result.unwrap_err() {
            Error::SchemaViolation { path, .. } => path.to_string(),
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_list_element_only_on_computed() {
        let schema = Schema::new()
            .with_attribute(
                "tags",
                Attribute::required(AttributeType::list(AttributeType::string())),
            )
            .with_attribute(
                "matrix",
                Attribute::optional(AttributeType::list(AttributeType::list(
                    AttributeType::int64(),
                ))),
            )
            .with_attribute(
                "labels",
                Attribute::optional_computed(AttributeType::list(AttributeType::string())),
            );

        let doc = Document::new().with("tags", Value::list([Value::string("a"), Value::Unknown]));
        for mode in [Validation::Desired, Validation::Config] {
            assert_eq!(violation_path(doc.validate(&schema, mode)), "tags[1]");
        }

        let doc = Document::new()
            .with("tags", Value::list([Value::string("a")]))
            .with("matrix", Value::list([Value::list([Value::Unknown])]));
        assert_eq!(
            violation_path(doc.validate(&schema, Validation::Desired)),
            "matrix[0][0]"
        );

        let doc = Document::new()
            .with("tags", Value::list([Value::string("a")]))
            .with("labels", Value::list([Value::Unknown]));
        assert!(doc.validate(&schema, Validation::Desired).is_ok());
        assert!(doc.validate(&schema, Validation::State).is_err());
    }

    #[test]
    fn test_unknown_inside_object_of_plain_attribute() {
        let item = Schema::new()
            .with_attribute("quantity", Attribute::required(AttributeType::int64()))
            .with_attribute("name", Attribute::computed(AttributeType::string()));
        let schema = Schema::new().with_attribute(
            "items",
            Attribute::required(AttributeType::list(AttributeType::object(item))),
        );

        let computed_child = Document::new().with(
            "items",
            Value::list([Value::object(
                Document::new().with("quantity", 1).with("name", Value::Unknown),
            )]),
        );
        assert!(computed_child.validate(&schema, Validation::Desired).is_ok());

        let plain_child = Document::new().with(
            "items",
            Value::list([Value::object(Document::new().with("quantity", Value::Unknown))]),
        );
        assert_eq!(
            violation_path(plain_child.validate(&schema, Validation::Desired)),
            "items[0].quantity"
        );
    }

    #[test]
    fn test_decoded_sentinel_in_plain_list_is_rejected() {
        let schema = Schema::new().with_attribute(
            "tags",
            Attribute::required(AttributeType::list(AttributeType::string())),
        );
        let json = serde_json::json!({ "tags": [crate::codec::UNKNOWN_SENTINEL] });
        let doc = crate::codec::decode(&json, &schema).unwrap();

        let tags = doc.get("tags").unwrap().as_list().unwrap();
        assert!(tags[0].is_unknown());
        assert_eq!(violation_path(doc.validate(&schema, Validation::Desired)), "tags[0]");
    }

    #[test]
    fn test_nested_validation() {
        let coffee = Schema::new()
            .with_attribute("id", Attribute::required(AttributeType::int64()))
            .with_attribute("name", Attribute::computed(AttributeType::string()));
        let item = Schema::new()
            .with_attribute("coffee", Attribute::required(AttributeType::object(coffee)))
            .with_attribute("quantity", Attribute::required(AttributeType::int64()));
        let schema = Schema::new().with_attribute(
            "items",
            Attribute::required(AttributeType::list(AttributeType::object(item))),
        );

        let good = Document::new().with(
            "items",
            Value::list([Value::object(
                Document::new()
                    .with("coffee", Document::new().with("id", 1))
                    .with("quantity", 2),
            )]),
        );
        assert!(good.validate(&schema, Validation::Desired).is_ok());

        let bad = Document::new().with(
            "items",
            Value::list([Value::object(
                Document::new()
                    .with("coffee", Document::new().with("name", "latte"))
                    .with("quantity", 2),
            )]),
        );
        match bad.validate(&schema, Validation::Desired).unwrap_err() {
            Error::SchemaViolation { path, .. } => {
                assert_eq!(path.to_string(), "items[0].coffee.id");
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_config_rejects_computed_values() {
        let schema = order_schema();
        let doc = Document::new().with("id", 3).with("quantity", 1);
        assert!(doc.validate(&schema, Validation::Config).is_err());
    }
}
