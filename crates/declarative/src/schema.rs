//! Attribute schemas
//!
//! A [`Schema`] declares the attributes of a resource or data source type:
//! their type and whether the caller must set them (required), may set them
//! (optional), or the server assigns them (computed). Schemas are validated
//! once when registered and are read-only afterwards.

use crate::document::AttributePath;
use crate::error::{Error, Result};
use crate::value::ValueKind;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier pattern is valid"));

/// Primitive attribute kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Int64,
    Float64,
    Bool,
}

impl PrimitiveKind {
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::String => ValueKind::String,
            Self::Int64 => ValueKind::Int64,
            Self::Float64 => ValueKind::Float64,
            Self::Bool => ValueKind::Bool,
        }
    }
}

/// Type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    Primitive(PrimitiveKind),
    /// Homogeneous list; elements may themselves be objects
    List(Box<AttributeType>),
    /// Nested object with its own schema
    Object(Schema),
}

impl AttributeType {
    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    pub fn int64() -> Self {
        Self::Primitive(PrimitiveKind::Int64)
    }

    pub fn float64() -> Self {
        Self::Primitive(PrimitiveKind::Float64)
    }

    pub fn bool() -> Self {
        Self::Primitive(PrimitiveKind::Bool)
    }

    pub fn list(element: AttributeType) -> Self {
        Self::List(Box::new(element))
    }

    pub fn object(schema: Schema) -> Self {
        Self::Object(schema)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// Value kind a known value of this type carries
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Primitive(kind) => kind.value_kind(),
            Self::List(_) => ValueKind::List,
            Self::Object(_) => ValueKind::Object,
        }
    }
}

/// A single attribute declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub ty: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Known value may not change once set (e.g. remote ids)
    pub immutable: bool,
    pub description: Option<String>,
}

impl Attribute {
    fn with_modifiers(ty: AttributeType, required: bool, optional: bool, computed: bool) -> Self {
        Self {
            ty,
            required,
            optional,
            computed,
            sensitive: false,
            immutable: false,
            description: None,
        }
    }

    /// Caller must set this attribute
    pub fn required(ty: AttributeType) -> Self {
        Self::with_modifiers(ty, true, false, false)
    }

    /// Caller may set this attribute
    pub fn optional(ty: AttributeType) -> Self {
        Self::with_modifiers(ty, false, true, false)
    }

    /// Server assigns this attribute
    pub fn computed(ty: AttributeType) -> Self {
        Self::with_modifiers(ty, false, false, true)
    }

    /// Caller may set this attribute, otherwise the server assigns it
    pub fn optional_computed(ty: AttributeType) -> Self {
        Self::with_modifiers(ty, false, true, true)
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Computed and not settable by the caller
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional
    }

    fn check_modifiers(&self) -> std::result::Result<(), &'static str> {
        match (self.required, self.optional, self.computed) {
            (true, false, false) | (false, true, _) | (false, false, true) => {}
            (true, _, true) => return Err("required attribute cannot be computed"),
            (true, true, false) => return Err("attribute cannot be both required and optional"),
            (false, false, false) => {
                return Err("attribute must be required, optional or computed");
            }
        }
        if self.sensitive && !self.ty.is_primitive() {
            return Err("only primitive attributes can be sensitive");
        }
        Ok(())
    }
}

/// Ordered set of attribute declarations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    version: u64,
    description: Option<String>,
    attributes: Vec<(String, Attribute)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute; ordering is preserved
    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.push((name.to_string(), attribute));
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, attribute)| attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes
            .iter()
            .map(|(name, attribute)| (name.as_str(), attribute))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Validate the schema before registration
    pub fn validate(&self, type_name: &str) -> Result<()> {
        if self.attributes.is_empty() {
            return Err(invalid(type_name, &AttributePath::root(), "schema has no attributes"));
        }
        validate_attributes(type_name, self, &AttributePath::root())
    }
}

fn invalid(type_name: &str, path: &AttributePath, reason: &str) -> Error {
    Error::InvalidSchema {
        type_name: type_name.to_string(),
        path: path.clone(),
        reason: reason.to_string(),
    }
}

fn validate_attributes(type_name: &str, schema: &Schema, path: &AttributePath) -> Result<()> {
    let mut seen = HashSet::new();
    for (name, attribute) in schema.attributes() {
        let attr_path = path.child(name);
        if !IDENTIFIER.is_match(name) {
            return Err(invalid(type_name, &attr_path, "attribute name is not a valid identifier"));
        }
        if !seen.insert(name) {
            return Err(invalid(
                type_name,
                &attr_path,
                "attribute name collides with a sibling",
            ));
        }
        attribute
            .check_modifiers()
            .map_err(|reason| invalid(type_name, &attr_path, reason))?;
        validate_type(type_name, &attribute.ty, &attr_path)?;
    }
    Ok(())
}

fn validate_type(type_name: &str, ty: &AttributeType, path: &AttributePath) -> Result<()> {
    match ty {
        AttributeType::Primitive(_) => Ok(()),
        AttributeType::List(element) => validate_type(type_name, element, path),
        AttributeType::Object(schema) => {
            if schema.is_empty() {
                return Err(invalid(type_name, path, "nested object has no attributes"));
            }
            validate_attributes(type_name, schema, path)
        }
    }
}
