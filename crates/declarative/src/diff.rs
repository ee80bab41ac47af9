//! Diff computation between prior state and a desired plan
//!
//! [`plan`] merges the caller's desired document with prior state (carrying
//! forward computed values, marking the rest Unknown) and reports one
//! [`AttributeChange`] per compared attribute.
//!
//! Lists are compared index by index only when both sides have the same
//! length. Any other list change replaces the whole list attribute.

use crate::document::{AttributePath, Document, Validation};
use crate::error::{Error, Result};
use crate::schema::{Attribute, AttributeType, Schema};
use crate::value::{Known, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens to a single attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    NoOp,
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    /// Symbol used when rendering plans
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoOp => " ",
            Self::Create => "+",
            Self::Update => "~",
            Self::Delete => "-",
        }
    }
}

/// Change to one attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub path: AttributePath,
    pub old: Value,
    pub new: Value,
    pub action: ChangeAction,
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            ChangeAction::Create => write!(f, "+ {} = {}", self.path, self.new),
            ChangeAction::Delete => write!(f, "- {} = {}", self.path, self.old),
            ChangeAction::Update | ChangeAction::NoOp => {
                write!(
                    f,
                    "{} {}: {} -> {}",
                    self.action.symbol(),
                    self.path,
                    self.old,
                    self.new
                )
            }
        }
    }
}

/// Ordered attribute changes for one reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<AttributeChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, path: AttributePath, old: Value, new: Value, action: ChangeAction) {
        self.changes.push(AttributeChange {
            path,
            old,
            new,
            action,
        });
    }

    /// All changes, NoOp entries included
    pub fn iter(&self) -> impl Iterator<Item = &AttributeChange> {
        self.changes.iter()
    }

    /// Changes that require a remote operation
    pub fn actionable(&self) -> impl Iterator<Item = &AttributeChange> {
        self.changes
            .iter()
            .filter(|change| change.action != ChangeAction::NoOp)
    }

    /// Whether nothing needs to change (every entry is NoOp)
    pub fn is_empty(&self) -> bool {
        self.actionable().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Look up the change recorded for `path`
    pub fn get(&self, path: &AttributePath) -> Option<&AttributeChange> {
        self.changes.iter().find(|change| &change.path == path)
    }

    /// Number of changes with the given action
    pub fn count(&self, action: ChangeAction) -> usize {
        self.changes
            .iter()
            .filter(|change| change.action == action)
            .count()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a AttributeChange;
    type IntoIter = std::slice::Iter<'a, AttributeChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Merge `desired` with `prior` under `schema` and compute the change set
///
/// With no prior state every known attribute is a `Create`. Otherwise each
/// attribute is `Update` or `NoOp`; attributes still Unknown after the merge
/// are pending and produce no entry.
pub fn plan(
    schema: &Schema,
    prior: Option<&Document>,
    desired: &Document,
) -> Result<(Document, ChangeSet)> {
    desired.validate(schema, Validation::Desired)?;

    let merged = merge_object(schema, prior, desired, &AttributePath::root())?;

    let mut changes = ChangeSet::new();
    match prior {
        None => create_changes(schema, &merged, &mut changes),
        Some(prior) => diff_object(schema, prior, &merged, &AttributePath::root(), &mut changes),
    }
    Ok((merged, changes))
}

/// Change set for tearing down a whole document
pub fn teardown(schema: &Schema, prior: &Document) -> ChangeSet {
    let mut changes = ChangeSet::new();
    for (name, _) in schema.attributes() {
        if let Some(value @ Value::Known(_)) = prior.get(name) {
            changes.push(
                AttributePath::attribute(name),
                value.clone(),
                Value::Null,
                ChangeAction::Delete,
            );
        }
    }
    changes
}

/// Compare two complete documents, e.g. stored state and freshly read state
pub fn compare(schema: &Schema, old: &Document, new: &Document) -> ChangeSet {
    let mut changes = ChangeSet::new();
    diff_object(schema, old, new, &AttributePath::root(), &mut changes);
    changes
}

fn merge_object(
    schema: &Schema,
    prior: Option<&Document>,
    desired: &Document,
    path: &AttributePath,
) -> Result<Document> {
    let mut merged = Document::new();
    for (name, attribute) in schema.attributes() {
        let attr_path = path.child(name);
        let prior_value = prior.and_then(|doc| doc.get(name));

        let value = match desired.get(name) {
            Some(value) => {
                check_immutable(attribute, prior_value, value, &attr_path)?;
                merge_value(&attribute.ty, prior_value, value, &attr_path)?
            }
            None if attribute.computed => prior_value.cloned().unwrap_or(Value::Unknown),
            None => Value::Null,
        };
        merged.set(name, value);
    }
    Ok(merged)
}

fn merge_value(
    ty: &AttributeType,
    prior: Option<&Value>,
    desired: &Value,
    path: &AttributePath,
) -> Result<Value> {
    match (ty, desired) {
        (AttributeType::Object(schema), Value::Known(Known::Object(doc))) => {
            let prior_doc = match prior {
                Some(Value::Known(Known::Object(prior_doc))) => Some(prior_doc),
                _ => None,
            };
            merge_object(schema, prior_doc, doc, path).map(Value::object)
        }
        (AttributeType::List(element), Value::Known(Known::List(items))) => {
            let prior_items = match prior {
                Some(Value::Known(Known::List(prior_items)))
                    if prior_items.len() == items.len() =>
                {
                    Some(prior_items)
                }
                _ => None,
            };
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let prior_item = prior_items.map(|prior_items| &prior_items[index]);
                    merge_value(element, prior_item, item, &path.index(index))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::list)
        }
        _ => Ok(desired.clone()),
    }
}

fn check_immutable(
    attribute: &Attribute,
    prior: Option<&Value>,
    desired: &Value,
    path: &AttributePath,
) -> Result<()> {
    if desired.is_unknown() {
        return Ok(());
    }

    if attribute.is_computed_only() {
        let unchanged = match prior {
            Some(prior) => prior == desired,
            None => desired.is_null(),
        };
        if !unchanged {
            return Err(Error::ImmutableAttribute { path: path.clone() });
        }
    }

    if attribute.immutable
        && let Some(prior @ Value::Known(_)) = prior
        && desired.is_known()
        && prior != desired
    {
        return Err(Error::ImmutableAttribute { path: path.clone() });
    }

    Ok(())
}

fn create_changes(schema: &Schema, merged: &Document, changes: &mut ChangeSet) {
    for (name, _) in schema.attributes() {
        if let Some(value @ Value::Known(_)) = merged.get(name) {
            changes.push(
                AttributePath::attribute(name),
                Value::Null,
                value.clone(),
                ChangeAction::Create,
            );
        }
    }
}

fn diff_object(
    schema: &Schema,
    old: &Document,
    new: &Document,
    path: &AttributePath,
    changes: &mut ChangeSet,
) {
    for (name, attribute) in schema.attributes() {
        let old_value = old.value_or_null(name);
        let new_value = new.value_or_null(name);
        diff_value(&attribute.ty, &old_value, &new_value, &path.child(name), changes);
    }
}

fn diff_value(
    ty: &AttributeType,
    old: &Value,
    new: &Value,
    path: &AttributePath,
    changes: &mut ChangeSet,
) {
    match (ty, old, new) {
        (_, _, Value::Unknown) => {}
        (
            AttributeType::Object(schema),
            Value::Known(Known::Object(old_doc)),
            Value::Known(Known::Object(new_doc)),
        ) => diff_object(schema, old_doc, new_doc, path, changes),
        (
            AttributeType::List(element),
            Value::Known(Known::List(old_items)),
            Value::Known(Known::List(new_items)),
        ) if old_items.len() == new_items.len() => {
            for (index, (old_item, new_item)) in old_items.iter().zip(new_items).enumerate() {
                diff_value(element, old_item, new_item, &path.index(index), changes);
            }
        }
        _ if old == new => changes.push(path.clone(), old.clone(), new.clone(), ChangeAction::NoOp),
        _ => changes.push(path.clone(), old.clone(), new.clone(), ChangeAction::Update),
    }
}
