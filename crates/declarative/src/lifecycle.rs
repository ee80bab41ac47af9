//! Lifecycle controller
//!
//! Drives one resource instance through
//! `Absent → Planned → Created → Synced → Updated → Deleted`, calling the
//! type's [`ResourceController`] for the remote side. A failed remote call
//! never advances the state machine: the instance keeps its last good
//! document and pending plan so the operation can be retried.

use crate::diff::{self, ChangeSet};
use crate::document::{AttributePath, Document, Validation};
use crate::error::{Error, Operation, Result};
use crate::schema::{AttributeType, PrimitiveKind, Schema};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote side of a managed resource type
///
/// Implementations translate documents to API requests and API responses
/// back to documents. Response documents only need the attributes the API
/// knows about; anything missing is taken from the planned document.
pub trait ResourceController: Send + Sync {
    /// Attribute holding the remote id
    fn id_attribute(&self) -> &str {
        "id"
    }

    /// Create the remote object described by `planned`
    fn create(&self, planned: &Document) -> anyhow::Result<Document>;

    /// Read the remote object, `Ok(None)` if it no longer exists
    fn read(&self, id: &str, current: &Document) -> anyhow::Result<Option<Document>>;

    /// Apply `changes` to the remote object
    fn update(&self, id: &str, planned: &Document, changes: &ChangeSet)
    -> anyhow::Result<Document>;

    /// Delete the remote object
    fn delete(&self, id: &str) -> anyhow::Result<()>;
}

/// Remote side of a read-only data source type
pub trait DataSourceController: Send + Sync {
    fn read(&self, config: &Document) -> anyhow::Result<Document>;
}

/// Lifecycle state of a resource instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    #[default]
    Absent,
    Planned,
    Created,
    Synced,
    Updated,
    Deleted,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "Absent",
            Self::Planned => "Planned",
            Self::Created => "Created",
            Self::Synced => "Synced",
            Self::Updated => "Updated",
            Self::Deleted => "Deleted",
        };
        f.write_str(name)
    }
}

/// What an apply will do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanAction {
    Create,
    Update,
    NoOp,
}

/// A computed plan waiting to be applied
#[derive(Debug, Clone)]
pub struct PendingChange {
    pub action: PlanAction,
    /// Merged document, Unknown where the remote will decide
    pub planned: Document,
    pub changes: ChangeSet,
}

/// Result of applying a pending change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    NoChange,
}

/// Result of a drift check
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Remote matches stored state
    InSync,
    /// Remote differs; stored state now mirrors remote truth
    Drifted(ChangeSet),
    /// Remote object is gone; instance is Absent again
    Gone,
}

/// One managed resource instance: its state, last good document and pending plan
#[derive(Debug, Clone, Default)]
pub struct ResourceInstance {
    state: LifecycleState,
    document: Option<Document>,
    pending: Option<PendingChange>,
    history: Vec<LifecycleState>,
}

impl ResourceInstance {
    /// A resource that does not exist yet
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource restored from persisted state
    pub fn from_state(document: Document) -> Self {
        Self::restore(LifecycleState::Synced, Some(document))
    }

    /// Restore an instance with an explicit lifecycle state
    pub fn restore(state: LifecycleState, document: Option<Document>) -> Self {
        Self {
            state,
            document,
            pending: None,
            history: vec![state],
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Last good document, `None` while Absent or after deletion
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingChange> {
        self.pending.as_ref()
    }

    /// States this instance has passed through, oldest first
    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    fn transition(&mut self, next: LifecycleState) {
        log::debug!("lifecycle {} -> {}", self.state, next);
        if self.history.is_empty() {
            self.history.push(self.state);
        }
        self.history.push(next);
        self.state = next;
    }

    fn ensure_alive(&self, operation: &'static str) -> Result<()> {
        if self.state == LifecycleState::Deleted {
            return Err(Error::InvalidTransition {
                state: self.state,
                operation,
            });
        }
        Ok(())
    }
}

/// Schema and controller of one resource type, bound together for dispatch
#[derive(Clone, Copy)]
pub struct Lifecycle<'a> {
    pub type_name: &'a str,
    pub schema: &'a Schema,
    pub controller: &'a dyn ResourceController,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        type_name: &'a str,
        schema: &'a Schema,
        controller: &'a dyn ResourceController,
    ) -> Self {
        Self {
            type_name,
            schema,
            controller,
        }
    }

    /// Diff `desired` against the instance's state and record the pending change
    pub fn plan<'i>(
        &self,
        instance: &'i mut ResourceInstance,
        desired: &Document,
    ) -> Result<&'i PendingChange> {
        instance.ensure_alive("plan")?;

        let prior = instance.document.as_ref();
        let (planned, changes) = diff::plan(self.schema, prior, desired)?;
        let action = match prior {
            None => PlanAction::Create,
            Some(_) if changes.is_empty() => PlanAction::NoOp,
            Some(_) => PlanAction::Update,
        };

        log::debug!(
            "{}: planned {:?} with {} change(s)",
            self.type_name,
            action,
            changes.actionable().count()
        );

        if instance.state == LifecycleState::Absent {
            instance.transition(LifecycleState::Planned);
        }
        Ok(instance.pending.insert(PendingChange {
            action,
            planned,
            changes,
        }))
    }

    /// Execute the pending change against the remote API
    pub fn apply(&self, instance: &mut ResourceInstance) -> Result<ApplyOutcome> {
        instance.ensure_alive("apply")?;
        let Some(pending) = instance.pending.as_ref() else {
            return Err(Error::InvalidTransition {
                state: instance.state,
                operation: "apply",
            });
        };

        match pending.action {
            PlanAction::NoOp => {
                instance.pending = None;
                if instance.state == LifecycleState::Planned {
                    instance.transition(LifecycleState::Synced);
                }
                Ok(ApplyOutcome::NoChange)
            }
            PlanAction::Create => {
                let response = self
                    .controller
                    .create(&pending.planned)
                    .map_err(|cause| Error::remote(Operation::Create, None, cause))?;
                let document = resolve_response(self.schema, &pending.planned, response)?;
                if self.id_of(&document).is_none() {
                    return Err(Error::violation(
                        &AttributePath::attribute(self.controller.id_attribute()),
                        "create response did not assign an id",
                    ));
                }

                instance.transition(LifecycleState::Created);
                instance.document = Some(document);
                instance.pending = None;
                instance.transition(LifecycleState::Synced);
                Ok(ApplyOutcome::Created)
            }
            PlanAction::Update => {
                let id = self.require_id(instance.document.as_ref(), "apply")?;
                let response = self
                    .controller
                    .update(&id, &pending.planned, &pending.changes)
                    .map_err(|cause| Error::remote(Operation::Update, Some(&id), cause))?;
                let document = resolve_response(self.schema, &pending.planned, response)?;

                instance.transition(LifecycleState::Updated);
                instance.document = Some(document);
                instance.pending = None;
                instance.transition(LifecycleState::Synced);
                Ok(ApplyOutcome::Updated)
            }
        }
    }

    /// Re-read the remote object and reconcile stored state with remote truth
    pub fn refresh(&self, instance: &mut ResourceInstance) -> Result<RefreshOutcome> {
        instance.ensure_alive("refresh")?;
        let id = self.require_id(instance.document.as_ref(), "refresh")?;
        let Some(current) = instance.document.as_ref() else {
            return Err(Error::InvalidTransition {
                state: instance.state,
                operation: "refresh",
            });
        };

        let response = self
            .controller
            .read(&id, current)
            .map_err(|cause| Error::remote(Operation::Read, Some(&id), cause))?;

        let Some(response) = response else {
            log::warn!("{}: remote object {} no longer exists", self.type_name, id);
            instance.document = None;
            instance.pending = None;
            instance.transition(LifecycleState::Absent);
            return Ok(RefreshOutcome::Gone);
        };

        let fresh = resolve_response(self.schema, current, response)?;
        let drift = diff::compare(self.schema, current, &fresh);
        if drift.is_empty() {
            return Ok(RefreshOutcome::InSync);
        }

        log::warn!(
            "{}: remote object {} drifted ({} change(s))",
            self.type_name,
            id,
            drift.actionable().count()
        );
        instance.document = Some(fresh);
        instance.pending = None;
        instance.transition(LifecycleState::Planned);
        Ok(RefreshOutcome::Drifted(drift))
    }

    /// Delete the remote object; the document is discarded on success
    pub fn destroy(&self, instance: &mut ResourceInstance) -> Result<ChangeSet> {
        instance.ensure_alive("destroy")?;
        let id = self.require_id(instance.document.as_ref(), "destroy")?;

        self.controller
            .delete(&id)
            .map_err(|cause| Error::remote(Operation::Delete, Some(&id), cause))?;

        let changes = instance
            .document
            .take()
            .map(|doc| diff::teardown(self.schema, &doc))
            .unwrap_or_default();
        instance.pending = None;
        instance.transition(LifecycleState::Deleted);
        Ok(changes)
    }

    /// Adopt an existing remote object into an Absent instance
    pub fn import(&self, instance: &mut ResourceInstance, id: &str) -> Result<()> {
        if instance.document.is_some() || instance.state == LifecycleState::Deleted {
            return Err(Error::InvalidTransition {
                state: instance.state,
                operation: "import",
            });
        }

        let id_attribute = self.controller.id_attribute();
        let seed = Document::new().with(id_attribute, self.typed_id(id)?);
        let response = self
            .controller
            .read(id, &seed)
            .map_err(|cause| Error::remote(Operation::Read, Some(id), cause))?
            .ok_or_else(|| {
                Error::remote(
                    Operation::Read,
                    Some(id),
                    anyhow::anyhow!("remote object does not exist"),
                )
            })?;
        let document = resolve_response(self.schema, &seed, response)?;

        instance.document = Some(document);
        instance.pending = None;
        instance.transition(LifecycleState::Synced);
        Ok(())
    }

    /// Remote id recorded in `document`
    pub fn id_of(&self, document: &Document) -> Option<String> {
        document
            .get(self.controller.id_attribute())
            .and_then(Value::id_string)
    }

    fn require_id(&self, document: Option<&Document>, operation: &'static str) -> Result<String> {
        let Some(document) = document else {
            return Err(Error::InvalidTransition {
                state: LifecycleState::Absent,
                operation,
            });
        };
        self.id_of(document).ok_or_else(|| {
            Error::violation(
                &AttributePath::attribute(self.controller.id_attribute()),
                "state has no remote id",
            )
        })
    }

    fn typed_id(&self, id: &str) -> Result<Value> {
        let id_attribute = self.controller.id_attribute();
        let path = AttributePath::attribute(id_attribute);
        match self.schema.attribute(id_attribute).map(|a| &a.ty) {
            Some(AttributeType::Primitive(PrimitiveKind::Int64)) => id
                .parse::<i64>()
                .map(Value::int64)
                .map_err(|_| Error::violation(&path, format!("'{id}' is not a numeric id"))),
            Some(AttributeType::Primitive(PrimitiveKind::String)) => Ok(Value::string(id)),
            _ => Err(Error::violation(&path, "id attribute must be a string or int64")),
        }
    }
}

/// Merge a remote response over `base`, resolving leftover Unknowns to Null
///
/// The result must be valid state for `schema`; otherwise nothing is
/// committed and the whole operation fails.
pub(crate) fn resolve_response(
    schema: &Schema,
    base: &Document,
    response: Document,
) -> Result<Document> {
    if let Some((name, _)) = response.iter().find(|(name, _)| schema.attribute(name).is_none()) {
        return Err(Error::violation(
            &AttributePath::attribute(name),
            "remote response contains an attribute not in the schema",
        ));
    }

    let mut resolved = Document::new();
    for (name, _) in schema.attributes() {
        let value = response
            .get(name)
            .or_else(|| base.get(name))
            .cloned()
            .unwrap_or(Value::Null);
        resolved.set(name, value);
    }

    let resolved = resolved.resolve_unknowns();
    resolved.validate(schema, Validation::State)?;
    Ok(resolved)
}
