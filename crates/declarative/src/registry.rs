//! Resource and data source registry
//!
//! Types are registered on a [`RegistryBuilder`] at start-up. [`finalize`]
//! consumes the builder and hands back the read-only [`Registry`], which is
//! the only thing that can dispatch operations. Schemas are never handed out
//! mutably after that point.
//!
//! [`finalize`]: RegistryBuilder::finalize

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::diff::ChangeSet;
use crate::document::{Document, Validation};
use crate::error::{Error, Operation, Result};
use crate::lifecycle::{
    self, ApplyOutcome, DataSourceController, Lifecycle, PlanAction, RefreshOutcome,
    ResourceController, ResourceInstance,
};
use crate::schema::Schema;
use std::collections::BTreeMap;

struct ResourceEntry {
    schema: Schema,
    controller: Box<dyn ResourceController>,
}

struct DataSourceEntry {
    schema: Schema,
    controller: Box<dyn DataSourceController>,
}

/// Collects type registrations before the registry is sealed
#[derive(Default)]
pub struct RegistryBuilder {
    resources: BTreeMap<String, ResourceEntry>,
    data_sources: BTreeMap<String, DataSourceEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a managed resource type
    ///
    /// Fails with [`Error::DuplicateType`] if the name is taken (the first
    /// registration stays active) and with [`Error::InvalidSchema`] if the
    /// schema does not validate.
    pub fn register_resource_type(
        &mut self,
        name: &str,
        schema: Schema,
        controller: impl ResourceController + 'static,
    ) -> Result<&mut Self> {
        if self.resources.contains_key(name) {
            return Err(Error::DuplicateType(name.to_string()));
        }
        schema.validate(name)?;

        log::debug!("registered resource type {name} (schema v{})", schema.version());
        self.resources.insert(
            name.to_string(),
            ResourceEntry {
                schema,
                controller: Box::new(controller),
            },
        );
        Ok(self)
    }

    /// Register a read-only data source type
    pub fn register_data_source_type(
        &mut self,
        name: &str,
        schema: Schema,
        controller: impl DataSourceController + 'static,
    ) -> Result<&mut Self> {
        if self.data_sources.contains_key(name) {
            return Err(Error::DuplicateType(name.to_string()));
        }
        schema.validate(name)?;

        log::debug!("registered data source type {name} (schema v{})", schema.version());
        self.data_sources.insert(
            name.to_string(),
            DataSourceEntry {
                schema,
                controller: Box::new(controller),
            },
        );
        Ok(self)
    }

    /// Seal the registry
    pub fn finalize(self) -> Registry {
        log::debug!(
            "registry finalized with {} resource type(s) and {} data source type(s)",
            self.resources.len(),
            self.data_sources.len()
        );
        Registry {
            resources: self.resources,
            data_sources: self.data_sources,
        }
    }
}

/// A lifecycle request routed through [`Registry::dispatch`]
#[derive(Debug, Clone)]
pub enum Request {
    Plan(Document),
    Apply,
    Refresh,
    Destroy,
    Import(String),
}

/// Result of a dispatched request
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Planned {
        action: PlanAction,
        changes: ChangeSet,
    },
    Applied(ApplyOutcome),
    Refreshed(RefreshOutcome),
    Destroyed(ChangeSet),
    Imported,
}

/// What a full plan-and-apply reconciliation produced
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub changes: ChangeSet,
    pub outcome: Option<ApplyOutcome>,
    pub diagnostics: Diagnostics,
}

/// Read-only registry of resource and data source types
pub struct Registry {
    resources: BTreeMap<String, ResourceEntry>,
    data_sources: BTreeMap<String, DataSourceEntry>,
}

impl Registry {
    /// Schema and controller for a resource type
    pub fn resolve(&self, name: &str) -> Result<Lifecycle<'_>> {
        let (name, entry) = self
            .resources
            .get_key_value(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))?;
        Ok(Lifecycle::new(name, &entry.schema, entry.controller.as_ref()))
    }

    pub fn resource_schema(&self, name: &str) -> Result<&Schema> {
        self.resources
            .get(name)
            .map(|entry| &entry.schema)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    pub fn data_source_schema(&self, name: &str) -> Result<&Schema> {
        self.data_sources
            .get(name)
            .map(|entry| &entry.schema)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    /// Registered resource types in name order
    pub fn resource_types(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.resources
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.schema))
    }

    /// Registered data source types in name order
    pub fn data_source_types(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.data_sources
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.schema))
    }

    /// Route a lifecycle request to the type's controller
    pub fn dispatch(
        &self,
        name: &str,
        request: Request,
        instance: &mut ResourceInstance,
    ) -> Result<Response> {
        let lifecycle = self.resolve(name)?;
        log::debug!("dispatching {request:?} to {name}");

        match request {
            Request::Plan(desired) => {
                let pending = lifecycle.plan(instance, &desired)?;
                Ok(Response::Planned {
                    action: pending.action,
                    changes: pending.changes.clone(),
                })
            }
            Request::Apply => lifecycle.apply(instance).map(Response::Applied),
            Request::Refresh => lifecycle.refresh(instance).map(Response::Refreshed),
            Request::Destroy => lifecycle.destroy(instance).map(Response::Destroyed),
            Request::Import(id) => lifecycle
                .import(instance, &id)
                .map(|()| Response::Imported),
        }
    }

    /// Read a data source; the result never contains Unknown values
    pub fn read_data_source(&self, name: &str, config: &Document) -> Result<Document> {
        let entry = self
            .data_sources
            .get(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))?;
        config.validate(&entry.schema, Validation::Config)?;

        let response = entry
            .controller
            .read(config)
            .map_err(|cause| Error::remote(Operation::Read, None, cause))?;
        lifecycle::resolve_response(&entry.schema, config, response)
    }

    /// Plan and apply `desired` in one step
    ///
    /// Errors never escape: they are reported as diagnostics and the
    /// instance keeps its last good state.
    pub fn reconcile(
        &self,
        name: &str,
        instance: &mut ResourceInstance,
        desired: &Document,
    ) -> Reconciliation {
        let mut reconciliation = Reconciliation::default();

        let lifecycle = match self.resolve(name) {
            Ok(lifecycle) => lifecycle,
            Err(err) => {
                reconciliation.diagnostics.push(err);
                return reconciliation;
            }
        };

        match lifecycle.plan(instance, desired) {
            Ok(pending) => reconciliation.changes = pending.changes.clone(),
            Err(err) => {
                reconciliation.diagnostics.push(err);
                return reconciliation;
            }
        }

        match lifecycle.apply(instance) {
            Ok(outcome) => reconciliation.outcome = Some(outcome),
            Err(err) => {
                log::warn!("{name}: {err}");
                reconciliation.diagnostics.push(Diagnostic::from(&err));
            }
        }
        reconciliation
    }
}
