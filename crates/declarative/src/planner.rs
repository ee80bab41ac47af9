//! Execution planner - collects resource instances and what to do with them

use crate::document::Document;
use crate::error::{Error, Result};
use crate::lifecycle::ResourceInstance;
use std::fmt;

/// Address of a resource instance, e.g. `hashicups_order.edu`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub type_name: String,
    pub name: String,
}

impl Address {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Parse `type.name`
    pub fn parse(address: &str) -> Option<Self> {
        let (type_name, name) = address.split_once('.')?;
        if type_name.is_empty() || name.is_empty() || name.contains('.') {
            return None;
        }
        Some(Self::new(type_name, name))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

/// What the executor should do with an instance
#[derive(Debug, Clone)]
pub enum Intent {
    /// Plan against the desired document and apply
    Converge(Document),
    /// Re-read remote state and report drift
    Refresh,
    /// Delete the remote object
    Destroy,
}

/// One instance together with its intent
#[derive(Debug, Clone)]
pub struct PlannedInstance {
    pub address: Address,
    pub instance: ResourceInstance,
    pub intent: Intent,
}

/// Independent instances to run on the worker pool
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    pub instances: Vec<PlannedInstance>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance; a later entry for the same address replaces the earlier one
    pub fn add(&mut self, address: Address, instance: ResourceInstance, intent: Intent) {
        let planned = PlannedInstance {
            address,
            instance,
            intent,
        };
        match self
            .instances
            .iter_mut()
            .find(|p| p.address == planned.address)
        {
            Some(slot) => *slot = planned,
            None => self.instances.push(planned),
        }
    }

    /// Filter plan to only include instances matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&PlannedInstance) -> bool,
    {
        Self {
            instances: self.instances.into_iter().filter(|p| predicate(p)).collect(),
        }
    }

    /// Filter plan to only include instances matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Result<Self> {
        let Some(target) = target else {
            return Ok(self);
        };
        let (type_name, name) = parse_target(target)?;
        Ok(self.filter(|p| matches_filter(&p.address, type_name, name)))
    }

    pub fn get(&self, address: &Address) -> Option<&PlannedInstance> {
        self.instances.iter().find(|p| &p.address == address)
    }

    /// Total number of instances in the plan
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Hand the instances back, e.g. to persist their state
    pub fn into_instances(self) -> Vec<PlannedInstance> {
        self.instances
    }
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> Result<(&str, Option<&str>)> {
    let mut parts = target.split('.');
    let parsed = match (parts.next(), parts.next(), parts.next()) {
        (Some(type_name), None, None) => (type_name, None),
        (Some(type_name), Some(name), None) if !name.is_empty() => (type_name, Some(name)),
        _ => return Err(Error::InvalidTarget(target.to_string())),
    };
    if parsed.0.is_empty() {
        return Err(Error::InvalidTarget(target.to_string()));
    }
    Ok(parsed)
}

/// Check if an address matches the filter criteria
fn matches_filter(address: &Address, type_name: &str, name: Option<&str>) -> bool {
    // Provider prefix is optional: "order" matches "hashicups_order"
    if address.type_name != type_name
        && address.type_name.split_once('_').map(|(_, rest)| rest) != Some(type_name)
    {
        return false;
    }

    if let Some(n) = name
        && address.name != n
    {
        return false;
    }

    true
}
