//! Persisted resource state (`state.json`)
//!
//! Each managed address maps to its type, lifecycle state and attributes.
//! Attributes are written with the document codec so Unknown and Null
//! survive a round trip.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use declarative::{Address, LifecycleState, Registry, ResourceInstance, codec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Current state file format
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub version: u32,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    /// Keyed by `type.name`
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    #[serde(rename = "type")]
    pub type_name: String,
    pub lifecycle: LifecycleState,
    pub attributes: serde_json::Value,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl State {
    pub fn state_file() -> Result<PathBuf> {
        paths::state_file()
    }

    /// Load state from the state directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::state_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "State file {} has version {}, this build supports up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to the state directory
    pub fn save(&mut self) -> Result<()> {
        self.save_to(&Self::state_file()?)
    }

    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.version = STATE_VERSION;
        self.last_updated = Utc::now();
        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Addresses with recorded state, in key order
    pub fn addresses(&self) -> Vec<Address> {
        self.resources
            .keys()
            .filter_map(|key| {
                let address = Address::parse(key);
                if address.is_none() {
                    log::warn!("Ignoring malformed state entry '{key}'");
                }
                address
            })
            .collect()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.resources.contains_key(&address.to_string())
    }

    /// Rebuild the instance for `address`; unrecorded addresses are Absent
    pub fn instance(&self, registry: &Registry, address: &Address) -> Result<ResourceInstance> {
        let Some(record) = self.resources.get(&address.to_string()) else {
            return Ok(ResourceInstance::new());
        };
        if record.type_name != address.type_name {
            bail!(
                "State entry {address} records type {}, expected {}",
                record.type_name,
                address.type_name
            );
        }

        let schema = registry.resource_schema(&record.type_name)?;
        let document = codec::decode(&record.attributes, schema)
            .with_context(|| format!("Corrupt state for {address}"))?;
        Ok(ResourceInstance::restore(record.lifecycle, Some(document)))
    }

    /// Record an instance; instances without a document are dropped
    pub fn record(
        &mut self,
        registry: &Registry,
        address: &Address,
        instance: &ResourceInstance,
    ) -> Result<()> {
        let key = address.to_string();
        let Some(document) = instance.document() else {
            if self.resources.remove(&key).is_some() {
                log::debug!("Removed {key} from state");
            }
            return Ok(());
        };

        let schema = registry.resource_schema(&address.type_name)?;
        let attributes = codec::encode(document, schema)
            .with_context(|| format!("Failed to encode state for {address}"))?;
        self.resources.insert(
            key,
            ResourceRecord {
                type_name: address.type_name.clone(),
                lifecycle: instance.state(),
                attributes,
            },
        );
        Ok(())
    }
}
