//! Command implementations
//!
//! Each command opens a [`Session`], does its work against the registry
//! and in-memory state, then saves state. The work itself lives in
//! functions taking the session so it can be exercised without a terminal
//! or a network.

pub mod apply;
pub mod coffees;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod schema;

use anyhow::{Context as _, Result, bail};
use declarative::{Address, ExecutionPlan, Intent, Registry};
use std::collections::HashSet;
use std::sync::Arc;

use crate::Context;
use crate::config::Config;
use crate::manifest::Manifest;
use crate::provider;
use crate::state::State;
use crate::ui;

/// Config, registry and state shared by the commands
pub struct Session {
    pub config: Config,
    pub registry: Registry,
    pub state: State,
    /// Offline sessions never read or write the state file
    pub offline: bool,
}

impl Session {
    pub fn open(ctx: &Context, needs_credentials: bool) -> Result<Self> {
        let config = Config::load()?.with_overrides(ctx.overrides.clone());
        let api = config.backend(ctx.offline, needs_credentials)?;
        let registry = provider::registry(api)?;
        let state = if ctx.offline {
            State::default()
        } else {
            State::load()?
        };

        Ok(Self {
            config,
            registry,
            state,
            offline: ctx.offline,
        })
    }

    /// Write every instance of an executed plan back into state
    pub fn record(&mut self, plan: ExecutionPlan) -> Result<()> {
        for planned in plan.into_instances() {
            self.state
                .record(&self.registry, &planned.address, &planned.instance)?;
        }
        Ok(())
    }

    pub fn save(&mut self) -> Result<()> {
        if self.offline {
            log::info!("Offline run, state file left untouched");
            return Ok(());
        }
        self.state.save()
    }

    /// Plan converging every manifest resource; resources only in state are destroyed
    pub fn converge_plan(&self, manifest: &Manifest, target: Option<&str>) -> Result<ExecutionPlan> {
        let mut plan = ExecutionPlan::new();
        let mut declared = HashSet::new();

        for (address, desired) in manifest.desired(&self.registry)? {
            let instance = self.state.instance(&self.registry, &address)?;
            declared.insert(address.clone());
            plan.add(address, instance, Intent::Converge(desired));
        }

        for address in self.state.addresses() {
            if declared.contains(&address) {
                continue;
            }
            log::debug!("{address} is no longer in the manifest");
            let instance = self.state.instance(&self.registry, &address)?;
            plan.add(address, instance, Intent::Destroy);
        }

        Ok(plan.filter_by_target(target)?)
    }

    /// Plan applying `intent` to every address in state
    pub fn state_plan(&self, intent: &Intent, target: Option<&str>) -> Result<ExecutionPlan> {
        let mut plan = ExecutionPlan::new();
        for address in self.state.addresses() {
            let instance = self.state.instance(&self.registry, &address)?;
            plan.add(address, instance, intent.clone());
        }
        Ok(plan.filter_by_target(target)?)
    }

    /// Read every `[[data]]` block of the manifest
    pub fn read_data_sources(&self, manifest: &Manifest, quiet: bool) -> Result<usize> {
        let sources = manifest.data_sources(&self.registry)?;
        for (address, config) in &sources {
            let document = self
                .registry
                .read_data_source(&address.type_name, config)
                .with_context(|| format!("Failed to read {address}"))?;
            if !quiet {
                ui::dim(&format!("<= {address} read ({} attributes)", document.len()));
            }
        }
        Ok(sources.len())
    }
}

/// Parse a `type.name` address given on the command line
pub fn parse_address(address: &str) -> Result<Address> {
    match Address::parse(address) {
        Some(address) => Ok(address),
        None => bail!("Invalid address '{address}', expected type.name (e.g., hashicups_order.edu)"),
    }
}
