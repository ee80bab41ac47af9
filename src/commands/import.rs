//! `hashicups import` - adopt an existing order into state

use anyhow::{Context as _, Result, bail};
use declarative::{Address, Request, ResourceInstance};

use super::{Session, parse_address};
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let mut session = Session::open(ctx, true)?;
    let address = parse_address(address)?;

    import(&mut session, &address, id)?;
    session.save()?;

    if !ctx.quiet {
        ui::success(&format!("Imported {address}"));
        ui::kv("id", id);
        if let Some(record) = session.state.resources.get(&address.to_string()) {
            ui::kv("lifecycle", &record.lifecycle.to_string());
        }
        ui::dim("Add a matching [[resource]] block to the manifest to keep managing it");
    }
    Ok(())
}

/// Read remote object `id` and record it under `address`
pub fn import(session: &mut Session, address: &Address, id: &str) -> Result<()> {
    if session.state.contains(address) {
        bail!("{address} is already managed; destroy it or pick another name");
    }

    let mut instance = ResourceInstance::new();
    session
        .registry
        .dispatch(&address.type_name, Request::Import(id.to_string()), &mut instance)
        .with_context(|| format!("Failed to import {address}"))?;
    log::info!("Imported {address} from remote id {id}");

    session.state.record(&session.registry, address, &instance)
}
