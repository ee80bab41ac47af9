//! `hashicups schema` - describe every registered type

use anyhow::Result;
use declarative::Registry;
use hashicups_client::MemoryBackend;
use std::sync::Arc;

use crate::Context;
use crate::provider;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    // Schemas do not depend on the backend, so no configuration is needed
    let registry = provider::registry(Arc::new(MemoryBackend::new()))?;

    if !ctx.quiet {
        ui::header("HashiCups Schema");
    }
    print(&registry);
    Ok(())
}

fn print(registry: &Registry) {
    ui::section("Resources");
    for (name, schema) in registry.resource_types() {
        ui::schema_tree(name, schema);
    }

    ui::section("Data sources");
    for (name, schema) in registry.data_source_types() {
        ui::schema_tree(name, schema);
    }
}
