//! `hashicups refresh` - re-read managed orders and record drift

use anyhow::{Result, bail};
use declarative::{
    Address, AttributeChange, AutoConfirm, Document, ExecuteOptions, ExecuteSummary, Intent,
    ProgressCallback, diff,
};
use std::collections::HashMap;

use super::Session;
use crate::Context;
use crate::cli::TargetArgs;
use crate::ui::{self, BarProgress};

/// Outcome of a refresh: the summary plus what drifted, per address
pub struct Refreshed {
    pub summary: ExecuteSummary,
    pub drift: Vec<(Address, Vec<AttributeChange>)>,
}

pub fn run(ctx: &Context, args: TargetArgs) -> Result<()> {
    let mut session = Session::open(ctx, true)?;

    if !ctx.quiet {
        ui::header("HashiCups Refresh");
    }
    if session.state.resources.is_empty() {
        ui::info("No resources in state");
        return Ok(());
    }

    let mut progress = BarProgress::new(ctx.quiet);
    let refreshed = refresh(&mut session, args.target.as_deref(), &mut progress)?;
    session.save()?;

    for (address, changes) in &refreshed.drift {
        println!();
        ui::warn(&format!("{address} drifted from recorded state"));
        let schema = session.registry.resource_schema(&address.type_name).ok();
        for change in changes {
            println!("    {}", ui::format_change(schema, change));
        }
    }
    ui::summary(&refreshed.summary, false);

    if !refreshed.summary.is_success() {
        bail!("{} resource(s) failed to refresh", refreshed.summary.failed);
    }
    Ok(())
}

/// Refresh every instance in state and record what was read
pub fn refresh<P: ProgressCallback>(
    session: &mut Session,
    target: Option<&str>,
    progress: &mut P,
) -> Result<Refreshed> {
    let mut plan = session.state_plan(&Intent::Refresh, target)?;
    let before: HashMap<Address, Document> = plan
        .instances
        .iter()
        .filter_map(|p| Some((p.address.clone(), p.instance.document()?.clone())))
        .collect();

    let opts = ExecuteOptions {
        dry_run: false,
        jobs: session.config.jobs.unwrap_or(ExecuteOptions::default().jobs),
    };
    let summary = declarative::execute(&session.registry, &mut plan, &opts, progress, &mut AutoConfirm)?;

    let mut drift = Vec::new();
    for planned in &plan.instances {
        let (Some(old), Some(new)) = (before.get(&planned.address), planned.instance.document())
        else {
            continue;
        };
        let schema = session.registry.resource_schema(&planned.address.type_name)?;
        let changes: Vec<AttributeChange> = diff::compare(schema, old, new)
            .actionable()
            .cloned()
            .collect();
        if !changes.is_empty() {
            drift.push((planned.address.clone(), changes));
        }
    }

    session.record(plan)?;
    Ok(Refreshed { summary, drift })
}
