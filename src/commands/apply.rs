//! `hashicups apply` - converge remote orders on the manifest

use anyhow::{Result, bail};
use declarative::{
    AutoConfirm, ConfirmCallback, ExecuteOptions, ExecuteSummary, ProgressCallback,
};

use super::Session;
use crate::Context;
use crate::cli::ApplyArgs;
use crate::manifest::Manifest;
use crate::ui::{self, BarProgress, PromptConfirm};

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let mut session = Session::open(ctx, true)?;
    let manifest = Manifest::load(&ctx.manifest)?;

    if !ctx.quiet {
        ui::header("HashiCups Apply");
    }
    session.read_data_sources(&manifest, ctx.quiet)?;

    let report = super::plan::preview(&session, &manifest, args.target.as_deref())?;
    ui::plan_report(&session.registry, &report);

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args
            .jobs
            .or(session.config.jobs)
            .unwrap_or(ExecuteOptions::default().jobs),
    };
    let mut progress = BarProgress::new(ctx.quiet);
    let summary = if args.yes {
        apply(&mut session, &manifest, args.target.as_deref(), &opts, &mut progress, &mut AutoConfirm)?
    } else {
        apply(&mut session, &manifest, args.target.as_deref(), &opts, &mut progress, &mut PromptConfirm)?
    };

    if !opts.dry_run {
        session.save()?;
    }
    ui::summary(&summary, opts.dry_run);

    if !summary.is_success() {
        bail!("{} resource(s) failed", summary.failed);
    }
    Ok(())
}

/// Plan, confirm and execute; state is updated in memory only
pub fn apply<P, C>(
    session: &mut Session,
    manifest: &Manifest,
    target: Option<&str>,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut plan = session.converge_plan(manifest, target)?;
    let summary = declarative::execute(&session.registry, &mut plan, opts, progress, confirm)?;
    if !opts.dry_run {
        session.record(plan)?;
    }
    Ok(summary)
}
