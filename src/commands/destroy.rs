//! `hashicups destroy` - delete every managed order

use anyhow::{Result, bail};
use declarative::{
    AutoConfirm, ConfirmCallback, ExecuteOptions, ExecuteSummary, Intent, ProgressCallback,
};

use super::Session;
use crate::Context;
use crate::cli::DestroyArgs;
use crate::ui::{self, BarProgress, PromptConfirm};

pub fn run(ctx: &Context, args: DestroyArgs) -> Result<()> {
    let mut session = Session::open(ctx, true)?;

    if !ctx.quiet {
        ui::header("HashiCups Destroy");
    }
    if session.state.resources.is_empty() {
        ui::info("No resources in state");
        return Ok(());
    }

    let mut plan = session.state_plan(&Intent::Destroy, args.target.as_deref())?;
    let report = declarative::preview(&session.registry, &mut plan);
    ui::plan_report(&session.registry, &report);

    let mut progress = BarProgress::new(ctx.quiet);
    let summary = if args.yes {
        destroy(&mut session, args.target.as_deref(), &mut progress, &mut AutoConfirm)?
    } else {
        destroy(&mut session, args.target.as_deref(), &mut progress, &mut PromptConfirm)?
    };
    session.save()?;
    ui::summary(&summary, false);

    if !summary.is_success() {
        bail!("{} resource(s) failed to destroy", summary.failed);
    }
    Ok(())
}

/// Delete the remote object of every instance in state
///
/// Destroyed instances leave state; failed ones stay so a later run can retry.
pub fn destroy<P, C>(
    session: &mut Session,
    target: Option<&str>,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut plan = session.state_plan(&Intent::Destroy, target)?;
    let opts = ExecuteOptions {
        dry_run: false,
        jobs: session.config.jobs.unwrap_or(ExecuteOptions::default().jobs),
    };
    let summary = declarative::execute(&session.registry, &mut plan, &opts, progress, confirm)?;
    session.record(plan)?;
    Ok(summary)
}
