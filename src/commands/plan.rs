//! `hashicups plan` - preview what apply would change

use anyhow::{Result, bail};
use declarative::PlanReport;

use super::Session;
use crate::Context;
use crate::cli::TargetArgs;
use crate::manifest::Manifest;
use crate::ui;

pub fn run(ctx: &Context, args: TargetArgs) -> Result<()> {
    let session = Session::open(ctx, true)?;
    let manifest = Manifest::load(&ctx.manifest)?;

    if !ctx.quiet {
        ui::header("HashiCups Plan");
    }
    session.read_data_sources(&manifest, ctx.quiet)?;

    let report = preview(&session, &manifest, args.target.as_deref())?;
    ui::plan_report(&session.registry, &report);

    if report.has_failures() {
        bail!("Planning failed for {} resource(s)", report.failures.len());
    }
    Ok(())
}

/// Plan the manifest against recorded state without touching remote objects
pub fn preview(session: &Session, manifest: &Manifest, target: Option<&str>) -> Result<PlanReport> {
    let mut plan = session.converge_plan(manifest, target)?;
    Ok(declarative::preview(&session.registry, &mut plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{MANIFEST, manifest, session};
    use declarative::PreviewAction;
    use hashicups_client::MemoryBackend;
    use std::sync::Arc;

    #[test]
    fn test_fresh_manifest_creates_everything() {
        let api = Arc::new(MemoryBackend::new());
        let session = session(api.clone());

        let report = preview(&session, &manifest(MANIFEST), None).unwrap();
        assert_eq!(report.change_count(), 2);
        assert!(
            report
                .previews
                .iter()
                .all(|p| p.action == PreviewAction::Create)
        );
        assert_eq!(api.calls(), 0);
    }

    #[test]
    fn test_invalid_resource_is_a_failure() {
        let session = session(Arc::new(MemoryBackend::new()));
        let manifest = manifest(
            r#"
[[resource]]
type = "hashicups_order"
name = "empty"
"#,
        );

        let report = preview(&session, &manifest, None).unwrap();
        assert!(report.has_failures());
        assert!(!report.has_changes());
    }
}
