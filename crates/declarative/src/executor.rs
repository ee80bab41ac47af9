//! Execution engine - runs planned instances on a bounded worker pool
//!
//! Each instance is reconciled independently. Instances are borrowed
//! exclusively by the worker that runs them, so operations on a single
//! instance never overlap.

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::diagnostics::Diagnostics;
use crate::diff::{self, ChangeSet};
use crate::lifecycle::{ApplyOutcome, PlanAction, RefreshOutcome};
use crate::planner::{Address, ExecutionPlan, Intent, PlannedInstance};
use crate::registry::Registry;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;
use rayon::prelude::*;
use std::collections::HashSet;

/// What running an instance will do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAction {
    Create,
    Update,
    Delete,
    Refresh,
    NoOp,
}

/// Planned change for one instance
#[derive(Debug, Clone)]
pub struct Preview {
    pub address: Address,
    pub action: PreviewAction,
    pub changes: ChangeSet,
}

/// Result of planning every instance in an [`ExecutionPlan`]
#[derive(Debug, Default)]
pub struct PlanReport {
    pub previews: Vec<Preview>,
    pub failures: Vec<(Address, Diagnostics)>,
}

impl PlanReport {
    /// Number of instances that would change remote state
    pub fn change_count(&self) -> usize {
        self.previews
            .iter()
            .filter(|p| {
                matches!(
                    p.action,
                    PreviewAction::Create | PreviewAction::Update | PreviewAction::Delete
                )
            })
            .count()
    }

    pub fn has_changes(&self) -> bool {
        self.change_count() > 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Plan every instance without touching the remote API
///
/// Converge intents record their pending change on the instance, so a
/// later [`execute`] applies exactly what was previewed.
pub fn preview(registry: &Registry, plan: &mut ExecutionPlan) -> PlanReport {
    let mut report = PlanReport::default();

    for planned in &mut plan.instances {
        match preview_instance(registry, planned) {
            Ok(preview) => report.previews.push(preview),
            Err(diagnostics) => report.failures.push((planned.address.clone(), diagnostics)),
        }
    }

    report
}

fn preview_instance(
    registry: &Registry,
    planned: &mut PlannedInstance,
) -> std::result::Result<Preview, Diagnostics> {
    let lifecycle = registry.resolve(&planned.address.type_name)?;
    let (action, changes) = match &planned.intent {
        Intent::Converge(desired) => {
            let pending = lifecycle.plan(&mut planned.instance, desired)?;
            let action = match pending.action {
                PlanAction::Create => PreviewAction::Create,
                PlanAction::Update => PreviewAction::Update,
                PlanAction::NoOp => PreviewAction::NoOp,
            };
            (action, pending.changes.clone())
        }
        Intent::Destroy => match planned.instance.document() {
            Some(document) => (
                PreviewAction::Delete,
                diff::teardown(lifecycle.schema, document),
            ),
            None => (PreviewAction::NoOp, ChangeSet::new()),
        },
        Intent::Refresh => (PreviewAction::Refresh, ChangeSet::new()),
    };

    Ok(Preview {
        address: planned.address.clone(),
        action,
        changes,
    })
}

/// Preview, confirm and run a plan
///
/// Instances whose plan failed are reported as failed and never run.
/// Refresh-only plans do not ask for confirmation.
pub fn execute<P, C>(
    registry: &Registry,
    plan: &mut ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let report = preview(registry, plan);
    let changes = report.change_count();
    let mut summary = ExecuteSummary::default();

    let mut failed = HashSet::new();
    for (address, diagnostics) in &report.failures {
        let result = ApplyResult::failed(diagnostics.clone());
        progress.on_resource_complete(&address.to_string(), &result);
        summary.add_result(&result);
        failed.insert(address);
    }

    let runnable: Vec<&Preview> = report
        .previews
        .iter()
        .filter(|p| p.action != PreviewAction::NoOp)
        .collect();
    summary.no_change += report.previews.len() - runnable.len();

    if runnable.is_empty() {
        return Ok(summary);
    }

    if opts.dry_run {
        summary.skipped += runnable.len();
        return Ok(summary);
    }

    if changes > 0 && !confirm.confirm(&format!("Apply {changes} change(s)?"))? {
        summary.skipped += runnable.len();
        return Ok(summary);
    }

    let selected: HashSet<&Address> = runnable.iter().map(|p| &p.address).collect();
    let mut batch: Vec<&mut PlannedInstance> = plan
        .instances
        .iter_mut()
        .filter(|p| selected.contains(&p.address) && !failed.contains(&p.address))
        .collect();

    progress.on_batch_start(batch.len());
    let results = execute_batch(registry, &mut batch, opts.jobs, progress)?;
    for result in &results {
        summary.add_result(result);
    }
    progress.on_batch_complete();

    Ok(summary)
}

/// Run a batch of instances
fn execute_batch<P: ProgressCallback>(
    registry: &Registry,
    batch: &mut [&mut PlannedInstance],
    jobs: usize,
    progress: &mut P,
) -> Result<Vec<ApplyResult>> {
    if jobs <= 1 || batch.len() == 1 {
        let mut results = Vec::with_capacity(batch.len());
        for planned in batch.iter_mut() {
            let address = planned.address.to_string();
            progress.on_resource_start(&address);
            let result = run_instance(registry, planned);
            progress.on_resource_complete(&address, &result);
            results.push(result);
        }
        Ok(results)
    } else {
        execute_parallel(registry, batch, jobs, progress)
    }
}

/// Run instances in parallel using rayon
fn execute_parallel<P: ProgressCallback>(
    registry: &Registry,
    batch: &mut [&mut PlannedInstance],
    jobs: usize,
    progress: &mut P,
) -> Result<Vec<ApplyResult>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    // Progress callbacks are not thread-safe; report once the batch is done
    let results: Vec<(String, ApplyResult)> = pool.install(|| {
        batch
            .par_iter_mut()
            .map(|planned| {
                let result = run_instance(registry, planned);
                (planned.address.to_string(), result)
            })
            .collect()
    });

    for (address, result) in &results {
        progress.on_resource_complete(address, result);
    }

    Ok(results.into_iter().map(|(_, r)| r).collect())
}

/// Run a single instance to completion
fn run_instance(registry: &Registry, planned: &mut PlannedInstance) -> ApplyResult {
    let lifecycle = match registry.resolve(&planned.address.type_name) {
        Ok(lifecycle) => lifecycle,
        Err(err) => return ApplyResult::failed(err),
    };
    let instance = &mut planned.instance;

    let result = match planned.intent {
        Intent::Converge(_) => lifecycle.apply(instance).map(|outcome| match outcome {
            ApplyOutcome::Created => ApplyResult::Created,
            ApplyOutcome::Updated => ApplyResult::Updated,
            ApplyOutcome::NoChange => ApplyResult::NoChange,
        }),
        Intent::Refresh => lifecycle.refresh(instance).map(|outcome| match outcome {
            RefreshOutcome::InSync => ApplyResult::NoChange,
            RefreshOutcome::Drifted(changes) => ApplyResult::Drifted {
                changes: changes.actionable().count(),
            },
            RefreshOutcome::Gone => ApplyResult::Gone,
        }),
        Intent::Destroy => lifecycle.destroy(instance).map(|_| ApplyResult::Deleted),
    };

    result.unwrap_or_else(|err| {
        log::warn!("{}: {}", planned.address, err);
        ApplyResult::failed(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::document::Document;
    use crate::lifecycle::{LifecycleState, ResourceController, ResourceInstance};
    use crate::registry::RegistryBuilder;
    use crate::schema::{Attribute, AttributeType, Schema};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[derive(Default)]
    struct Remote {
        next: AtomicI64,
        quantities: Mutex<BTreeMap<i64, i64>>,
    }

    impl ResourceController for Remote {
        fn create(&self, planned: &Document) -> anyhow::Result<Document> {
            let quantity = planned.value_or_null("quantity").as_i64()?;
            if quantity < 0 {
                anyhow::bail!("quantity must not be negative");
            }
            let id = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            self.quantities.lock().unwrap().insert(id, quantity);
            Ok(Document::new().with("id", id))
        }

        fn read(&self, id: &str, _current: &Document) -> anyhow::Result<Option<Document>> {
            let id: i64 = id.parse()?;
            Ok(self
                .quantities
                .lock()
                .unwrap()
                .get(&id)
                .map(|q| Document::new().with("id", id).with("quantity", *q)))
        }

        fn update(
            &self,
            id: &str,
            planned: &Document,
            _changes: &ChangeSet,
        ) -> anyhow::Result<Document> {
            let id: i64 = id.parse()?;
            let quantity = planned.value_or_null("quantity").as_i64()?;
            self.quantities.lock().unwrap().insert(id, quantity);
            Ok(planned.clone())
        }

        fn delete(&self, id: &str) -> anyhow::Result<()> {
            let id: i64 = id.parse()?;
            self.quantities.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    fn registry() -> Registry {
        let schema = Schema::new()
            .with_attribute("id", Attribute::computed(AttributeType::int64()))
            .with_attribute("quantity", Attribute::required(AttributeType::int64()));
        let mut builder = RegistryBuilder::new();
        builder
            .register_resource_type("order", schema, Remote::default())
            .unwrap();
        builder.finalize()
    }

    fn converge(plan: &mut ExecutionPlan, name: &str, quantity: i64) {
        plan.add(
            Address::new("order", name),
            ResourceInstance::new(),
            Intent::Converge(Document::new().with("quantity", quantity)),
        );
    }

    fn state_of(plan: &ExecutionPlan, name: &str) -> LifecycleState {
        plan.get(&Address::new("order", name))
            .unwrap()
            .instance
            .state()
    }

    #[test]
    fn test_execute_empty_plan() {
        let registry = registry();
        let mut plan = ExecutionPlan::new();
        let summary = execute(
            &registry,
            &mut plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_execute_parallel_creates() {
        let registry = registry();
        let mut plan = ExecutionPlan::new();
        for (i, name) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            converge(&mut plan, name, i64::try_from(i).unwrap() + 1);
        }

        let summary = execute(
            &registry,
            &mut plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(summary.created, 5);
        assert!(summary.is_success());
        assert!(
            plan.instances
                .iter()
                .all(|p| p.instance.state() == LifecycleState::Synced)
        );

        let mut ids: Vec<i64> = plan
            .instances
            .iter()
            .map(|p| p.instance.document().unwrap().get("id").unwrap().as_i64().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_failure_is_isolated() {
        let registry = registry();
        let mut plan = ExecutionPlan::new();
        converge(&mut plan, "good", 1);
        converge(&mut plan, "bad", -1);
        plan.add(
            Address::new("order", "invalid"),
            ResourceInstance::new(),
            Intent::Converge(Document::new().with("quantity", "many")),
        );

        let summary = execute(
            &registry,
            &mut plan,
            &ExecuteOptions {
                jobs: 1,
                ..Default::default()
            },
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(state_of(&plan, "good"), LifecycleState::Synced);
        assert_eq!(state_of(&plan, "bad"), LifecycleState::Planned);
        assert_eq!(state_of(&plan, "invalid"), LifecycleState::Absent);
    }

    #[test]
    fn test_dry_run_and_decline_change_nothing() {
        let registry = registry();

        let mut plan = ExecutionPlan::new();
        converge(&mut plan, "a", 1);
        let summary = execute(
            &registry,
            &mut plan,
            &ExecuteOptions {
                dry_run: true,
                ..Default::default()
            },
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(plan.instances[0].instance.document().is_none());

        let summary = execute(
            &registry,
            &mut plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total_changes(), 0);
    }

    #[test]
    fn test_preview_reports_actions() {
        let registry = registry();
        let mut plan = ExecutionPlan::new();
        converge(&mut plan, "a", 1);
        plan.add(
            Address::new("order", "gone"),
            ResourceInstance::new(),
            Intent::Destroy,
        );
        plan.add(
            Address::new("tea", "x"),
            ResourceInstance::new(),
            Intent::Refresh,
        );

        let report = preview(&registry, &mut plan);
        assert_eq!(report.change_count(), 1);
        assert_eq!(report.previews[0].action, PreviewAction::Create);
        assert_eq!(report.previews[1].action, PreviewAction::NoOp);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, Address::new("tea", "x"));
    }

    #[test]
    fn test_converge_then_refresh_then_destroy() {
        let registry = registry();
        let mut plan = ExecutionPlan::new();
        converge(&mut plan, "a", 2);
        execute(
            &registry,
            &mut plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        let instance = plan.instances.remove(0).instance;
        let mut refresh = ExecutionPlan::new();
        refresh.add(Address::new("order", "a"), instance, Intent::Refresh);
        let summary = execute(
            &registry,
            &mut refresh,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();
        assert_eq!(summary.no_change, 1);

        let instance = refresh.instances.remove(0).instance;
        let mut destroy = ExecutionPlan::new();
        destroy.add(Address::new("order", "a"), instance, Intent::Destroy);
        let summary = execute(
            &registry,
            &mut destroy,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();
        assert_eq!(summary.deleted, 1);
        assert_eq!(state_of(&destroy, "a"), LifecycleState::Deleted);
    }
}
