//! Execution engine - runs planned operations against the provider

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use declarative::{
    Change, ExecutionPlan, ManagedState, OpContext, Outcome, PlanEntry, Provider, Response,
    target_matches,
};
use rayon::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::progress;
use crate::state::StateFile;
use crate::ui;

use super::differ::display_plan;

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Hide the progress bar
    pub quiet: bool,
    /// Deadline for the whole run
    pub timeout: Option<Duration>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            yes: false,
            quiet: false,
            timeout: None,
        }
    }
}

/// Summary of execution results
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub refreshed: usize,
    pub removed_upstream: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn count(&mut self, response: &Response) {
        match response.outcome {
            Outcome::Created | Outcome::Imported => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Deleted => self.deleted += 1,
            Outcome::Refreshed => self.refreshed += 1,
            Outcome::RemovedUpstream => self.removed_upstream += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Result of one operation, tagged with where it goes in state
#[derive(Debug, Clone)]
pub struct ApplyRecord {
    pub address: String,
    pub type_name: String,
    pub response: Response,
}

/// Execute a plan with confirmation, progress and state bookkeeping
///
/// Every response is folded into `state`; the caller persists it.
pub fn execute(
    provider: &Provider,
    plan: &ExecutionPlan,
    state: &mut StateFile,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    display_plan(plan, false);

    let changes: Vec<(&PlanEntry, Change<'_>)> = plan.changes().collect();
    if changes.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(ExecuteSummary::default());
    }

    if !opts.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ExecuteSummary {
            skipped: changes.len(),
            ..Default::default()
        });
    }

    println!();
    println!("  {} Applying {} change(s)...", "→".cyan(), changes.len());

    let ctx = op_context(opts.timeout);
    let records = run_parallel(&changes, opts, "Applying", |(entry, change)| {
        let prior = prior_state(state, entry);
        let response = match *change {
            Change::Create(desired) => provider.create(&ctx, &entry.type_name, desired),
            Change::Update(desired) => provider.update(&ctx, &entry.type_name, &prior, desired),
            Change::Delete => provider.delete(&ctx, &entry.type_name, &prior),
        };
        ApplyRecord {
            address: entry.address.clone(),
            type_name: entry.type_name.clone(),
            response,
        }
    })?;

    let summary = merge_records(state, records);
    log::info!("{} change(s) applied", summary.total_changes());
    print_summary(&summary);
    Ok(summary)
}

/// Read every managed resource and fold the results into state
///
/// Resources that disappeared upstream are dropped from state.
pub fn refresh(
    provider: &Provider,
    state: &mut StateFile,
    target: Option<&str>,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    let held: Vec<(String, String, ManagedState)> = state
        .resources
        .iter()
        .filter(|(address, _)| target.is_none_or(|t| target_matches(address, t)))
        .map(|(address, r)| (address.clone(), r.type_name.clone(), r.to_managed()))
        .collect();

    if held.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    let ctx = op_context(opts.timeout);
    let records = run_parallel(&held, opts, "Refreshing", |(address, type_name, current)| {
        ApplyRecord {
            address: address.clone(),
            type_name: type_name.clone(),
            response: provider.read(&ctx, type_name, current),
        }
    })?;

    Ok(merge_records(state, records))
}

/// Context for a run, with a deadline when `timeout` is set
pub fn op_context(timeout: Option<Duration>) -> OpContext {
    timeout.map_or_else(OpContext::new, OpContext::with_timeout)
}

fn prior_state(state: &StateFile, entry: &PlanEntry) -> ManagedState {
    state.get(&entry.address).map_or_else(
        || ManagedState::from_id(entry.action.id().unwrap_or_default()),
        crate::state::ResourceRecord::to_managed,
    )
}

/// Fold responses into state in address order and report diagnostics
fn merge_records(state: &mut StateFile, mut records: Vec<ApplyRecord>) -> ExecuteSummary {
    records.sort_by(|a, b| a.address.cmp(&b.address));

    let mut summary = ExecuteSummary::default();
    for record in records {
        let ApplyRecord {
            address,
            type_name,
            response,
        } = record;

        summary.count(&response);
        ui::diagnostics(&address, &response.diagnostics);
        log::debug!("{address}: {:?} ({})", response.outcome, response.lifecycle);

        state.record(&address, &type_name, response.state);
    }
    summary
}

/// Run one operation per item on a bounded pool
fn run_parallel<T, F>(
    items: &[T],
    opts: &ExecuteOptions,
    prefix: &'static str,
    op: F,
) -> Result<Vec<ApplyRecord>>
where
    T: Sync,
    F: Fn(&T) -> ApplyRecord + Sync,
{
    let pb = progress::bar(items.len() as u64, prefix, opts.quiet);
    let results: Arc<Mutex<Vec<ApplyRecord>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()
        .context("Failed to create apply thread pool")?;

    pool.install(|| {
        items.par_iter().for_each(|item| {
            let record = op(item);

            let symbol = if record.response.is_success() {
                "✓"
            } else {
                "✗"
            };
            pb.set_message(format!("{symbol} {}", record.address));
            pb.inc(1);

            push_apply_record(&results, record);
        });
    });

    pb.finish_and_clear();

    into_apply_records(results)
}

fn push_apply_record(results: &Arc<Mutex<Vec<ApplyRecord>>>, record: ApplyRecord) {
    match results.lock() {
        Ok(mut locked) => locked.push(record),
        Err(poisoned) => poisoned.into_inner().push(record),
    }
}

fn into_apply_records(results: Arc<Mutex<Vec<ApplyRecord>>>) -> Result<Vec<ApplyRecord>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow::anyhow!("Failed to collect apply results: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Changes applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Changes applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources updated", summary.updated);
    }
    if summary.deleted > 0 {
        println!("    • {} resources deleted", summary.deleted);
    }
    if summary.removed_upstream > 0 {
        println!(
            "    • {} resources removed upstream",
            summary.removed_upstream
        );
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::adapter::MockRemote;
    use declarative::adapter::MockCall;
    use declarative::{Attributes, CancelHandle, Diagnostics, Lifecycle, PlannedAction};

    const GROUP: &str = "jumpcloud_user_group";

    fn named(name: &str) -> Attributes {
        let mut a = Attributes::new();
        a.insert("name".into(), name.into());
        a
    }

    fn record(address: &str, outcome: Outcome, state: Option<ManagedState>) -> ApplyRecord {
        ApplyRecord {
            address: address.into(),
            type_name: GROUP.into(),
            response: Response {
                outcome,
                state,
                lifecycle: Lifecycle::Managed,
                diagnostics: Diagnostics::new(),
            },
        }
    }

    fn remote() -> MockRemote {
        MockRemote::new().with_collection("usergroups", "user_group")
    }

    fn opts() -> ExecuteOptions {
        ExecuteOptions {
            yes: true,
            quiet: true,
            jobs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn push_apply_record_handles_poisoned_mutex() {
        let results: Arc<Mutex<Vec<ApplyRecord>>> = Arc::new(Mutex::new(Vec::new()));
        let poisoned = Arc::clone(&results);

        let _ = std::thread::spawn(move || {
            let _guard = poisoned
                .lock()
                .expect("lock should succeed before poisoning");
            panic!("intentional poison");
        })
        .join();

        push_apply_record(&results, record("user_group.eng", Outcome::Refreshed, None));

        let len = match results.lock() {
            Ok(locked) => locked.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        assert_eq!(len, 1);
    }

    #[test]
    fn into_apply_records_recovers_from_poisoned_mutex() {
        let results: Arc<Mutex<Vec<ApplyRecord>>> = Arc::new(Mutex::new(Vec::new()));
        let poisoned = Arc::clone(&results);

        let _ = std::thread::spawn(move || {
            let mut guard = poisoned
                .lock()
                .expect("lock should succeed before poisoning");
            guard.push(record("user_group.eng", Outcome::Refreshed, None));
            panic!("intentional poison");
        })
        .join();

        let collected = into_apply_records(results).expect("poisoned mutex should be recovered");
        assert_eq!(collected.len(), 1);
    }

    #[test]
    fn merge_records_upserts_and_drops() {
        let mut state = StateFile::default();
        state.record("user_group.old", GROUP, Some(ManagedState::new("grp_9", named("old"))));

        let summary = merge_records(
            &mut state,
            vec![
                record("user_group.old", Outcome::Deleted, None),
                record(
                    "user_group.eng",
                    Outcome::Created,
                    Some(ManagedState::new("grp_1", named("eng"))),
                ),
                record("user_group.bad", Outcome::Failed, None),
            ],
        );

        assert_eq!(summary.created, 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_success());
        assert_eq!(state.get("user_group.eng").unwrap().id, "grp_1");
        assert!(state.get("user_group.old").is_none());
        assert!(state.get("user_group.bad").is_none());
    }

    #[test]
    fn execute_applies_plan_and_records_state() {
        let remote = Arc::new(remote());
        let provider = Provider::jumpcloud().with_client(remote);

        let mut plan = ExecutionPlan::new();
        plan.push(
            "user_group.eng",
            GROUP,
            PlannedAction::Create {
                desired: named("eng-team"),
            },
        );
        plan.push(
            "user_group.ops",
            GROUP,
            PlannedAction::Create {
                desired: named("ops-team"),
            },
        );

        let mut state = StateFile::default();
        let summary = execute(&provider, &plan, &mut state, &opts()).unwrap();
        assert_eq!(summary.created, 2);
        assert!(summary.is_success());

        let eng = state.get("user_group.eng").unwrap();
        assert_eq!(eng.attributes.get("name").map(String::as_str), Some("eng-team"));
        assert_ne!(eng.id, state.get("user_group.ops").unwrap().id);
    }

    #[test]
    fn execute_leaves_converged_entries_untouched() {
        let remote = remote();
        let provider = Provider::jumpcloud().with_client(Arc::new(remote.clone()));

        let mut state = StateFile::default();
        state.record(
            "user_group.qa",
            GROUP,
            Some(ManagedState::new("grp_missing", named("qa"))),
        );
        let mut plan = ExecutionPlan::new();
        plan.push(
            "user_group.qa",
            GROUP,
            PlannedAction::NoOp {
                id: "grp_missing".into(),
            },
        );
        plan.push(
            "user_group.eng",
            GROUP,
            PlannedAction::Create {
                desired: named("eng"),
            },
        );

        let summary = execute(&provider, &plan, &mut state, &opts()).unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.refreshed, 0);
        assert_eq!(remote.calls(), vec![MockCall::Create]);
        assert_eq!(state.get("user_group.qa").unwrap().id, "grp_missing");
    }

    #[test]
    fn execute_dry_run_changes_nothing() {
        let provider = Provider::jumpcloud().with_client(Arc::new(remote()));
        let mut plan = ExecutionPlan::new();
        plan.push(
            "user_group.eng",
            GROUP,
            PlannedAction::Create {
                desired: named("eng"),
            },
        );

        let mut state = StateFile::default();
        let options = ExecuteOptions {
            dry_run: true,
            ..opts()
        };
        let summary = execute(&provider, &plan, &mut state, &options).unwrap();
        assert_eq!(summary, ExecuteSummary::default());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn refresh_drops_resources_removed_upstream() {
        let remote = Arc::new(remote());
        let provider = Provider::jumpcloud().with_client(remote);

        let mut plan = ExecutionPlan::new();
        plan.push(
            "user_group.eng",
            GROUP,
            PlannedAction::Create {
                desired: named("eng"),
            },
        );
        let mut state = StateFile::default();
        execute(&provider, &plan, &mut state, &opts()).unwrap();
        state.record(
            "user_group.gone",
            GROUP,
            Some(ManagedState::new("grp_missing", named("gone"))),
        );

        let summary = refresh(&provider, &mut state, None, &opts()).unwrap();
        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.removed_upstream, 1);
        assert!(state.get("user_group.eng").is_some());
        assert!(state.get("user_group.gone").is_none());
    }

    #[test]
    fn refresh_respects_target() {
        let provider = Provider::jumpcloud().with_client(Arc::new(remote()));
        let mut state = StateFile::default();
        state.record(
            "user_group.eng",
            GROUP,
            Some(ManagedState::new("grp_missing", named("eng"))),
        );

        let summary = refresh(&provider, &mut state, Some("user_group.ops"), &opts()).unwrap();
        assert_eq!(summary, ExecuteSummary::default());
        assert!(state.get("user_group.eng").is_some());
    }

    #[test]
    fn cancelled_context_fails_every_operation() {
        let ctx = OpContext::new();
        let handle: CancelHandle = ctx.cancel_handle();
        handle.cancel();

        let provider = Provider::jumpcloud().with_client(Arc::new(remote()));
        let response = provider.create(&ctx, GROUP, &named("eng"));
        assert_eq!(response.outcome, Outcome::Failed);
        assert!(response.diagnostics.has_error());
    }
}
