//! Lifecycle commands
//!
//! - `plan` - Show what apply would change
//! - `apply` - Make the remote groups match the config
//! - `refresh` - Record drift and upstream removals in state
//! - `destroy` - Delete every managed group

use anyhow::{Result, bail};
use declarative::Provider;
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::{ApplyArgs, DestroyArgs, PlanArgs, RefreshArgs};
use crate::config::{Config, DesiredResource};
use crate::engine::{self, ExecuteOptions, differ, planner};
use crate::state::StateFile;
use crate::ui;

use super::{config_path, connect, state_path, timeout};

/// Show the execution plan
///
/// State is refreshed in memory first unless `--no-refresh` is given; the
/// state file is never written.
pub fn plan(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let config = Config::load(&config_path(ctx)?)?;
    let mut state = StateFile::load(&state_path(ctx)?)?;
    let desired = config.desired();

    let provider = if args.no_refresh {
        Provider::jumpcloud()
    } else {
        connect(&config)?
    };
    check_config(&provider, &desired)?;

    if !args.no_refresh {
        let opts = ExecuteOptions {
            quiet: ctx.quiet,
            timeout: timeout(args.timeout),
            ..Default::default()
        };
        let summary = engine::refresh(&provider, &mut state, args.target.as_deref(), &opts)?;
        if !summary.is_success() {
            bail!("{} resource(s) could not be refreshed", summary.failed);
        }
    }

    let plan = planner::build_plan(&provider, &desired, &state)?
        .filter_by_target(args.target.as_deref());
    differ::display_plan(&plan, ctx.verbose > 0);
    Ok(())
}

/// Refresh, plan, confirm and execute
pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let config = Config::load(&config_path(ctx)?)?;
    let path = state_path(ctx)?;
    let mut state = StateFile::load(&path)?;
    let desired = config.desired();

    let provider = connect(&config)?;
    check_config(&provider, &desired)?;

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs,
        yes: args.yes,
        quiet: ctx.quiet,
        timeout: timeout(args.timeout),
    };

    let refreshed = engine::refresh(&provider, &mut state, args.target.as_deref(), &opts)?;
    if !refreshed.is_success() {
        if !args.dry_run {
            state.touch(&path)?;
        }
        bail!(
            "{} resource(s) could not be refreshed; nothing applied",
            refreshed.failed
        );
    }

    let plan = planner::build_plan(&provider, &desired, &state)?
        .filter_by_target(args.target.as_deref());
    let summary = engine::execute(&provider, &plan, &mut state, &opts)?;

    if !args.dry_run {
        state.touch(&path)?;
    }

    if !summary.is_success() {
        bail!("{} operation(s) failed", summary.failed);
    }
    Ok(())
}

/// Read every managed resource and persist what changed
pub fn refresh(ctx: &Context, args: &RefreshArgs) -> Result<()> {
    let path = state_path(ctx)?;
    let mut state = StateFile::load(&path)?;
    if state.resources.is_empty() {
        ui::info("No managed resources in state");
        return Ok(());
    }

    let config = Config::load_or_default(&config_path(ctx)?)?;
    let provider = connect(&config)?;

    let opts = ExecuteOptions {
        jobs: args.jobs,
        quiet: ctx.quiet,
        timeout: timeout(args.timeout),
        ..Default::default()
    };
    let summary = engine::refresh(&provider, &mut state, args.target.as_deref(), &opts)?;
    state.touch(&path)?;

    if summary.removed_upstream > 0 {
        ui::warn(&format!(
            "{} resource(s) removed upstream and dropped from state",
            summary.removed_upstream
        ));
    }
    if !summary.is_success() {
        bail!("{} resource(s) could not be refreshed", summary.failed);
    }
    ui::success(&format!("Refreshed {} resource(s)", summary.refreshed));
    Ok(())
}

/// Delete every managed resource
pub fn destroy(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let path = state_path(ctx)?;
    let mut state = StateFile::load(&path)?;
    let plan = planner::destroy_plan(&state).filter_by_target(args.target.as_deref());
    if plan.is_empty() {
        ui::info("Nothing to destroy");
        return Ok(());
    }

    let config = Config::load_or_default(&config_path(ctx)?)?;
    let provider = connect(&config)?;

    let opts = ExecuteOptions {
        jobs: args.jobs,
        yes: args.yes,
        quiet: ctx.quiet,
        timeout: timeout(args.timeout),
        ..Default::default()
    };
    let summary = engine::execute(&provider, &plan, &mut state, &opts)?;
    state.touch(&path)?;

    if !summary.is_success() {
        bail!("{} operation(s) failed", summary.failed);
    }
    Ok(())
}

/// Print schema diagnostics for every declared resource; fail on errors
fn check_config(provider: &Provider, desired: &BTreeMap<String, DesiredResource>) -> Result<()> {
    let problems = planner::validate(provider, desired)?;
    let mut errors = 0;
    for (address, diagnostics) in &problems {
        ui::diagnostics(address, diagnostics);
        errors += diagnostics.error_count();
    }
    if errors > 0 {
        bail!("Configuration has {errors} error(s)");
    }
    Ok(())
}
