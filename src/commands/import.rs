//! Import an existing group into state

use anyhow::{Result, bail};
use declarative::Provider;

use crate::Context;
use crate::config::{Config, parse_address};
use crate::engine::{op_context, planner};
use crate::state::StateFile;
use crate::ui;

use super::{config_path, connect, state_path};

pub fn run(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let config = Config::load_or_default(&config_path(ctx)?)?;
    let path = state_path(ctx)?;
    let mut state = StateFile::load(&path)?;

    // Fail on a bad address before touching the network
    let (kind, _) = parse_address(address)?;
    planner::type_name_for(&Provider::jumpcloud(), kind)?;

    if !config.desired().contains_key(address) {
        ui::warn(&format!(
            "{address} is not declared in the config; the next apply will delete it"
        ));
    }

    let provider = connect(&config)?;
    import_into(&provider, &mut state, address, id)?;
    state.touch(&path)?;

    ui::success(&format!("Imported {} as {address}", id.trim()));
    Ok(())
}

/// Import `id` under `address`, recording it in `state`
fn import_into(provider: &Provider, state: &mut StateFile, address: &str, id: &str) -> Result<()> {
    let (kind, _) = parse_address(address)?;
    let type_name = planner::type_name_for(provider, kind)?;

    if state.get(address).is_some() {
        bail!("{address} is already managed; remove it from state before importing");
    }
    if let Some(existing) = state.address_of(&type_name, id.trim()) {
        bail!("{} is already managed as {existing}", id.trim());
    }

    let response = provider.import_resource(&op_context(None), &type_name, id);
    ui::diagnostics(address, &response.diagnostics);
    if !response.is_success() {
        bail!("Import of {address} failed");
    }

    state.record(address, &type_name, response.state);
    Ok(())
}
