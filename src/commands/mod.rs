//! Command implementations

pub mod import;
pub mod lifecycle;
pub mod lookup;
pub mod schema;

use anyhow::{Result, bail};
use declarative::{CredentialResolver, Provider};
use std::path::PathBuf;
use std::time::Duration;

use crate::Context;
use crate::config::Config;
use crate::paths;
use crate::ui;

/// Config file in effect: `--config`, or the default location
pub fn config_path(ctx: &Context) -> Result<PathBuf> {
    match &ctx.config {
        Some(path) => Ok(path.clone()),
        None => paths::config_file(),
    }
}

/// State file in effect: `--state`, or the default location
pub fn state_path(ctx: &Context) -> Result<PathBuf> {
    match &ctx.state {
        Some(path) => Ok(path.clone()),
        None => paths::state_file(),
    }
}

/// Build a configured provider from the `[provider]` block
///
/// Credentials left out of the config come from the environment.
pub fn connect(config: &Config) -> Result<Provider> {
    let mut provider = Provider::jumpcloud();
    let diagnostics = provider.configure(
        &config.provider,
        &CredentialResolver::new(),
        jcapi::connector,
    );
    ui::diagnostics("provider", &diagnostics);

    if diagnostics.has_error() || !provider.is_configured() {
        bail!("Could not configure the {} provider", provider.type_name());
    }
    Ok(provider)
}

/// Seconds from the command line as a timeout
pub fn timeout(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}
