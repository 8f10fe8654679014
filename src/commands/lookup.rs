//! Look up an existing group by name

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::{Attributes, ManagedState, Provider};

use crate::Context;
use crate::config::{Config, USER_GROUP_KIND};
use crate::engine::{op_context, planner};
use crate::ui;

use super::{config_path, connect};

pub fn run(ctx: &Context, name: &str, json: bool) -> Result<()> {
    let config = Config::load_or_default(&config_path(ctx)?)?;
    let provider = connect(&config)?;
    let group = lookup(&provider, name)?;

    if json {
        let out =
            serde_json::to_string_pretty(&group).context("Failed to serialize lookup result")?;
        println!("{out}");
        return Ok(());
    }

    ui::header(&format!("User group {name:?}"));
    ui::kv("id", &group.id);
    for (key, value) in &group.attributes {
        ui::kv(key, value);
    }
    Ok(())
}

/// Resolve `name` through the user group data source
fn lookup(provider: &Provider, name: &str) -> Result<ManagedState> {
    let type_name = planner::type_name_for(provider, USER_GROUP_KIND)?;
    let mut query = Attributes::new();
    query.insert("name".to_string(), name.to_string());

    let response = provider.read_data_source(&op_context(None), &type_name, &query);
    ui::diagnostics(&type_name, &response.diagnostics);

    match response.state {
        Some(state) if response.is_success() => Ok(state),
        _ => bail!("Lookup of {name:?} failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::adapter::MockRemote;
    use declarative::OpContext;
    use std::sync::Arc;

    fn provider(names: &[&str]) -> Provider {
        let remote = MockRemote::new().with_collection("usergroups", "user_group");
        let provider = Provider::jumpcloud().with_client(Arc::new(remote));
        for name in names {
            let mut desired = Attributes::new();
            desired.insert("name".into(), (*name).into());
            assert!(
                provider
                    .create(&OpContext::new(), "jumpcloud_user_group", &desired)
                    .is_success()
            );
        }
        provider
    }

    #[test]
    fn test_lookup_single_match() {
        let provider = provider(&["eng-team", "ops-team"]);
        let group = lookup(&provider, "ops-team").unwrap();
        assert_eq!(group.name(), Some("ops-team"));
        assert!(!group.id.is_empty());
    }

    #[test]
    fn test_lookup_no_match() {
        let provider = provider(&["eng-team"]);
        assert!(lookup(&provider, "nonexistent").is_err());
    }

    #[test]
    fn test_lookup_ambiguous() {
        let provider = provider(&["dup", "dup"]);
        assert!(lookup(&provider, "dup").is_err());
    }
}
