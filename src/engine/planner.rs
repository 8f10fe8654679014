//! Execution planner - turns config and state into an execution plan

use anyhow::{Result, bail};
use declarative::{Diagnostics, ExecutionPlan, PlannedAction, Provider};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::DesiredResource;
use crate::state::StateFile;

/// Host-facing type name for a kind, checked against the provider
pub fn type_name_for(provider: &Provider, kind: &str) -> Result<String> {
    let type_name = format!("{}_{kind}", provider.type_name());
    if provider.kind(&type_name).is_none() {
        bail!(
            "Unknown resource kind '{kind}' (supported: {})",
            provider.type_names().join(", ")
        );
    }
    Ok(type_name)
}

/// Plan every address found in config or state
pub fn build_plan(
    provider: &Provider,
    desired: &BTreeMap<String, DesiredResource>,
    state: &StateFile,
) -> Result<ExecutionPlan> {
    let addresses: BTreeSet<&String> = desired.keys().chain(state.resources.keys()).collect();
    let mut plan = ExecutionPlan::new();

    for address in addresses {
        let wanted = desired.get(address);
        let record = state.get(address);

        let type_name = match (wanted, record) {
            (Some(w), Some(r)) => {
                let type_name = type_name_for(provider, &w.kind)?;
                if type_name != r.type_name {
                    bail!(
                        "{address} is held in state as {} but configured as {type_name}",
                        r.type_name
                    );
                }
                type_name
            }
            (Some(w), None) => type_name_for(provider, &w.kind)?,
            (None, Some(r)) => r.type_name.clone(),
            (None, None) => continue,
        };

        let prior = record.map(crate::state::ResourceRecord::to_managed);
        let action = provider.plan(&type_name, prior.as_ref(), wanted.map(|w| &w.attributes))?;
        if let Some(action) = action {
            plan.push(address.clone(), type_name, action);
        }
    }

    Ok(plan)
}

/// Plan deleting everything in state
pub fn destroy_plan(state: &StateFile) -> ExecutionPlan {
    let mut plan = ExecutionPlan::new();
    for (address, record) in &state.resources {
        plan.push(
            address.clone(),
            record.type_name.clone(),
            PlannedAction::Delete {
                id: record.id.clone(),
            },
        );
    }
    plan
}

/// Check declared attributes against the resource schemas
///
/// Returns only the addresses with diagnostics.
pub fn validate(
    provider: &Provider,
    desired: &BTreeMap<String, DesiredResource>,
) -> Result<Vec<(String, Diagnostics)>> {
    let mut problems = Vec::new();
    for (address, resource) in desired {
        let type_name = type_name_for(provider, &resource.kind)?;
        let Some(kind) = provider.kind(&type_name) else {
            continue;
        };
        let diagnostics = kind.resource_schema().validate(&resource.attributes);
        if !diagnostics.is_empty() {
            problems.push((address.clone(), diagnostics));
        }
    }
    Ok(problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Attributes, ManagedState};

    fn named(name: &str) -> Attributes {
        let mut a = Attributes::new();
        a.insert("name".into(), name.into());
        a
    }

    fn desired(pairs: &[(&str, &str)]) -> BTreeMap<String, DesiredResource> {
        pairs
            .iter()
            .map(|(label, name)| {
                (
                    format!("user_group.{label}"),
                    DesiredResource {
                        kind: "user_group".into(),
                        attributes: named(name),
                    },
                )
            })
            .collect()
    }

    fn state(pairs: &[(&str, &str, &str)]) -> StateFile {
        let mut state = StateFile::default();
        for (label, id, name) in pairs {
            state.record(
                &format!("user_group.{label}"),
                "jumpcloud_user_group",
                Some(ManagedState::new(*id, named(name))),
            );
        }
        state
    }

    #[test]
    fn test_build_plan_mixed() {
        let provider = Provider::jumpcloud();
        let plan = build_plan(
            &provider,
            &desired(&[("eng", "eng-team"), ("ops", "ops-team"), ("qa", "qa")]),
            &state(&[("ops", "grp_2", "ops"), ("qa", "grp_3", "qa"), ("old", "grp_4", "old")]),
        )
        .unwrap();

        let summary = plan.summary();
        assert_eq!(summary.creates, 1);
        assert_eq!(summary.updates, 1);
        assert_eq!(summary.deletes, 1);
        assert_eq!(summary.unchanged, 1);

        let addresses: Vec<_> = plan.entries.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(
            addresses,
            ["user_group.eng", "user_group.old", "user_group.ops", "user_group.qa"]
        );
        assert!(plan.entries.iter().all(|e| e.type_name == "jumpcloud_user_group"));
    }

    #[test]
    fn test_unknown_kind() {
        let provider = Provider::jumpcloud();
        let mut wanted = desired(&[]);
        wanted.insert(
            "system_group.x".into(),
            DesiredResource {
                kind: "system_group".into(),
                attributes: named("x"),
            },
        );
        assert!(build_plan(&provider, &wanted, &StateFile::default()).is_err());
    }

    #[test]
    fn test_destroy_plan() {
        let plan = destroy_plan(&state(&[("eng", "grp_1", "eng"), ("ops", "grp_2", "ops")]));
        assert_eq!(plan.summary().deletes, 2);
    }

    #[test]
    fn test_validate_reports_empty_name() {
        let provider = Provider::jumpcloud();
        let problems = validate(&provider, &desired(&[("eng", ""), ("ops", "ops")])).unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].0, "user_group.eng");
        assert!(problems[0].1.has_error());
    }
}
