//! Planner - decides which lifecycle operation converges a resource

use crate::diff::{AttributeChange, attribute_changes};
use crate::schema::Schema;
use crate::types::{Attributes, ManagedState};
use serde::{Deserialize, Serialize};

/// Operation needed to converge one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannedAction {
    /// Not in state, present in configuration
    Create { desired: Attributes },
    /// In state with differing configurable attributes
    Update {
        id: String,
        desired: Attributes,
        changes: Vec<AttributeChange>,
    },
    /// In state, gone from configuration
    Delete { id: String },
    /// Already converged
    NoOp { id: String },
}

/// The remote call a changing action turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<'a> {
    Create(&'a Attributes),
    Update(&'a Attributes),
    Delete,
}

impl PlannedAction {
    /// Whether applying this action changes anything
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp { .. })
    }

    /// The remote call for this action; `None` when already converged
    pub fn change(&self) -> Option<Change<'_>> {
        match self {
            Self::Create { desired } => Some(Change::Create(desired)),
            Self::Update { desired, .. } => Some(Change::Update(desired)),
            Self::Delete { .. } => Some(Change::Delete),
            Self::NoOp { .. } => None,
        }
    }

    /// Id carried from prior state, if any
    ///
    /// Known ids are always carried forward, never planned as unknown.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Create { .. } => None,
            Self::Update { id, .. } | Self::Delete { id } | Self::NoOp { id } => Some(id),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Create { .. } => "+",
            Self::Update { .. } => "~",
            Self::Delete { .. } => "-",
            Self::NoOp { .. } => "=",
        }
    }
}

/// Compute the action for one resource
///
/// Only configurable attributes take part in the comparison; computed
/// attributes held in state never force an update. Returns `None` when the
/// resource is neither in state nor in configuration.
pub fn plan(
    schema: &Schema,
    prior: Option<&ManagedState>,
    desired: Option<&Attributes>,
) -> Option<PlannedAction> {
    match (prior, desired) {
        (None, None) => None,
        (None, Some(desired)) => Some(PlannedAction::Create {
            desired: desired.clone(),
        }),
        (Some(prior), None) => Some(PlannedAction::Delete {
            id: prior.id.clone(),
        }),
        (Some(prior), Some(desired)) => {
            let current = schema.configurable_subset(&prior.attributes);
            let wanted = schema.configurable_subset(desired);
            let changes = attribute_changes(&current, &wanted);
            if changes.is_empty() {
                Some(PlannedAction::NoOp {
                    id: prior.id.clone(),
                })
            } else {
                Some(PlannedAction::Update {
                    id: prior.id.clone(),
                    desired: desired.clone(),
                    changes,
                })
            }
        }
    }
}

/// One addressed entry of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Local address, `<kind>.<label>`
    pub address: String,
    /// Host-facing type name
    pub type_name: String,
    pub action: PlannedAction,
}

/// An ordered execution plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub entries: Vec<PlanEntry>,
}

impl ExecutionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        address: impl Into<String>,
        type_name: impl Into<String>,
        action: PlannedAction,
    ) {
        self.entries.push(PlanEntry {
            address: address.into(),
            type_name: type_name.into(),
            action,
        });
    }

    /// Entries that change something, with the call each one makes
    pub fn changes(&self) -> impl Iterator<Item = (&PlanEntry, Change<'_>)> {
        self.entries
            .iter()
            .filter_map(|e| e.action.change().map(|change| (e, change)))
    }

    /// Filter plan to only include entries matching a target pattern
    ///
    /// Target format: "kind" or "kind.label"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => Self {
                entries: self
                    .entries
                    .into_iter()
                    .filter(|e| target_matches(&e.address, t))
                    .collect(),
            },
        }
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for entry in &self.entries {
            match entry.action {
                PlannedAction::Create { .. } => summary.creates += 1,
                PlannedAction::Update { .. } => summary.updates += 1,
                PlannedAction::Delete { .. } => summary.deletes += 1,
                PlannedAction::NoOp { .. } => summary.unchanged += 1,
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Plan summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub unchanged: usize,
}

impl PlanSummary {
    /// Total number of changes
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Whether an address is selected by a target
///
/// Target format: "kind" or "kind.label"
pub fn target_matches(address: &str, target: &str) -> bool {
    let (kind, label) = match target.split_once('.') {
        Some((kind, label)) => (kind, Some(label)),
        None => (target, None),
    };
    let (entry_kind, entry_label) = address.split_once('.').unwrap_or((address, ""));
    entry_kind == kind && label.is_none_or(|l| l == entry_label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;

    fn schema() -> Schema {
        Schema::new("group")
            .with_attribute("id", Attribute::computed().preserve_on_refresh())
            .with_attribute("name", Attribute::required())
    }

    fn attrs(name: &str) -> Attributes {
        let mut a = Attributes::new();
        a.insert("name".into(), name.into());
        a
    }

    #[test]
    fn test_plan_create() {
        let action = plan(&schema(), None, Some(&attrs("eng"))).unwrap();
        assert!(matches!(action, PlannedAction::Create { .. }));
        assert_eq!(action.id(), None);
    }

    #[test]
    fn test_plan_delete() {
        let prior = ManagedState::new("grp_1", attrs("eng"));
        let action = plan(&schema(), Some(&prior), None).unwrap();
        assert_eq!(action, PlannedAction::Delete { id: "grp_1".into() });
    }

    #[test]
    fn test_plan_noop_keeps_id() {
        let prior = ManagedState::new("grp_1", attrs("eng"));
        let action = plan(&schema(), Some(&prior), Some(&attrs("eng"))).unwrap();
        assert_eq!(action, PlannedAction::NoOp { id: "grp_1".into() });
        assert!(!action.is_change());
    }

    #[test]
    fn test_plan_update_lists_changes() {
        let prior = ManagedState::new("grp_1", attrs("eng"));
        let action = plan(&schema(), Some(&prior), Some(&attrs("engineering"))).unwrap();
        match action {
            PlannedAction::Update { id, changes, .. } => {
                assert_eq!(id, "grp_1");
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].before.as_deref(), Some("eng"));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_ignores_computed_attributes_in_state() {
        let mut held = attrs("eng");
        held.insert("id".into(), "grp_1".into());
        let prior = ManagedState::new("grp_1", held);
        let action = plan(&schema(), Some(&prior), Some(&attrs("eng"))).unwrap();
        assert!(!action.is_change());
    }

    #[test]
    fn test_plan_nothing() {
        assert!(plan(&schema(), None, None).is_none());
    }

    #[test]
    fn test_target_matches() {
        assert!(target_matches("user_group.eng", "user_group"));
        assert!(target_matches("user_group.eng", "user_group.eng"));
        assert!(!target_matches("user_group.eng", "user_group.ops"));
        assert!(!target_matches("user_group.eng", "user"));
        assert!(!target_matches("user_group.eng", "eng"));
    }

    #[test]
    fn test_filter_by_target_and_summary() {
        let mut plan = ExecutionPlan::new();
        let kind = "jumpcloud_user_group";
        plan.push("user_group.eng", kind, PlannedAction::Create { desired: attrs("eng") });
        plan.push("user_group.ops", kind, PlannedAction::Delete { id: "grp_2".into() });
        plan.push("user_group.qa", kind, PlannedAction::NoOp { id: "grp_3".into() });

        let summary = plan.summary();
        assert_eq!(summary.creates, 1);
        assert_eq!(summary.deletes, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.total(), 2);
        let changes: Vec<_> = plan.changes().map(|(e, c)| (e.address.as_str(), c)).collect();
        assert_eq!(
            changes,
            vec![
                ("user_group.eng", Change::Create(&attrs("eng"))),
                ("user_group.ops", Change::Delete),
            ]
        );

        let filtered = plan.clone().filter_by_target(Some("user_group.ops"));
        assert_eq!(filtered.entries.len(), 1);
        assert_eq!(filtered.entries[0].address, "user_group.ops");

        let all = plan.filter_by_target(Some("user_group"));
        assert_eq!(all.entries.len(), 3);
    }
}
