//! Plan display

use colored::Colorize;
use declarative::diff::describe_changes;
use declarative::{ExecutionPlan, PlanEntry, PlannedAction};

/// One-line description of what an entry will do
pub fn describe(entry: &PlanEntry) -> String {
    match &entry.action {
        PlannedAction::Create { desired } => desired
            .iter()
            .map(|(k, v)| format!("{k} = {v:?}"))
            .collect::<Vec<_>>()
            .join(", "),
        PlannedAction::Update { id, changes, .. } => {
            format!("{id}: {}", describe_changes(changes))
        }
        PlannedAction::Delete { id } => format!("(will delete {id})"),
        PlannedAction::NoOp { id } => id.clone(),
    }
}

/// Display a plan in a user-friendly format
pub fn display_plan(plan: &ExecutionPlan, show_unchanged: bool) {
    let summary = plan.summary();
    if !summary.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        if summary.unchanged > 0 {
            println!(
                "    {}",
                format!("{} resource(s) up to date", summary.unchanged).dimmed()
            );
        }
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    for entry in &plan.entries {
        if !entry.action.is_change() && !show_unchanged {
            continue;
        }
        let symbol = match entry.action {
            PlannedAction::Create { .. } => "+".green(),
            PlannedAction::Update { .. } => "~".yellow(),
            PlannedAction::Delete { .. } => "-".red(),
            PlannedAction::NoOp { .. } => "=".dimmed(),
        };
        println!(
            "│   {} {:<30} {}",
            symbol,
            entry.address,
            describe(entry).dimmed()
        );
    }

    println!("│");
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} to create, {} to update, {} to delete)",
        summary.total().to_string().bold(),
        summary.creates.to_string().green(),
        summary.updates.to_string().yellow(),
        summary.deletes.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Attributes, attribute_changes};

    fn named(name: &str) -> Attributes {
        let mut a = Attributes::new();
        a.insert("name".into(), name.into());
        a
    }

    fn entry(action: PlannedAction) -> PlanEntry {
        PlanEntry {
            address: "user_group.eng".into(),
            type_name: "jumpcloud_user_group".into(),
            action,
        }
    }

    #[test]
    fn test_describe_create() {
        let e = entry(PlannedAction::Create {
            desired: named("eng-team"),
        });
        assert_eq!(describe(&e), r#"name = "eng-team""#);
    }

    #[test]
    fn test_describe_update() {
        let e = entry(PlannedAction::Update {
            id: "grp_1".into(),
            desired: named("b"),
            changes: attribute_changes(&named("a"), &named("b")),
        });
        assert_eq!(describe(&e), r#"grp_1: name: "a" -> "b""#);
    }

    #[test]
    fn test_describe_delete() {
        let e = entry(PlannedAction::Delete { id: "grp_1".into() });
        assert_eq!(describe(&e), "(will delete grp_1)");
    }
}
