//! Attribute-level diff computation

use crate::types::Attributes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single attribute that differs between two attribute sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub name: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl AttributeChange {
    pub fn is_addition(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    pub fn is_removal(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.name,
            show_value(self.before.as_deref()),
            show_value(self.after.as_deref())
        )
    }
}

fn show_value(value: Option<&str>) -> String {
    value.map_or_else(|| "(unset)".to_string(), |s| format!("{s:?}"))
}

/// Compute changed attributes, ordered by name
pub fn attribute_changes(before: &Attributes, after: &Attributes) -> Vec<AttributeChange> {
    let mut names: Vec<&String> = before.keys().chain(after.keys()).collect();
    names.sort();
    names.dedup();

    names
        .into_iter()
        .filter_map(|name| {
            let b = before.get(name);
            let a = after.get(name);
            (b != a).then(|| AttributeChange {
                name: name.clone(),
                before: b.cloned(),
                after: a.cloned(),
            })
        })
        .collect()
}

/// Render changes as a single comma separated line
pub fn describe_changes(changes: &[AttributeChange]) -> String {
    changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
