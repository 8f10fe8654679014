//! Schema description for providers, resources and data sources
//!
//! Schemas describe attributes to the host and validate desired
//! configuration before any remote call is made.

use crate::diagnostics::Diagnostics;
use crate::types::Attributes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Description of one string attribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub description: String,
    /// Must be supplied by configuration
    #[serde(default)]
    pub required: bool,
    /// Set by the remote system, never by configuration
    #[serde(default)]
    pub computed: bool,
    /// Secret value, hidden from output
    #[serde(default)]
    pub sensitive: bool,
    /// Known value is kept across plans instead of being marked unknown
    #[serde(default)]
    pub preserve_on_refresh: bool,
}

impl Attribute {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn preserve_on_refresh(mut self) -> Self {
        self.preserve_on_refresh = true;
        self
    }

    /// Whether configuration may set this attribute
    pub fn is_configurable(&self) -> bool {
        !self.computed
    }
}

/// Schema of a resource, data source or provider configuration block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Names of attributes configuration may set
    pub fn configurable(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.is_configurable())
            .map(|(name, _)| name.as_str())
    }

    /// Keep only configurable attributes
    pub fn configurable_subset(&self, attributes: &Attributes) -> Attributes {
        attributes
            .iter()
            .filter(|(name, _)| self.attribute(name).is_some_and(Attribute::is_configurable))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Check desired attributes against the schema
    ///
    /// Unknown attributes, attempts to set computed attributes, and missing
    /// or empty required attributes are all reported as errors.
    pub fn validate(&self, attributes: &Attributes) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        for name in attributes.keys() {
            match self.attribute(name) {
                None => diagnostics.error(
                    "Unsupported Attribute",
                    format!("An attribute named {name:?} is not expected here."),
                ),
                Some(attr) if attr.computed => diagnostics.error(
                    "Invalid Configuration",
                    format!(
                        "Attribute {name:?} is set by the remote system and cannot be configured."
                    ),
                ),
                Some(_) => {}
            }
        }

        for (name, attr) in &self.attributes {
            if !attr.required {
                continue;
            }
            let missing = attributes.get(name).is_none_or(|v| v.trim().is_empty());
            if missing {
                diagnostics.error(
                    "Missing Required Attribute",
                    format!("The attribute {name:?} is required and must not be empty."),
                );
            }
        }

        diagnostics
    }
}

/// Full schema a provider reports to its host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSchema {
    /// Provider type name, e.g. `jumpcloud`
    pub type_name: String,
    pub version: String,
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
}
