//! Configuration file loading
//!
//! ```toml
//! [provider]
//! api_key = "..."          # optional, falls back to API_KEY
//! organization_id = "..."  # optional, falls back to ORGANIZATION_ID
//! base_url = "..."         # optional
//!
//! [user_groups.eng]
//! name = "eng-team"
//! ```

use anyhow::{Context, Result, bail};
use declarative::{Attributes, ProviderConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Kind name of user groups, the first segment of their addresses
pub const USER_GROUP_KIND: &str = "user_group";

/// Parsed configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Desired user groups keyed by label
    #[serde(default)]
    pub user_groups: BTreeMap<String, Attributes>,
}

/// One declared resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredResource {
    /// Kind name, e.g. `user_group`
    pub kind: String,
    pub attributes: Attributes,
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "Config file not found: {} (create it or pass --config)",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;

        log::debug!(
            "Loaded {} user group(s) from {}",
            config.user_groups.len(),
            path.display()
        );
        Ok(config)
    }

    /// Load a config file, or use an empty config if there is none
    ///
    /// Commands that only need credentials work from the environment alone.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        for label in self.user_groups.keys() {
            validate_label(label)?;
        }
        Ok(())
    }

    /// Declared resources keyed by address (`<kind>.<label>`)
    pub fn desired(&self) -> BTreeMap<String, DesiredResource> {
        self.user_groups
            .iter()
            .map(|(label, attributes)| {
                (
                    address(USER_GROUP_KIND, label),
                    DesiredResource {
                        kind: USER_GROUP_KIND.to_string(),
                        attributes: attributes.clone(),
                    },
                )
            })
            .collect()
    }
}

/// Build a resource address
pub fn address(kind: &str, label: &str) -> String {
    format!("{kind}.{label}")
}

/// Split an address into kind and label
pub fn parse_address(address: &str) -> Result<(&str, &str)> {
    match address.split_once('.') {
        Some((kind, label)) if !kind.is_empty() => {
            validate_label(label)?;
            Ok((kind, label))
        }
        _ => bail!("Invalid address '{address}': expected <kind>.<label>, e.g. user_group.eng"),
    }
}

fn validate_label(label: &str) -> Result<()> {
    let valid = !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        bail!("Invalid label '{label}': use letters, digits, '_' or '-'");
    }
    Ok(())
}
