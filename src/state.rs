//! Local state file
//!
//! Records the remote id and last observed attributes of every managed
//! resource, keyed by address.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::{Attributes, ManagedState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// State of one managed resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Host-facing type name, e.g. `jumpcloud_user_group`
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ResourceRecord {
    pub fn to_managed(&self) -> ManagedState {
        ManagedState::new(self.id.clone(), self.attributes.clone())
    }
}

/// Everything jcgroup manages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    ///
    /// Written to a sibling temp file first, then renamed into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, &content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.save(path)
    }

    pub fn get(&self, address: &str) -> Option<&ResourceRecord> {
        self.resources.get(address)
    }

    /// Record the outcome of an operation
    ///
    /// `Some` stores the state under `address`; `None` drops the address.
    pub fn record(&mut self, address: &str, type_name: &str, state: Option<ManagedState>) {
        match state {
            Some(state) => {
                self.resources.insert(
                    address.to_string(),
                    ResourceRecord {
                        type_name: type_name.to_string(),
                        id: state.id,
                        attributes: state.attributes,
                    },
                );
            }
            None => {
                if self.resources.remove(address).is_some() {
                    log::debug!("Dropped {address} from state");
                }
            }
        }
    }

    /// Address already holding a given remote id
    pub fn address_of(&self, type_name: &str, id: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|(_, r)| r.type_name == type_name && r.id == id)
            .map(|(address, _)| address.as_str())
    }
}
