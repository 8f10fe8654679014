//! Credential resolution
//!
//! Each credential field is taken from explicit configuration first and
//! from the environment second. A field that ends up empty is a
//! configuration error; nothing is sent to the remote API in that case.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Default environment variable for the API key
pub const API_KEY_ENV: &str = "API_KEY";

/// Default environment variable for the organization id
pub const ORGANIZATION_ID_ENV: &str = "ORGANIZATION_ID";

/// Resolved API credentials
///
/// Both fields are secrets. The `Debug` output redacts them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    organization_id: String,
}

impl Credentials {
    /// Build credentials, rejecting empty values
    pub fn new(api_key: impl Into<String>, organization_id: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let organization_id = organization_id.into();
        if api_key.trim().is_empty() {
            return Err(Error::Configuration {
                field: "api_key".to_string(),
            });
        }
        if organization_id.trim().is_empty() {
            return Err(Error::Configuration {
                field: "organization_id".to_string(),
            });
        }
        Ok(Self {
            api_key,
            organization_id,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("organization_id", &"<redacted>")
            .finish()
    }
}

/// Source of environment variables
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolves credentials from configuration with environment fallback
#[derive(Debug, Clone)]
pub struct CredentialResolver<E = ProcessEnv> {
    env: E,
    api_key_var: String,
    organization_id_var: String,
}

impl CredentialResolver<ProcessEnv> {
    /// Resolver reading the process environment with the default variable names
    pub fn new() -> Self {
        Self::with_env(ProcessEnv)
    }
}

impl Default for CredentialResolver<ProcessEnv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EnvSource> CredentialResolver<E> {
    /// Resolver reading from a custom environment source
    pub fn with_env(env: E) -> Self {
        Self {
            env,
            api_key_var: API_KEY_ENV.to_string(),
            organization_id_var: ORGANIZATION_ID_ENV.to_string(),
        }
    }

    /// Override the environment variable names
    pub fn with_var_names(
        mut self,
        api_key_var: impl Into<String>,
        organization_id_var: impl Into<String>,
    ) -> Self {
        self.api_key_var = api_key_var.into();
        self.organization_id_var = organization_id_var.into();
        self
    }

    /// Compute effective credentials
    ///
    /// A configured value wins when present and non-empty; otherwise the
    /// environment variable is used. Fails with [`Error::Configuration`]
    /// naming the first field that has no usable value.
    pub fn resolve(
        &self,
        configured_api_key: Option<&str>,
        configured_organization_id: Option<&str>,
    ) -> Result<Credentials> {
        let api_key = self.resolve_field("api_key", configured_api_key, &self.api_key_var)?;
        let organization_id = self.resolve_field(
            "organization_id",
            configured_organization_id,
            &self.organization_id_var,
        )?;
        Credentials::new(api_key, organization_id)
    }

    fn resolve_field(&self, field: &str, configured: Option<&str>, var: &str) -> Result<String> {
        if let Some(value) = configured.filter(|v| !v.trim().is_empty()) {
            log::debug!("using configured value for {field}");
            return Ok(value.to_string());
        }

        match self.env.var(var).filter(|v| !v.trim().is_empty()) {
            Some(value) => {
                log::debug!("using {var} from environment for {field}");
                Ok(value)
            }
            None => Err(Error::Configuration {
                field: field.to_string(),
            }),
        }
    }
}
