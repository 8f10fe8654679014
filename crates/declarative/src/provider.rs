//! Provider - the boundary between a host orchestrator and the reconcilers
//!
//! A host describes the schema, configures the provider once with
//! credentials, then issues create/read/update/delete/import requests by
//! type name. Configuring builds one [`Reconciler`] and one
//! [`DataSourceReader`] per resource kind, all sharing the same client
//! handle. Requests made before a successful configure fail with an
//! [`Error::Unconfigured`] diagnostic.

use crate::adapter::{AdapterResult, RemoteClient};
use crate::context::OpContext;
use crate::credentials::{CredentialResolver, Credentials, EnvSource};
use crate::data_source::DataSourceReader;
use crate::diagnostics::Diagnostics;
use crate::error::Error;
use crate::planner::{self, PlannedAction};
use crate::reconciler::{Outcome, Reconciler, Response};
use crate::resource::ResourceKind;
use crate::schema::{Attribute, ProviderSchema, Schema};
use crate::types::{Attributes, Lifecycle, ManagedState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Provider type name used as the type-name prefix
pub const PROVIDER_TYPE_NAME: &str = "jumpcloud";

/// Provider-level configuration as written by the user
///
/// Credential fields left unset (or empty) fall back to the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

struct Configured {
    reconcilers: BTreeMap<String, Reconciler>,
    readers: BTreeMap<String, DataSourceReader>,
}

/// Declarative provider over a set of resource kinds
pub struct Provider {
    type_name: String,
    version: String,
    kinds: Vec<ResourceKind>,
    configured: Option<Configured>,
}

impl Provider {
    pub fn new(type_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            version: version.into(),
            kinds: Vec::new(),
            configured: None,
        }
    }

    /// The JumpCloud provider with its user group kind
    pub fn jumpcloud() -> Self {
        Self::new(PROVIDER_TYPE_NAME, env!("CARGO_PKG_VERSION"))
            .with_kind(ResourceKind::user_group())
    }

    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Kind registered under a host-facing type name
    pub fn kind(&self, type_name: &str) -> Option<&ResourceKind> {
        self.kinds
            .iter()
            .find(|k| k.type_name(&self.type_name) == type_name)
    }

    /// Host-facing type names of every registered kind
    pub fn type_names(&self) -> Vec<String> {
        self.kinds
            .iter()
            .map(|k| k.type_name(&self.type_name))
            .collect()
    }

    /// Schema of the provider block, every resource and every data source
    pub fn describe_schema(&self) -> ProviderSchema {
        let provider = Schema::new("Manage JumpCloud directory objects")
            .with_attribute(
                "api_key",
                Attribute::optional().sensitive().with_description(
                    "JumpCloud API key. Falls back to the API_KEY environment variable.",
                ),
            )
            .with_attribute(
                "organization_id",
                Attribute::optional().sensitive().with_description(
                    "JumpCloud organization ID. \
                     Falls back to the ORGANIZATION_ID environment variable.",
                ),
            )
            .with_attribute(
                "base_url",
                Attribute::optional().with_description("Base URL of the JumpCloud v2 API"),
            );

        let mut schema = ProviderSchema {
            type_name: self.type_name.clone(),
            version: self.version.clone(),
            provider,
            ..ProviderSchema::default()
        };
        for kind in &self.kinds {
            let name = kind.type_name(&self.type_name);
            schema
                .resources
                .insert(name.clone(), kind.resource_schema().clone());
            schema
                .data_sources
                .insert(name, kind.data_source_schema().clone());
        }
        schema
    }

    /// Resolve credentials and connect
    ///
    /// `connect` builds the remote client from the resolved credentials;
    /// it is only called when resolution succeeds, so a configuration error
    /// never reaches the network. On error the provider stays unconfigured.
    pub fn configure<E, F>(
        &mut self,
        config: &ProviderConfig,
        resolver: &CredentialResolver<E>,
        connect: F,
    ) -> Diagnostics
    where
        E: EnvSource,
        F: FnOnce(&Credentials, &ProviderConfig) -> AdapterResult<Arc<dyn RemoteClient>>,
    {
        let mut diagnostics = Diagnostics::new();

        let credentials = match resolver.resolve(
            config.api_key.as_deref(),
            config.organization_id.as_deref(),
        ) {
            Ok(credentials) => credentials,
            Err(err) => {
                diagnostics.record(err.to_diagnostic());
                return diagnostics;
            }
        };

        match connect(&credentials, config) {
            Ok(client) => {
                self.attach(client);
                log::info!("configured {} provider", self.type_name);
            }
            Err(err) => diagnostics.error("Unable to Create API Client", err.to_string()),
        }
        diagnostics
    }

    /// Use an already built client, skipping credential resolution
    pub fn with_client(mut self, client: Arc<dyn RemoteClient>) -> Self {
        self.attach(client);
        self
    }

    fn attach(&mut self, client: Arc<dyn RemoteClient>) {
        let mut reconcilers = BTreeMap::new();
        let mut readers = BTreeMap::new();
        for kind in &self.kinds {
            let name = kind.type_name(&self.type_name);
            reconcilers.insert(name.clone(), Reconciler::new(kind.clone(), Arc::clone(&client)));
            readers.insert(name, DataSourceReader::new(kind.clone(), Arc::clone(&client)));
        }
        self.configured = Some(Configured {
            reconcilers,
            readers,
        });
    }

    pub fn is_configured(&self) -> bool {
        self.configured.is_some()
    }

    fn reconciler(&self, type_name: &str) -> Result<&Reconciler, Error> {
        let configured = self.configured.as_ref().ok_or(Error::Unconfigured)?;
        configured
            .reconcilers
            .get(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))
    }

    fn reader(&self, type_name: &str) -> Result<&DataSourceReader, Error> {
        let configured = self.configured.as_ref().ok_or(Error::Unconfigured)?;
        configured
            .readers
            .get(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))
    }

    pub fn create(&self, ctx: &OpContext, type_name: &str, desired: &Attributes) -> Response {
        match self.reconciler(type_name) {
            Ok(r) => r.create(ctx, desired),
            Err(err) => rejected(&err, None),
        }
    }

    pub fn read(&self, ctx: &OpContext, type_name: &str, current: &ManagedState) -> Response {
        match self.reconciler(type_name) {
            Ok(r) => r.read(ctx, current),
            Err(err) => rejected(&err, Some(current)),
        }
    }

    pub fn update(
        &self,
        ctx: &OpContext,
        type_name: &str,
        current: &ManagedState,
        desired: &Attributes,
    ) -> Response {
        match self.reconciler(type_name) {
            Ok(r) => r.update(ctx, current, desired),
            Err(err) => rejected(&err, Some(current)),
        }
    }

    pub fn delete(&self, ctx: &OpContext, type_name: &str, current: &ManagedState) -> Response {
        match self.reconciler(type_name) {
            Ok(r) => r.delete(ctx, current),
            Err(err) => rejected(&err, Some(current)),
        }
    }

    pub fn import_resource(&self, ctx: &OpContext, type_name: &str, id: &str) -> Response {
        match self.reconciler(type_name) {
            Ok(r) => r.import(ctx, id),
            Err(err) => rejected(&err, None),
        }
    }

    pub fn read_data_source(
        &self,
        ctx: &OpContext,
        type_name: &str,
        query: &Attributes,
    ) -> Response {
        match self.reader(type_name) {
            Ok(r) => r.read(ctx, query),
            Err(err) => rejected(&err, None),
        }
    }

    /// Plan one resource; needs no remote access
    pub fn plan(
        &self,
        type_name: &str,
        prior: Option<&ManagedState>,
        desired: Option<&Attributes>,
    ) -> Result<Option<PlannedAction>, Error> {
        let kind = self
            .kind(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;
        Ok(planner::plan(kind.resource_schema(), prior, desired))
    }
}

fn rejected(err: &Error, prior: Option<&ManagedState>) -> Response {
    Response {
        outcome: Outcome::Failed,
        state: prior.cloned(),
        lifecycle: if prior.is_some() {
            Lifecycle::Managed
        } else {
            Lifecycle::Unmanaged
        },
        diagnostics: err.to_diagnostic().into(),
    }
}
