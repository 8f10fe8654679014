//! # Declarative
//!
//! Declarative lifecycle management for remote directory objects.
//!
//! This crate provides the core that converges remote objects (JumpCloud
//! user groups, in practice) to a declared configuration: create, read,
//! update, delete and import, plus read-only lookups by name.
//!
//! ## Core Concepts
//!
//! - **RemoteClient**: The remote API seen as a collection store
//! - **ResourceKind**: Data describing one kind of object (collection, schemas, mapping)
//! - **Reconciler**: The lifecycle state machine for one kind
//! - **DataSourceReader**: Name lookups that must resolve to exactly one object
//! - **Provider**: The orchestrator boundary tying it all together
//! - **Diagnostics**: Ordered errors and warnings returned by every operation
//!
//! ## Example
//!
//! ```
//! use declarative::adapter::MockRemote;
//! use declarative::{Attributes, OpContext, Provider};
//! use std::sync::Arc;
//!
//! let remote = MockRemote::new().with_collection("usergroups", "user_group");
//! let provider = Provider::jumpcloud().with_client(Arc::new(remote));
//! let ctx = OpContext::new();
//!
//! let mut desired = Attributes::new();
//! desired.insert("name".into(), "eng-team".into());
//!
//! let created = provider.create(&ctx, "jumpcloud_user_group", &desired);
//! assert!(created.is_success());
//!
//! let state = created.state.unwrap();
//! let read = provider.read(&ctx, "jumpcloud_user_group", &state);
//! assert_eq!(read.state.unwrap().name(), Some("eng-team"));
//! ```
//!
//! ## Seams
//!
//! - [`RemoteClient`]: implemented by the HTTP client, and by `adapter::MockRemote`
//!   under the `testing` feature
//! - [`EntityMapper`]: converts between remote entities and local state
//! - [`EnvSource`]: where credential fallbacks are read from
//!
//! The configured client is passed by handle into every component when the
//! provider is configured; there is no global client.

pub mod adapter;
pub mod context;
pub mod credentials;
pub mod data_source;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod mapper;
pub mod planner;
pub mod provider;
pub mod reconciler;
pub mod resource;
pub mod schema;
pub mod types;

pub use adapter::{AdapterError, AdapterResult, Filter, RemoteClient};
pub use context::{CancelHandle, OpContext};
pub use credentials::{CredentialResolver, Credentials, EnvSource, ProcessEnv};
pub use data_source::DataSourceReader;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use diff::{AttributeChange, attribute_changes};
pub use error::{Error, Result};
pub use mapper::{EntityMapper, FieldMapper, MappingError};
pub use planner::{Change, ExecutionPlan, PlanEntry, PlanSummary, PlannedAction, target_matches};
pub use provider::{PROVIDER_TYPE_NAME, Provider, ProviderConfig};
pub use reconciler::{Outcome, Reconciler, Response};
pub use resource::ResourceKind;
pub use schema::{Attribute, ProviderSchema, Schema};
pub use types::{Attributes, Lifecycle, ManagedState, Operation, RemoteEntity};
