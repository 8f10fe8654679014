//! Error taxonomy for reconciliation operations.
//!
//! Every error can be rendered as a [`Diagnostic`] with a short summary and
//! the full underlying detail, which is how operations report failures to
//! the host.

use crate::adapter::AdapterError;
use crate::diagnostics::Diagnostic;
use crate::mapper::MappingError;
use crate::types::Operation;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A required provider setting has no usable value.
    #[error("missing required configuration value `{field}`")]
    Configuration {
        /// Name of the configuration field.
        field: String,
    },

    /// The remote call failed. The message is the adapter's, verbatim.
    #[error("{operation} request failed: {message}")]
    Client {
        /// Operation that issued the call.
        operation: Operation,
        /// Adapter error message.
        message: String,
    },

    /// An expected remote entity does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Description of what was looked for.
        what: String,
    },

    /// A managed resource vanished on the remote side.
    #[error("resource {id} no longer exists upstream")]
    RemovedUpstream {
        /// Id held in local state.
        id: String,
    },

    /// A lookup matched more than one remote entity.
    #[error("lookup for {name:?} matched {count} entities")]
    Ambiguous {
        /// Lookup key.
        name: String,
        /// Number of matches.
        count: usize,
    },

    /// The operation context was cancelled or its deadline passed.
    #[error("operation cancelled")]
    Cancelled,

    /// The remote identifier changed under a managed resource.
    #[error("remote returned id {returned} for resource {held}")]
    IdentifierChanged {
        /// Id held in local state.
        held: String,
        /// Id reported by the remote.
        returned: String,
    },

    /// A remote entity could not be mapped into local state.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A create went through remotely but the response could not be mapped.
    ///
    /// The object exists and is unmanaged; `id` is what an import needs.
    #[error("{kind} {id} was created but its response could not be read: {source}")]
    CreatedUnrecorded {
        /// Local kind name.
        kind: String,
        /// Id the remote assigned.
        id: String,
        /// Why mapping failed.
        source: MappingError,
    },

    /// Desired attributes do not satisfy the resource schema.
    #[error("invalid attributes: {0}")]
    Validation(String),

    /// The requested resource or data source type is not known.
    #[error("unknown type {0:?}")]
    UnknownType(String),

    /// An operation was requested before the provider was configured.
    #[error("provider is not configured")]
    Unconfigured,
}

impl Error {
    /// Convert an adapter failure for the given operation.
    ///
    /// `NotFound` from the adapter is kept generic here; callers that know
    /// the entity was managed turn it into [`Error::RemovedUpstream`].
    pub fn from_adapter(operation: Operation, err: AdapterError) -> Self {
        match err {
            AdapterError::Cancelled => Self::Cancelled,
            other => Self::Client {
                operation,
                message: other.to_string(),
            },
        }
    }

    /// Short headline used as the diagnostic summary.
    pub fn summary(&self) -> String {
        match self {
            Self::Configuration { .. } => "Missing Provider Configuration".to_string(),
            Self::Client { operation, .. } => format!("Client Error ({operation})"),
            Self::NotFound { .. } => "Not Found".to_string(),
            Self::RemovedUpstream { .. } => "Resource Removed Upstream".to_string(),
            Self::Ambiguous { .. } => "Ambiguous Lookup Result".to_string(),
            Self::Cancelled => "Operation Cancelled".to_string(),
            Self::IdentifierChanged { .. } => "Unexpected Identifier Change".to_string(),
            Self::Mapping(_) => "Unexpected Remote Response".to_string(),
            Self::CreatedUnrecorded { .. } => "Created Resource Not Recorded".to_string(),
            Self::Validation(_) => "Invalid Configuration".to_string(),
            Self::UnknownType(_) => "Unknown Type".to_string(),
            Self::Unconfigured => "Unconfigured Provider".to_string(),
        }
    }

    /// Render this error as an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let detail = match self {
            Self::Configuration { field } => format!(
                "The provider requires `{field}`. Set it in the provider configuration \
                 or through its environment variable."
            ),
            Self::Ambiguous { name, count } => format!(
                "{count} entities are named {name:?}. Refer to the intended one by id instead."
            ),
            Self::CreatedUnrecorded { kind, id, source } => format!(
                "{kind} {id} now exists remotely but is not in state: {source}. \
                 Import id {id} once the cause is resolved, or delete it remotely."
            ),
            Self::Unconfigured => "The provider must be configured with credentials before \
                                   resources can be managed."
                .to_string(),
            other => other.to_string(),
        };
        Diagnostic::error(self.summary(), detail)
    }

    /// Whether this error means the remote entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::RemovedUpstream { .. })
    }
}
