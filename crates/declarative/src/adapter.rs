//! Remote client contract consumed by the reconciler.
//!
//! This module provides the [`RemoteClient`] trait that concrete API clients
//! implement. With the `testing` feature it also provides `MockRemote`, an
//! in-memory implementation for tests.
//!
//! # Testing
//!
//! ```
//! use declarative::adapter::{Filter, MockRemote, RemoteClient};
//! use declarative::OpContext;
//! use serde_json::json;
//!
//! let mock = MockRemote::new().with_collection("usergroups", "user_group");
//! let ctx = OpContext::new();
//!
//! let created = mock.create(&ctx, "usergroups", &json!({"name": "eng"})).unwrap();
//! let found = mock
//!     .list_filtered(&ctx, "usergroups", &[Filter::eq("name", "eng")])
//!     .unwrap();
//! assert_eq!(found[0].id, created.id);
//! ```

use crate::context::OpContext;
use crate::types::RemoteEntity;
use serde_json::Value;
use std::fmt;

#[cfg(any(test, feature = "testing"))]
mod mock;
#[cfg(any(test, feature = "testing"))]
pub use mock::{MockCall, MockRemote};

/// Result type alias for adapter calls.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Errors reported by a remote client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The addressed entity does not exist.
    #[error("entity {0} not found")]
    NotFound(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with an error status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The API answered with something that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The operation context was cancelled before or during the call.
    #[error("request cancelled")]
    Cancelled,
}

/// Comparison operator of a list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
        }
    }
}

/// A `field op value` condition for filtered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Ne,
            value: value.into(),
        }
    }

    /// Check an entity against this filter.
    ///
    /// Scalar fields are compared by their string form. A missing field never
    /// equals anything.
    pub fn matches(&self, entity: &RemoteEntity) -> bool {
        let actual = if self.field == "id" {
            Some(entity.id.clone())
        } else {
            entity.field(&self.field).and_then(scalar_string)
        };
        let equal = actual.as_deref() == Some(self.value.as_str());
        match self.op {
            FilterOp::Eq => equal,
            FilterOp::Ne => !equal,
        }
    }
}

impl fmt::Display for Filter {
    /// Renders as `field:op:value`, the query syntax of the remote API.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.field, self.op.as_str(), self.value)
    }
}

/// String form of a scalar JSON value.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Remote API operations the reconciler needs.
///
/// `collection` names the remote collection the entity lives in (for the
/// JumpCloud API, `usergroups`). Implementations must be safe to share
/// across threads; the reconciler never mutates them.
pub trait RemoteClient: Send + Sync {
    /// List entities matching every filter.
    fn list_filtered(
        &self,
        ctx: &OpContext,
        collection: &str,
        filters: &[Filter],
    ) -> AdapterResult<Vec<RemoteEntity>>;

    /// Create an entity and return it as stored.
    fn create(&self, ctx: &OpContext, collection: &str, payload: &Value)
    -> AdapterResult<RemoteEntity>;

    /// Fetch an entity by id.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the id does not exist.
    fn get_by_id(&self, ctx: &OpContext, collection: &str, id: &str)
    -> AdapterResult<RemoteEntity>;

    /// Replace an entity's writable fields.
    fn update_by_id(
        &self,
        ctx: &OpContext,
        collection: &str,
        id: &str,
        payload: &Value,
    ) -> AdapterResult<RemoteEntity>;

    /// Delete an entity.
    fn delete_by_id(&self, ctx: &OpContext, collection: &str, id: &str) -> AdapterResult<()>;
}
