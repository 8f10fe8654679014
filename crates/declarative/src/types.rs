//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute values of a resource, keyed by attribute name
pub type Attributes = BTreeMap<String, String>;

/// Locally held state of a managed resource
///
/// `id` is assigned by the remote system and is never synthesized or
/// rewritten locally. Everything else lives in `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedState {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ManagedState {
    /// Create a state from an id and its attributes
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Minimal state holding only an id, as produced by an import request
    pub fn from_id(id: impl Into<String>) -> Self {
        Self::new(id, Attributes::new())
    }

    /// Get an attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Convenience accessor for the `name` attribute
    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }
}

/// An object as returned by the remote API
///
/// Owned by the adapter boundary. Only an [`EntityMapper`](crate::mapper::EntityMapper)
/// turns it into a [`ManagedState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntity {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RemoteEntity {
    /// Create an entity from an id and its fields
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build an entity from a JSON object carrying an `id` (or `_id`) field
    ///
    /// Returns `None` if the value is not an object or has no string id.
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let id = fields
            .get("id")
            .or_else(|| fields.get("_id"))
            .and_then(Value::as_str)?
            .to_string();
        Some(Self { id, fields })
    }

    /// Get a raw field value
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a field value if it is a string
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }
}

/// Lifecycle operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
    Lookup,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
            Self::Lookup => "lookup",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of a managed resource, as seen by the reconciler
///
/// ```text
/// Unmanaged -> Creating -> Managed -> Updating -> Managed -> Deleting -> Unmanaged
/// Unmanaged -> Importing -> Managed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Unmanaged,
    Creating,
    Managed,
    Updating,
    Deleting,
    Importing,
}

impl Lifecycle {
    /// Enter the transitional phase for an operation
    ///
    /// Returns `None` if the operation is not valid from the current phase.
    pub fn begin(self, operation: Operation) -> Option<Self> {
        match (self, operation) {
            (Self::Unmanaged, Operation::Create) => Some(Self::Creating),
            (Self::Unmanaged, Operation::Import) => Some(Self::Importing),
            (Self::Managed, Operation::Read) => Some(Self::Managed),
            (Self::Managed, Operation::Update) => Some(Self::Updating),
            (Self::Managed, Operation::Delete) => Some(Self::Deleting),
            _ => None,
        }
    }

    /// Leave a transitional phase
    pub fn settle(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (Self::Creating | Self::Importing, true) => Self::Managed,
            (Self::Creating | Self::Importing, false) => Self::Unmanaged,
            (Self::Updating, _) => Self::Managed,
            (Self::Deleting, true) => Self::Unmanaged,
            (Self::Deleting, false) => Self::Managed,
            (other, _) => other,
        }
    }

    /// Whether a resource in this phase has state worth keeping
    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Managed)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unmanaged => "unmanaged",
            Self::Creating => "creating",
            Self::Managed => "managed",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
            Self::Importing => "importing",
        };
        f.write_str(s)
    }
}
