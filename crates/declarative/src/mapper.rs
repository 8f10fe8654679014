//! Entity mapping between remote entities and local state
//!
//! The mapper is the only place that knows how remote field names line up
//! with local attribute names.

use crate::adapter::scalar_string;
use crate::types::{Attributes, ManagedState, RemoteEntity};
use serde_json::{Map, Value};
use std::fmt;

/// Errors raised while mapping a remote entity into local state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// The entity carries no id
    #[error("remote entity has no id")]
    MissingId,

    /// A required field is absent or null
    #[error("remote entity {id} is missing field `{field}`")]
    MissingField { id: String, field: String },

    /// A field holds an array or object where a scalar was expected
    #[error("remote entity {id} has a non-scalar value in field `{field}`")]
    UnsupportedValue { id: String, field: String },
}

/// Bidirectional conversion between local attributes and remote entities
pub trait EntityMapper: Send + Sync + fmt::Debug {
    /// Build the request body for create and update calls
    fn to_payload(&self, attributes: &Attributes) -> Value;

    /// Turn a remote entity into local state
    fn to_state(&self, entity: &RemoteEntity) -> Result<ManagedState, MappingError>;
}

/// One attribute-to-field correspondence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Local attribute name
    pub attribute: String,
    /// Remote field name
    pub remote: String,
    /// Whether the remote entity must carry the field
    pub required: bool,
}

/// Table-driven [`EntityMapper`]
///
/// # Example
///
/// ```
/// use declarative::mapper::{EntityMapper, FieldMapper};
/// use declarative::{Attributes, RemoteEntity};
/// use serde_json::json;
///
/// let mapper = FieldMapper::new().field("name", "name");
///
/// let mut desired = Attributes::new();
/// desired.insert("name".into(), "eng-team".into());
/// assert_eq!(mapper.to_payload(&desired), json!({"name": "eng-team"}));
///
/// let entity = RemoteEntity::from_json(json!({"id": "grp_1", "name": "eng-team"})).unwrap();
/// let state = mapper.to_state(&entity).unwrap();
/// assert_eq!(state.id, "grp_1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldMapper {
    fields: Vec<FieldMapping>,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a required attribute to a remote field
    pub fn field(mut self, attribute: impl Into<String>, remote: impl Into<String>) -> Self {
        self.fields.push(FieldMapping {
            attribute: attribute.into(),
            remote: remote.into(),
            required: true,
        });
        self
    }

    /// Map an attribute that the remote may omit
    pub fn optional_field(
        mut self,
        attribute: impl Into<String>,
        remote: impl Into<String>,
    ) -> Self {
        self.fields.push(FieldMapping {
            attribute: attribute.into(),
            remote: remote.into(),
            required: false,
        });
        self
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }
}

impl EntityMapper for FieldMapper {
    fn to_payload(&self, attributes: &Attributes) -> Value {
        let mut body = Map::new();
        for mapping in &self.fields {
            if let Some(value) = attributes.get(&mapping.attribute) {
                body.insert(mapping.remote.clone(), Value::String(value.clone()));
            }
        }
        Value::Object(body)
    }

    fn to_state(&self, entity: &RemoteEntity) -> Result<ManagedState, MappingError> {
        if entity.id.is_empty() {
            return Err(MappingError::MissingId);
        }

        let mut attributes = Attributes::new();
        for mapping in &self.fields {
            match entity.field(&mapping.remote) {
                None | Some(Value::Null) => {
                    if mapping.required {
                        return Err(MappingError::MissingField {
                            id: entity.id.clone(),
                            field: mapping.remote.clone(),
                        });
                    }
                }
                Some(value) => {
                    let value = scalar_string(value).ok_or_else(|| {
                        MappingError::UnsupportedValue {
                            id: entity.id.clone(),
                            field: mapping.remote.clone(),
                        }
                    })?;
                    attributes.insert(mapping.attribute.clone(), value);
                }
            }
        }

        Ok(ManagedState::new(entity.id.clone(), attributes))
    }
}
