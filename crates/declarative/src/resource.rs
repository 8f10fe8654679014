//! Resource kinds for declarative state management
//!
//! A [`ResourceKind`] describes one kind of remote object as data: where it
//! lives remotely, how its fields map to local attributes, and what its
//! schemas look like. The reconciler and data source reader are generic
//! over it, so adding a kind is a matter of describing it.

use crate::mapper::{EntityMapper, FieldMapper};
use crate::schema::{Attribute, Schema};
use std::fmt;
use std::sync::Arc;

/// Description of one kind of managed remote object
#[derive(Clone)]
pub struct ResourceKind {
    name: String,
    collection: String,
    remote_type: Option<String>,
    lookup_attribute: String,
    resource_schema: Schema,
    data_source_schema: Schema,
    mapper: Arc<dyn EntityMapper>,
}

impl ResourceKind {
    /// Create a kind
    ///
    /// * `name` - Local kind name, e.g. `user_group`
    /// * `collection` - Remote collection the objects live in
    /// * `mapper` - Converts between remote entities and local state
    pub fn new(
        name: impl Into<String>,
        collection: impl Into<String>,
        mapper: Arc<dyn EntityMapper>,
    ) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            remote_type: None,
            lookup_attribute: "name".to_string(),
            resource_schema: Schema::default(),
            data_source_schema: Schema::default(),
            mapper,
        }
    }

    /// Value of the remote `type` field; lookups filter on it
    pub fn with_remote_type(mut self, remote_type: impl Into<String>) -> Self {
        self.remote_type = Some(remote_type.into());
        self
    }

    /// Attribute used as the natural lookup key (default `name`)
    pub fn with_lookup_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.lookup_attribute = attribute.into();
        self
    }

    pub fn with_resource_schema(mut self, schema: Schema) -> Self {
        self.resource_schema = schema;
        self
    }

    pub fn with_data_source_schema(mut self, schema: Schema) -> Self {
        self.data_source_schema = schema;
        self
    }

    /// The JumpCloud user group
    pub fn user_group() -> Self {
        let mapper = FieldMapper::new().field("name", "name");

        Self::new("user_group", "usergroups", Arc::new(mapper))
            .with_remote_type("user_group")
            .with_resource_schema(
                Schema::new("JumpCloud user group")
                    .with_attribute(
                        "id",
                        Attribute::computed()
                            .preserve_on_refresh()
                            .with_description("User group ID"),
                    )
                    .with_attribute(
                        "name",
                        Attribute::required().with_description("User group name"),
                    ),
            )
            .with_data_source_schema(
                Schema::new("Look up a JumpCloud user group by name")
                    .with_attribute(
                        "id",
                        Attribute::computed().with_description("User group ID"),
                    )
                    .with_attribute(
                        "name",
                        Attribute::required().with_description("User group name"),
                    ),
            )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn remote_type(&self) -> Option<&str> {
        self.remote_type.as_deref()
    }

    pub fn lookup_attribute(&self) -> &str {
        &self.lookup_attribute
    }

    pub fn resource_schema(&self) -> &Schema {
        &self.resource_schema
    }

    pub fn data_source_schema(&self) -> &Schema {
        &self.data_source_schema
    }

    pub fn mapper(&self) -> &dyn EntityMapper {
        self.mapper.as_ref()
    }

    /// Host-facing type name, e.g. `jumpcloud_user_group`
    pub fn type_name(&self, provider: &str) -> String {
        format!("{provider}_{}", self.name)
    }
}

impl fmt::Debug for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceKind")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .field("remote_type", &self.remote_type)
            .finish_non_exhaustive()
    }
}
