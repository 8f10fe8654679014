//! Read-only lookup of existing remote objects by natural key

use crate::adapter::{Filter, RemoteClient};
use crate::context::OpContext;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::reconciler::{Outcome, Response};
use crate::resource::ResourceKind;
use crate::types::{Attributes, Lifecycle, ManagedState, Operation};
use std::sync::Arc;

/// Resolves names to remote objects without managing them
pub struct DataSourceReader {
    kind: ResourceKind,
    client: Arc<dyn RemoteClient>,
}

impl DataSourceReader {
    pub fn new(kind: ResourceKind, client: Arc<dyn RemoteClient>) -> Self {
        Self { kind, client }
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Find the single object whose lookup attribute equals `name`
    ///
    /// Zero matches is [`Error::NotFound`]. More than one is
    /// [`Error::Ambiguous`]; the reader never picks one arbitrarily.
    pub fn lookup_by_name(&self, ctx: &OpContext, name: &str) -> Result<ManagedState> {
        ctx.check()?;

        let mut filters = vec![Filter::eq(self.kind.lookup_attribute(), name)];
        if let Some(remote_type) = self.kind.remote_type() {
            filters.push(Filter::eq("type", remote_type));
        }
        log::debug!(
            "looking up {} with filters [{}]",
            self.kind.name(),
            filters.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );

        let mut matches = self
            .client
            .list_filtered(ctx, self.kind.collection(), &filters)
            .map_err(|e| Error::from_adapter(Operation::Lookup, e))?;

        match matches.len() {
            0 => Err(Error::NotFound {
                what: format!("{} named {name:?}", self.kind.name()),
            }),
            1 => {
                let entity = matches.remove(0);
                log::trace!("{} {name:?} resolved to {}", self.kind.name(), entity.id);
                Ok(self.kind.mapper().to_state(&entity)?)
            }
            count => Err(Error::Ambiguous {
                name: name.to_string(),
                count,
            }),
        }
    }

    /// Data source read: validate the query attributes and look up
    pub fn read(&self, ctx: &OpContext, query: &Attributes) -> Response {
        let mut diagnostics = self.kind.data_source_schema().validate(query);
        let name = query
            .get(self.kind.lookup_attribute())
            .map(String::as_str)
            .unwrap_or_default();

        if !diagnostics.has_error() {
            match self.lookup_by_name(ctx, name) {
                Ok(state) => {
                    return Response {
                        outcome: Outcome::Refreshed,
                        state: Some(state),
                        lifecycle: Lifecycle::Unmanaged,
                        diagnostics,
                    };
                }
                Err(err) => diagnostics.record(err.to_diagnostic()),
            }
        }

        failed(diagnostics)
    }
}

fn failed(diagnostics: Diagnostics) -> Response {
    Response {
        outcome: Outcome::Failed,
        state: None,
        lifecycle: Lifecycle::Unmanaged,
        diagnostics,
    }
}
