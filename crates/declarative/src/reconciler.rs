//! Resource reconciler - the create/read/update/delete/import state machine
//!
//! Every operation runs against the shared, read-only [`RemoteClient`]
//! handle and returns a [`Response`]: the resulting state (if any), the
//! lifecycle phase the resource settled in, and the diagnostics produced
//! along the way. A response carrying an error diagnostic is a failed
//! operation, whatever state it also carries.
//!
//! On failure the prior state is handed back untouched so the caller can
//! keep it. The one gap is Update: if the update call itself fails, the
//! remote side may or may not have applied it. No rollback is attempted;
//! the response carries a warning saying so.

use crate::adapter::{AdapterError, RemoteClient};
use crate::context::OpContext;
use crate::diagnostics::Diagnostics;
use crate::diff::{attribute_changes, describe_changes};
use crate::error::Error;
use crate::resource::ResourceKind;
use crate::types::{Attributes, Lifecycle, ManagedState, Operation};
use std::sync::Arc;

/// How an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Refreshed,
    Updated,
    Deleted,
    Imported,
    /// The managed object no longer exists remotely; drop it from state
    RemovedUpstream,
    Failed,
}

/// Result of a lifecycle operation
#[derive(Debug, Clone)]
pub struct Response {
    pub outcome: Outcome,
    /// State to keep after the operation; `None` means keep nothing
    pub state: Option<ManagedState>,
    pub lifecycle: Lifecycle,
    pub diagnostics: Diagnostics,
}

impl Response {
    fn succeeded(
        outcome: Outcome,
        state: Option<ManagedState>,
        lifecycle: Lifecycle,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            outcome,
            state,
            lifecycle,
            diagnostics,
        }
    }

    fn failed(phase: Lifecycle, prior: Option<&ManagedState>, diagnostics: Diagnostics) -> Self {
        Self {
            outcome: Outcome::Failed,
            state: prior.cloned(),
            lifecycle: phase.settle(false),
            diagnostics,
        }
    }

    /// Whether the operation succeeded (no error diagnostics)
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_error()
    }

    pub fn is_removed_upstream(&self) -> bool {
        self.outcome == Outcome::RemovedUpstream
    }
}

/// Phase a resource enters when `operation` starts
fn enter(operation: Operation) -> Lifecycle {
    let from = match operation {
        Operation::Create | Operation::Import => Lifecycle::Unmanaged,
        _ => Lifecycle::Managed,
    };
    from.begin(operation).unwrap_or(from)
}

/// Drives the lifecycle of one resource kind
pub struct Reconciler {
    kind: ResourceKind,
    client: Arc<dyn RemoteClient>,
}

impl Reconciler {
    pub fn new(kind: ResourceKind, client: Arc<dyn RemoteClient>) -> Self {
        Self { kind, client }
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Create the remote object described by `desired`
    pub fn create(&self, ctx: &OpContext, desired: &Attributes) -> Response {
        let phase = enter(Operation::Create);
        let mut diagnostics = self.kind.resource_schema().validate(desired);
        if diagnostics.has_error() {
            return Response::failed(phase, None, diagnostics);
        }

        match self.try_create(ctx, desired) {
            Ok(state) => {
                log::debug!("created {} {}", self.kind.name(), state.id);
                Response::succeeded(
                    Outcome::Created,
                    Some(state),
                    phase.settle(true),
                    diagnostics,
                )
            }
            Err(err) => {
                diagnostics.record(err.to_diagnostic());
                Response::failed(phase, None, diagnostics)
            }
        }
    }

    fn try_create(&self, ctx: &OpContext, desired: &Attributes) -> Result<ManagedState, Error> {
        ctx.check()?;
        let payload = self.kind.mapper().to_payload(desired);
        log::trace!("create payload for {}: {payload}", self.kind.name());
        let entity = self
            .client
            .create(ctx, self.kind.collection(), &payload)
            .map_err(|e| Error::from_adapter(Operation::Create, e))?;
        self.kind
            .mapper()
            .to_state(&entity)
            .map_err(|source| {
                if entity.id.is_empty() {
                    return Error::Mapping(source);
                }
                Error::CreatedUnrecorded {
                    kind: self.kind.name().to_string(),
                    id: entity.id.clone(),
                    source,
                }
            })
    }

    /// Refresh state from the remote object
    ///
    /// Local attributes are overwritten so out-of-band changes show up. If
    /// the object is gone, the response reports [`Outcome::RemovedUpstream`]
    /// with a warning and no state.
    pub fn read(&self, ctx: &OpContext, current: &ManagedState) -> Response {
        let phase = enter(Operation::Read);
        let mut diagnostics = Diagnostics::new();
        if let Err(err) = check_id(current) {
            diagnostics.record(err.to_diagnostic());
            return Response::failed(phase, Some(current), diagnostics);
        }

        match self.fetch(ctx, &current.id) {
            Ok(refreshed) => {
                if !current.attributes.is_empty() {
                    let drift = attribute_changes(&current.attributes, &refreshed.attributes);
                    if !drift.is_empty() {
                        log::info!("drift detected on {} {}", self.kind.name(), current.id);
                        diagnostics.warning(
                            "Drift Detected",
                            format!(
                                "{} {} changed outside of this configuration: {}",
                                self.kind.name(),
                                current.id,
                                describe_changes(&drift)
                            ),
                        );
                    }
                }
                Response::succeeded(
                    Outcome::Refreshed,
                    Some(refreshed),
                    phase.settle(true),
                    diagnostics,
                )
            }
            Err(Error::RemovedUpstream { id }) => {
                log::info!("{} {id} was removed upstream", self.kind.name());
                diagnostics.warning(
                    "Resource Removed Upstream",
                    format!(
                        "{} {id} no longer exists remotely and will be dropped from state.",
                        self.kind.name()
                    ),
                );
                Response::succeeded(
                    Outcome::RemovedUpstream,
                    None,
                    Lifecycle::Unmanaged,
                    diagnostics,
                )
            }
            Err(err) => {
                diagnostics.record(err.to_diagnostic());
                Response::failed(phase, Some(current), diagnostics)
            }
        }
    }

    /// Apply `desired` to the object in `current`, then re-read it
    ///
    /// The update response is not trusted; the follow-up read provides the
    /// authoritative state. If that read fails the operation fails too and
    /// the held state is stale.
    pub fn update(
        &self,
        ctx: &OpContext,
        current: &ManagedState,
        desired: &Attributes,
    ) -> Response {
        let phase = enter(Operation::Update);
        let mut diagnostics = self.kind.resource_schema().validate(desired);
        if let Err(err) = check_id(current).and_then(|()| ctx.check()) {
            diagnostics.record(err.to_diagnostic());
        }
        if diagnostics.has_error() {
            return Response::failed(phase, Some(current), diagnostics);
        }

        if let Err(err) = self.try_update(ctx, current, desired) {
            // the request was sent, so a failure or cancellation may have half-applied
            let may_have_applied = matches!(err, Error::Client { .. } | Error::Cancelled);
            diagnostics.record(err.to_diagnostic());
            if may_have_applied {
                diagnostics.warning(
                    "Remote State May Have Changed",
                    format!(
                        "The update of {} {} failed after it was sent. The remote object may \
                         be partially updated; run a refresh before retrying.",
                        self.kind.name(),
                        current.id
                    ),
                );
            }
            return Response::failed(phase, Some(current), diagnostics);
        }

        match self.fetch(ctx, &current.id) {
            Ok(state) => {
                log::debug!("updated {} {}", self.kind.name(), state.id);
                Response::succeeded(
                    Outcome::Updated,
                    Some(state),
                    phase.settle(true),
                    diagnostics,
                )
            }
            Err(err) => {
                diagnostics.record(err.to_diagnostic());
                diagnostics.error(
                    "Stale State After Update",
                    format!(
                        "{} {} was updated but could not be read back. Local state no longer \
                         reflects the remote object.",
                        self.kind.name(),
                        current.id
                    ),
                );
                Response::failed(phase, Some(current), diagnostics)
            }
        }
    }

    fn try_update(
        &self,
        ctx: &OpContext,
        current: &ManagedState,
        desired: &Attributes,
    ) -> Result<(), Error> {
        let payload = self.kind.mapper().to_payload(desired);
        log::trace!("update payload for {} {}: {payload}", self.kind.name(), current.id);
        self.client
            .update_by_id(ctx, self.kind.collection(), &current.id, &payload)
            .map(|_| ())
            .map_err(|e| match e {
                AdapterError::NotFound(_) => Error::RemovedUpstream {
                    id: current.id.clone(),
                },
                other => Error::from_adapter(Operation::Update, other),
            })
    }

    /// Delete the remote object
    ///
    /// An object that is already gone counts as deleted, with a warning.
    pub fn delete(&self, ctx: &OpContext, current: &ManagedState) -> Response {
        let phase = enter(Operation::Delete);
        let mut diagnostics = Diagnostics::new();
        if let Err(err) = check_id(current) {
            diagnostics.record(err.to_diagnostic());
            return Response::failed(phase, Some(current), diagnostics);
        }

        let result = ctx.check().and_then(|()| {
            self.client
                .delete_by_id(ctx, self.kind.collection(), &current.id)
                .map_err(|e| match e {
                    AdapterError::NotFound(_) => Error::RemovedUpstream {
                        id: current.id.clone(),
                    },
                    other => Error::from_adapter(Operation::Delete, other),
                })
        });

        match result {
            Ok(()) => {
                log::debug!("deleted {} {}", self.kind.name(), current.id);
                Response::succeeded(Outcome::Deleted, None, phase.settle(true), diagnostics)
            }
            Err(Error::RemovedUpstream { id }) => {
                diagnostics.warning(
                    "Resource Already Deleted",
                    format!("{} {id} did not exist remotely.", self.kind.name()),
                );
                Response::succeeded(Outcome::Deleted, None, phase.settle(true), diagnostics)
            }
            Err(err) => {
                diagnostics.record(err.to_diagnostic());
                Response::failed(phase, Some(current), diagnostics)
            }
        }
    }

    /// Bring an existing remote object under management by id
    ///
    /// Equivalent to reading `{id}`; an id that does not resolve is a
    /// not-found error and yields no state.
    pub fn import(&self, ctx: &OpContext, id: &str) -> Response {
        let phase = enter(Operation::Import);
        let mut diagnostics = Diagnostics::new();
        let stub = ManagedState::from_id(id.trim());
        if let Err(err) = check_id(&stub) {
            diagnostics.record(err.to_diagnostic());
            return Response::failed(phase, None, diagnostics);
        }

        match self.fetch(ctx, &stub.id) {
            Ok(state) => {
                log::debug!("imported {} {}", self.kind.name(), state.id);
                Response::succeeded(
                    Outcome::Imported,
                    Some(state),
                    phase.settle(true),
                    diagnostics,
                )
            }
            Err(Error::RemovedUpstream { id }) => {
                diagnostics.record(
                    Error::NotFound {
                        what: format!("{} {id}", self.kind.name()),
                    }
                    .to_diagnostic(),
                );
                Response::failed(phase, None, diagnostics)
            }
            Err(err) => {
                diagnostics.record(err.to_diagnostic());
                Response::failed(phase, None, diagnostics)
            }
        }
    }

    /// Get and map one object, enforcing identifier stability
    fn fetch(&self, ctx: &OpContext, id: &str) -> Result<ManagedState, Error> {
        ctx.check()?;
        let entity = self
            .client
            .get_by_id(ctx, self.kind.collection(), id)
            .map_err(|e| match e {
                AdapterError::NotFound(_) => Error::RemovedUpstream { id: id.to_string() },
                other => Error::from_adapter(Operation::Read, other),
            })?;

        if entity.id != id {
            return Err(Error::IdentifierChanged {
                held: id.to_string(),
                returned: entity.id,
            });
        }

        Ok(self.kind.mapper().to_state(&entity)?)
    }
}

fn check_id(state: &ManagedState) -> Result<(), Error> {
    if state.id.trim().is_empty() {
        return Err(Error::Validation("resource id must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterResult, Filter, MockCall, MockRemote};
    use crate::diagnostics::Severity;
    use crate::mapper::{EntityMapper, MappingError};
    use crate::types::RemoteEntity;
    use serde_json::{Value, json};

    const GROUPS: &str = "usergroups";

    fn setup() -> (Reconciler, MockRemote) {
        let mock = MockRemote::new().with_collection(GROUPS, "user_group");
        let reconciler = Reconciler::new(ResourceKind::user_group(), Arc::new(mock.clone()));
        (reconciler, mock)
    }

    fn named(name: &str) -> Attributes {
        let mut a = Attributes::new();
        a.insert("name".into(), name.into());
        a
    }

    #[test]
    fn test_create_then_read() {
        let (reconciler, _mock) = setup();
        let ctx = OpContext::new();

        let created = reconciler.create(&ctx, &named("eng-team"));
        assert!(created.is_success());
        assert_eq!(created.outcome, Outcome::Created);
        assert_eq!(created.lifecycle, Lifecycle::Managed);
        let state = created.state.unwrap();

        let read = reconciler.read(&ctx, &state);
        assert!(read.is_success());
        let refreshed = read.state.unwrap();
        assert_eq!(refreshed.id, state.id);
        assert_eq!(refreshed.name(), Some("eng-team"));
    }

    #[test]
    fn test_create_failure_keeps_no_state() {
        let (reconciler, mock) = setup();
        mock.fail_next(
            MockCall::Create,
            AdapterError::Api {
                status: 409,
                message: "group name already exists".into(),
            },
        );

        let response = reconciler.create(&OpContext::new(), &named("eng"));
        assert!(!response.is_success());
        assert!(response.state.is_none());
        assert_eq!(response.lifecycle, Lifecycle::Unmanaged);
        let diagnostic = response.diagnostics.first_error().unwrap();
        assert_eq!(diagnostic.summary, "Client Error (create)");
        assert!(diagnostic.detail.contains("group name already exists"));
        assert!(mock.is_empty(GROUPS));
    }

    #[test]
    fn test_create_rejects_invalid_attributes_without_calling_remote() {
        let (reconciler, mock) = setup();
        let response = reconciler.create(&OpContext::new(), &named(""));
        assert!(!response.is_success());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_read_reports_drift() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();

        mock.set_field(GROUPS, &state.id, "name", json!("renamed-in-console"));
        let read = reconciler.read(&ctx, &state);

        assert!(read.is_success());
        assert_eq!(read.state.unwrap().name(), Some("renamed-in-console"));
        let warning = read.diagnostics.iter().next().unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.summary, "Drift Detected");
    }

    #[test]
    fn test_read_failure_leaves_state_untouched() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();
        mock.fail_next(MockCall::Get, AdapterError::Transport("connection reset".into()));

        let read = reconciler.read(&ctx, &state);
        assert!(!read.is_success());
        assert_eq!(read.state.as_ref(), Some(&state));
        assert_eq!(read.lifecycle, Lifecycle::Managed);
    }

    #[test]
    fn test_update_then_read_and_idempotence() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();

        let updated = reconciler.update(&ctx, &state, &named("engineering"));
        assert!(updated.is_success());
        let updated_state = updated.state.unwrap();
        assert_eq!(updated_state.id, state.id);
        assert_eq!(updated_state.name(), Some("engineering"));

        let again = reconciler.update(&ctx, &updated_state, &named("engineering"));
        assert!(again.is_success());
        assert_eq!(again.state.unwrap(), updated_state);

        let read = reconciler.read(&ctx, &updated_state);
        assert_eq!(read.state.unwrap().name(), Some("engineering"));
        assert_eq!(mock.len(GROUPS), 1);
    }

    #[test]
    fn test_update_failure_warns_about_partial_apply() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();
        mock.fail_next(MockCall::Update, AdapterError::Transport("timeout".into()));

        let response = reconciler.update(&ctx, &state, &named("engineering"));
        assert!(!response.is_success());
        assert_eq!(response.state.as_ref(), Some(&state));
        assert!(
            response
                .diagnostics
                .iter()
                .any(|d| d.summary == "Remote State May Have Changed")
        );
    }

    #[test]
    fn test_update_cancelled_in_flight_warns_about_partial_apply() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();
        mock.fail_next(MockCall::Update, AdapterError::Cancelled);

        let response = reconciler.update(&ctx, &state, &named("engineering"));
        assert!(!response.is_success());
        let summaries: Vec<_> = response
            .diagnostics
            .iter()
            .map(|d| d.summary.as_str())
            .collect();
        assert!(summaries.contains(&"Operation Cancelled"));
        assert!(summaries.contains(&"Remote State May Have Changed"));
    }

    #[test]
    fn test_update_cancelled_before_send_does_not_warn() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();
        ctx.cancel();

        let response = reconciler.update(&ctx, &state, &named("engineering"));
        assert!(!response.is_success());
        assert_eq!(response.state.as_ref(), Some(&state));
        let summaries: Vec<_> = response
            .diagnostics
            .iter()
            .map(|d| d.summary.as_str())
            .collect();
        assert_eq!(summaries, vec!["Operation Cancelled"]);
        assert_eq!(mock.calls(), vec![MockCall::Create]);
    }

    #[test]
    fn test_create_with_unmappable_response_names_remote_id() {
        #[derive(Debug)]
        struct Unreadable;

        impl EntityMapper for Unreadable {
            fn to_payload(&self, attributes: &Attributes) -> Value {
                json!({ "name": attributes.get("name").map(ToString::to_string) })
            }

            fn to_state(&self, entity: &RemoteEntity) -> Result<ManagedState, MappingError> {
                Err(MappingError::MissingField {
                    id: entity.id.clone(),
                    field: "description".into(),
                })
            }
        }

        let mock = MockRemote::new().with_collection(GROUPS, "user_group");
        mock.set_next_id(42);
        let kind = ResourceKind::new("user_group", GROUPS, Arc::new(Unreadable));
        let reconciler = Reconciler::new(kind, Arc::new(mock.clone()));

        let response = reconciler.create(&OpContext::new(), &named("eng"));
        assert!(!response.is_success());
        assert!(response.state.is_none());
        let diagnostic = response
            .diagnostics
            .iter()
            .find(|d| d.summary == "Created Resource Not Recorded")
            .unwrap();
        assert!(diagnostic.detail.contains("grp_42"));
        assert!(mock.entity(GROUPS, "grp_42").is_some());
    }

    #[test]
    fn test_update_fails_when_follow_up_read_fails() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();
        mock.fail_next(MockCall::Get, AdapterError::Transport("reset".into()));

        let response = reconciler.update(&ctx, &state, &named("engineering"));
        assert!(!response.is_success());
        assert_eq!(response.outcome, Outcome::Failed);
        assert!(
            response
                .diagnostics
                .iter()
                .any(|d| d.summary == "Stale State After Update")
        );
        // the remote did take the change
        assert_eq!(
            mock.entity(GROUPS, &state.id).unwrap().str_field("name"),
            Some("engineering")
        );
    }

    #[test]
    fn test_update_uses_read_back_not_update_response() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();

        let response = reconciler.update(&ctx, &state, &named("engineering"));
        assert!(response.is_success());
        assert_eq!(
            mock.calls(),
            vec![MockCall::Create, MockCall::Update, MockCall::Get]
        );
    }

    #[test]
    fn test_delete_then_read_reports_removed_upstream() {
        let (reconciler, _mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();

        let deleted = reconciler.delete(&ctx, &state);
        assert!(deleted.is_success());
        assert!(deleted.state.is_none());
        assert_eq!(deleted.lifecycle, Lifecycle::Unmanaged);

        let read = reconciler.read(&ctx, &state);
        assert!(read.is_success());
        assert!(read.is_removed_upstream());
        assert!(read.state.is_none());
        assert_eq!(read.lifecycle, Lifecycle::Unmanaged);
    }

    #[test]
    fn test_delete_failure_stays_managed() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        let state = reconciler.create(&ctx, &named("eng")).state.unwrap();
        mock.fail_next(
            MockCall::Delete,
            AdapterError::Api {
                status: 500,
                message: "internal".into(),
            },
        );

        let response = reconciler.delete(&ctx, &state);
        assert!(!response.is_success());
        assert_eq!(response.state.as_ref(), Some(&state));
        assert_eq!(response.lifecycle, Lifecycle::Managed);
        assert_eq!(mock.len(GROUPS), 1);
    }

    #[test]
    fn test_delete_of_missing_object_succeeds_with_warning() {
        let (reconciler, _mock) = setup();
        let response = reconciler.delete(&OpContext::new(), &ManagedState::from_id("grp_404"));
        assert!(response.is_success());
        assert_eq!(response.outcome, Outcome::Deleted);
        assert_eq!(response.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_import_matches_create_then_read() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        mock.set_next_id(123);
        let created = reconciler.create(&ctx, &named("eng-team")).state.unwrap();
        let read = reconciler.read(&ctx, &created).state.unwrap();

        let imported = reconciler.import(&ctx, "grp_123");
        assert!(imported.is_success());
        assert_eq!(imported.outcome, Outcome::Imported);
        assert_eq!(imported.state.unwrap(), read);
    }

    #[test]
    fn test_import_unknown_id_is_not_found() {
        let (reconciler, _mock) = setup();
        let response = reconciler.import(&OpContext::new(), "grp_missing");
        assert!(!response.is_success());
        assert!(response.state.is_none());
        assert_eq!(response.diagnostics.first_error().unwrap().summary, "Not Found");
    }

    #[test]
    fn test_import_empty_id_is_rejected() {
        let (reconciler, mock) = setup();
        let response = reconciler.import(&OpContext::new(), "  ");
        assert!(!response.is_success());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_cancelled_context_aborts_before_remote_call() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        ctx.cancel();

        let response = reconciler.create(&ctx, &named("eng"));
        assert!(!response.is_success());
        assert_eq!(
            response.diagnostics.first_error().unwrap().summary,
            "Operation Cancelled"
        );
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_end_to_end_lifecycle() {
        let (reconciler, mock) = setup();
        let ctx = OpContext::new();
        mock.set_next_id(123);

        let state = reconciler.create(&ctx, &named("eng-team")).state.unwrap();
        assert_eq!(state.id, "grp_123");

        let read = reconciler.read(&ctx, &state).state.unwrap();
        assert_eq!(read, state);

        let updated = reconciler.update(&ctx, &read, &named("engineering-team")).state.unwrap();
        let read = reconciler.read(&ctx, &updated).state.unwrap();
        assert_eq!(read.id, "grp_123");
        assert_eq!(read.name(), Some("engineering-team"));

        assert!(reconciler.delete(&ctx, &read).is_success());
        assert!(reconciler.read(&ctx, &read).is_removed_upstream());
    }

    /// Remote that answers every get with a different id
    struct ShiftingRemote;

    impl RemoteClient for ShiftingRemote {
        fn list_filtered(
            &self,
            _: &OpContext,
            _: &str,
            _: &[Filter],
        ) -> AdapterResult<Vec<RemoteEntity>> {
            Ok(Vec::new())
        }

        fn create(&self, _: &OpContext, _: &str, _: &Value) -> AdapterResult<RemoteEntity> {
            Err(AdapterError::Transport("unused".into()))
        }

        fn get_by_id(&self, _: &OpContext, _: &str, _: &str) -> AdapterResult<RemoteEntity> {
            Ok(RemoteEntity::from_json(json!({"id": "grp_other", "name": "eng"})).unwrap())
        }

        fn update_by_id(
            &self,
            _: &OpContext,
            _: &str,
            _: &str,
            _: &Value,
        ) -> AdapterResult<RemoteEntity> {
            Err(AdapterError::Transport("unused".into()))
        }

        fn delete_by_id(&self, _: &OpContext, _: &str, _: &str) -> AdapterResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_read_never_adopts_a_different_id() {
        let reconciler = Reconciler::new(ResourceKind::user_group(), Arc::new(ShiftingRemote));
        let state = ManagedState::new("grp_1", named("eng"));

        let response = reconciler.read(&OpContext::new(), &state);
        assert!(!response.is_success());
        assert_eq!(response.state.unwrap().id, "grp_1");
        assert_eq!(
            response.diagnostics.first_error().unwrap().summary,
            "Unexpected Identifier Change"
        );
    }
}
