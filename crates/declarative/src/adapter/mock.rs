//! In-memory [`RemoteClient`] with fault injection, behind the `testing` feature

use super::{AdapterError, AdapterResult, Filter, RemoteClient};
use crate::context::OpContext;
use crate::types::RemoteEntity;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Calls understood by [`MockRemote`] fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    List,
    Create,
    Get,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct MockState {
    collections: HashMap<String, BTreeMap<String, RemoteEntity>>,
    type_tags: HashMap<String, String>,
    failures: HashMap<MockCall, Vec<AdapterError>>,
    calls: Vec<(MockCall, String)>,
    next_id: u64,
}

/// In-memory remote for testing without network access.
///
/// Clones share the same store, so a test can keep a handle for
/// inspection while the reconciler owns another.
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    /// Create an empty mock. Ids are assigned as `grp_1`, `grp_2`, ...
    pub fn new() -> Self {
        let mock = Self::default();
        mock.lock().next_id = 1;
        mock
    }

    /// Register a collection whose entities carry a `type` field.
    pub fn with_collection(self, collection: &str, type_tag: &str) -> Self {
        self.lock()
            .type_tags
            .insert(collection.to_string(), type_tag.to_string());
        self
    }

    /// Set the numeric part of the next assigned id.
    pub fn set_next_id(&self, next: u64) {
        self.lock().next_id = next;
    }

    /// Store an entity directly, bypassing `create`.
    pub fn insert(&self, collection: &str, entity: RemoteEntity) {
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(entity.id.clone(), entity);
    }

    /// Change a field on a stored entity, simulating an out-of-band edit.
    pub fn set_field(&self, collection: &str, id: &str, field: &str, value: Value) -> bool {
        let mut state = self.lock();
        match state
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
        {
            Some(entity) => {
                entity.fields.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Remove an entity directly, simulating an out-of-band delete.
    pub fn remove(&self, collection: &str, id: &str) -> bool {
        self.lock()
            .collections
            .get_mut(collection)
            .is_some_and(|c| c.remove(id).is_some())
    }

    /// Make the next call of the given kind fail with `error`.
    ///
    /// Queued failures are consumed in order, one per call.
    pub fn fail_next(&self, call: MockCall, error: AdapterError) {
        self.lock().failures.entry(call).or_default().push(error);
    }

    /// Stored entity by id.
    pub fn entity(&self, collection: &str, id: &str) -> Option<RemoteEntity> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }

    /// Number of stored entities in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.iter().map(|(call, _)| *call).collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, then apply cancellation and injected failures.
    fn begin(&self, ctx: &OpContext, call: MockCall, target: &str) -> AdapterResult<()> {
        let mut state = self.lock();
        state.calls.push((call, target.to_string()));
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        if let Some(queue) = state.failures.get_mut(&call)
            && !queue.is_empty()
        {
            return Err(queue.remove(0));
        }
        Ok(())
    }
}

fn payload_fields(payload: &Value) -> AdapterResult<Map<String, Value>> {
    match payload {
        Value::Object(fields) => Ok(fields.clone()),
        other => Err(AdapterError::Api {
            status: 400,
            message: format!("payload must be an object, got {other}"),
        }),
    }
}

impl RemoteClient for MockRemote {
    fn list_filtered(
        &self,
        ctx: &OpContext,
        collection: &str,
        filters: &[Filter],
    ) -> AdapterResult<Vec<RemoteEntity>> {
        self.begin(ctx, MockCall::List, collection)?;
        let state = self.lock();
        Ok(state
            .collections
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|e| filters.iter().all(|f| f.matches(e)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn create(
        &self,
        ctx: &OpContext,
        collection: &str,
        payload: &Value,
    ) -> AdapterResult<RemoteEntity> {
        self.begin(ctx, MockCall::Create, collection)?;
        let mut fields = payload_fields(payload)?;

        let mut state = self.lock();
        let id = format!("grp_{}", state.next_id);
        state.next_id += 1;

        fields.insert("id".to_string(), Value::String(id.clone()));
        if let Some(tag) = state.type_tags.get(collection) {
            fields.insert("type".to_string(), Value::String(tag.clone()));
        }

        let entity = RemoteEntity::new(id.clone(), fields);
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, entity.clone());
        Ok(entity)
    }

    fn get_by_id(
        &self,
        ctx: &OpContext,
        collection: &str,
        id: &str,
    ) -> AdapterResult<RemoteEntity> {
        self.begin(ctx, MockCall::Get, id)?;
        self.entity(collection, id)
            .ok_or_else(|| AdapterError::NotFound(id.to_string()))
    }

    fn update_by_id(
        &self,
        ctx: &OpContext,
        collection: &str,
        id: &str,
        payload: &Value,
    ) -> AdapterResult<RemoteEntity> {
        self.begin(ctx, MockCall::Update, id)?;
        let fields = payload_fields(payload)?;

        let mut state = self.lock();
        let entity = state
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| AdapterError::NotFound(id.to_string()))?;
        for (key, value) in fields {
            if key != "id" {
                entity.fields.insert(key, value);
            }
        }
        Ok(entity.clone())
    }

    fn delete_by_id(&self, ctx: &OpContext, collection: &str, id: &str) -> AdapterResult<()> {
        self.begin(ctx, MockCall::Delete, id)?;
        if self.remove(collection, id) {
            Ok(())
        } else {
            Err(AdapterError::NotFound(id.to_string()))
        }
    }
}
