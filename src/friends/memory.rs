//! In-memory relationship store
//!
//! Single-mutex implementation of [`RelationshipStore`]. One lock guards the
//! whole state, so `insert_pending` and `commit_acceptance` are trivially
//! atomic. Used by the test suite; mirrors the MongoDB store's observable
//! behavior including tuple uniqueness and acceptance atomicity.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::friends::{
    ConnectionLists, EntityKind, EntityRef, FriendRequest, FriendSummary, RelationshipStore,
    SenderSnapshot, StoreError,
};

#[derive(Debug, Clone)]
struct MemoryEntity {
    name: String,
    city: String,
    state: String,
    phone: Option<String>,
    farmer_friends: HashSet<String>,
    firm_friends: HashSet<String>,
}

impl MemoryEntity {
    fn connections(&self, kind: EntityKind) -> &HashSet<String> {
        match kind {
            EntityKind::Farmer => &self.farmer_friends,
            EntityKind::Firm => &self.firm_friends,
        }
    }

    fn connections_mut(&mut self, kind: EntityKind) -> &mut HashSet<String> {
        match kind {
            EntityKind::Farmer => &mut self.farmer_friends,
            EntityKind::Firm => &mut self.firm_friends,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entities: HashMap<(EntityKind, String), MemoryEntity>,
    requests: HashMap<String, FriendRequest>,
    next_request_id: u64,
}

/// In-memory [`RelationshipStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity for lookups and connection bookkeeping
    pub fn add_entity(
        &self,
        id: impl Into<String>,
        kind: EntityKind,
        name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        phone: Option<&str>,
    ) {
        let mut guard = self.state.lock().expect("memory store poisoned");
        guard.entities.insert(
            (kind, id.into()),
            MemoryEntity {
                name: name.into(),
                city: city.into(),
                state: state.into(),
                phone: phone.map(str::to_string),
                farmer_friends: HashSet::new(),
                firm_friends: HashSet::new(),
            },
        );
    }

    /// Remove an entity (simulates a vanished account)
    pub fn remove_entity(&self, entity: &EntityRef) {
        let mut guard = self.state.lock().expect("memory store poisoned");
        guard.entities.remove(&(entity.kind, entity.id.clone()));
    }

    /// Number of pending rows in the ledger
    pub fn pending_count(&self) -> usize {
        self.state.lock().expect("memory store poisoned").requests.len()
    }

    fn tuple_exists(state: &MemoryState, sender: &EntityRef, receiver: &EntityRef) -> bool {
        state
            .requests
            .values()
            .any(|r| &r.sender == sender && &r.receiver == receiver)
    }

    fn summaries(state: &MemoryState, kind: EntityKind, ids: &HashSet<String>) -> Vec<FriendSummary> {
        let mut out: Vec<FriendSummary> = ids
            .iter()
            .filter_map(|id| {
                state.entities.get(&(kind, id.clone())).map(|e| FriendSummary {
                    id: id.clone(),
                    name: e.name.clone(),
                    city: e.city.clone(),
                    state: e.state.clone(),
                    phone: e.phone.clone(),
                })
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn entity_exists(&self, entity: &EntityRef) -> Result<bool, StoreError> {
        let guard = self.state.lock().expect("memory store poisoned");
        Ok(guard.entities.contains_key(&(entity.kind, entity.id.clone())))
    }

    async fn is_connected(
        &self,
        entity: &EntityRef,
        target: &EntityRef,
    ) -> Result<bool, StoreError> {
        let guard = self.state.lock().expect("memory store poisoned");
        Ok(guard
            .entities
            .get(&(entity.kind, entity.id.clone()))
            .map(|e| e.connections(target.kind).contains(&target.id))
            .unwrap_or(false))
    }

    async fn insert_pending(
        &self,
        sender: &EntityRef,
        receiver: &EntityRef,
    ) -> Result<String, StoreError> {
        let mut guard = self.state.lock().expect("memory store poisoned");

        // Uniqueness check and insert under the same lock
        if Self::tuple_exists(&guard, sender, receiver) {
            return Err(StoreError::DuplicatePending);
        }

        guard.next_request_id += 1;
        let id = format!("req-{}", guard.next_request_id);
        guard.requests.insert(
            id.clone(),
            FriendRequest {
                id: id.clone(),
                sender: sender.clone(),
                receiver: receiver.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_request(&self, request_id: &str) -> Result<Option<FriendRequest>, StoreError> {
        let guard = self.state.lock().expect("memory store poisoned");
        Ok(guard.requests.get(request_id).cloned())
    }

    async fn delete_request(&self, request_id: &str) -> Result<bool, StoreError> {
        let mut guard = self.state.lock().expect("memory store poisoned");
        Ok(guard.requests.remove(request_id).is_some())
    }

    async fn commit_acceptance(&self, request: &FriendRequest) -> Result<(), StoreError> {
        let mut guard = self.state.lock().expect("memory store poisoned");

        if !guard.requests.contains_key(&request.id) {
            return Err(StoreError::RequestGone);
        }
        let sender_key = (request.sender.kind, request.sender.id.clone());
        let receiver_key = (request.receiver.kind, request.receiver.id.clone());
        if !guard.entities.contains_key(&sender_key) {
            return Err(StoreError::SenderVanished);
        }
        if !guard.entities.contains_key(&receiver_key) {
            return Err(StoreError::ReceiverVanished);
        }

        // All three writes under the one lock
        guard.requests.remove(&request.id);
        guard
            .entities
            .get_mut(&sender_key)
            .expect("checked above")
            .connections_mut(request.receiver.kind)
            .insert(request.receiver.id.clone());
        guard
            .entities
            .get_mut(&receiver_key)
            .expect("checked above")
            .connections_mut(request.sender.kind)
            .insert(request.sender.id.clone());

        Ok(())
    }

    async fn pending_for_receiver(
        &self,
        receiver_id: &str,
    ) -> Result<Vec<FriendRequest>, StoreError> {
        let guard = self.state.lock().expect("memory store poisoned");
        let mut rows: Vec<FriendRequest> = guard
            .requests
            .values()
            .filter(|r| r.receiver.id == receiver_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id.clone()));
        Ok(rows)
    }

    async fn entity_snapshot(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<SenderSnapshot>, StoreError> {
        let guard = self.state.lock().expect("memory store poisoned");
        Ok(guard
            .entities
            .get(&(entity.kind, entity.id.clone()))
            .map(|e| SenderSnapshot {
                name: e.name.clone(),
                city: e.city.clone(),
                state: e.state.clone(),
                phone: e.phone.clone(),
            }))
    }

    async fn connections_of(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<ConnectionLists>, StoreError> {
        let guard = self.state.lock().expect("memory store poisoned");
        let Some(record) = guard.entities.get(&(entity.kind, entity.id.clone())) else {
            return Ok(None);
        };
        Ok(Some(ConnectionLists {
            farmers: Self::summaries(&guard, EntityKind::Farmer, &record.farmer_friends),
            firms: Self::summaries(&guard, EntityKind::Firm, &record.firm_friends),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_pending_rejects_duplicate_tuple() {
        let store = MemoryStore::new();
        let a = EntityRef::new("a", EntityKind::Farmer);
        let b = EntityRef::new("b", EntityKind::Firm);

        store.insert_pending(&a, &b).await.unwrap();
        assert_eq!(
            store.insert_pending(&a, &b).await,
            Err(StoreError::DuplicatePending)
        );
        // Reverse direction is a different tuple
        store.insert_pending(&b, &a).await.unwrap();
        assert_eq!(store.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_commit_acceptance_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.add_entity("a", EntityKind::Farmer, "A Farmer", "Pune", "MH", None);
        let a = EntityRef::new("a", EntityKind::Farmer);
        let b = EntityRef::new("b", EntityKind::Firm);

        // Receiver was never registered: nothing must change
        let id = store.insert_pending(&a, &b).await.unwrap();
        let request = store.find_request(&id).await.unwrap().unwrap();
        assert_eq!(
            store.commit_acceptance(&request).await,
            Err(StoreError::ReceiverVanished)
        );
        assert_eq!(store.pending_count(), 1);
        assert!(!store.is_connected(&a, &b).await.unwrap());
    }
}
