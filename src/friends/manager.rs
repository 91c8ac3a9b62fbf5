//! Relationship manager
//!
//! The state machine over the friend-request ledger and the entities'
//! connection lists. Validation happens before any destructive write: an
//! accept that fails validation leaves the pending row in place (the one
//! exception is a request whose pair is already connected — that row can
//! never succeed, so it is cleaned up while the error is reported).

use std::sync::Arc;
use tracing::{info, warn};

use crate::db::schemas::STATUS_PENDING;
use crate::friends::{
    ConnectionLists, EntityRef, FriendError, PendingRequestView, RelationshipStore,
    SenderSnapshot, StoreError,
};

/// Validates and executes friend-request operations
#[derive(Clone)]
pub struct RelationshipManager {
    store: Arc<dyn RelationshipStore>,
}

impl RelationshipManager {
    pub fn new(store: Arc<dyn RelationshipStore>) -> Self {
        Self { store }
    }

    /// Access the underlying store (read-time joins for display routes)
    pub fn store(&self) -> &Arc<dyn RelationshipStore> {
        &self.store
    }

    /// Create a pending friend request from `sender` to `receiver`.
    ///
    /// Uniqueness is direction-sensitive: an outstanding receiver→sender
    /// request does not block sender→receiver, so two entities may hold
    /// mutual pending requests at once. Returns the new request id.
    pub async fn send_request(
        &self,
        sender: &EntityRef,
        receiver: &EntityRef,
    ) -> Result<String, FriendError> {
        if sender.id == receiver.id {
            return Err(FriendError::SelfRequest);
        }

        if !self.store.entity_exists(sender).await.map_err(map_infra)? {
            return Err(FriendError::SenderNotFound);
        }
        if !self.store.entity_exists(receiver).await.map_err(map_infra)? {
            return Err(FriendError::ReceiverNotFound);
        }

        if self
            .store
            .is_connected(sender, receiver)
            .await
            .map_err(map_infra)?
        {
            return Err(FriendError::AlreadyConnected);
        }

        // The store enforces tuple uniqueness atomically; no pre-check that
        // could lose the race between two simultaneous sends.
        let request_id = match self.store.insert_pending(sender, receiver).await {
            Ok(id) => id,
            Err(StoreError::DuplicatePending) => return Err(FriendError::DuplicateRequest),
            Err(e) => return Err(map_infra(e)),
        };

        info!(
            "Friend request {} created: {} {} -> {} {}",
            request_id, sender.kind, sender.id, receiver.kind, receiver.id
        );

        Ok(request_id)
    }

    /// Accept a pending request, forming a symmetric connection.
    ///
    /// Validates fully before deleting anything: if the sender or receiver
    /// has vanished the pending row survives for a later retry or reject.
    /// The ledger deletion and both connection-list appends commit as one
    /// atomic unit.
    pub async fn accept_request(&self, request_id: &str) -> Result<(), FriendError> {
        let request = self
            .store
            .find_request(request_id)
            .await
            .map_err(map_infra)?
            .ok_or(FriendError::RequestNotFound)?;

        if !self
            .store
            .entity_exists(&request.sender)
            .await
            .map_err(map_infra)?
        {
            return Err(FriendError::SenderNotFound);
        }
        if !self
            .store
            .entity_exists(&request.receiver)
            .await
            .map_err(map_infra)?
        {
            return Err(FriendError::ReceiverNotFound);
        }

        if self
            .store
            .is_connected(&request.sender, &request.receiver)
            .await
            .map_err(map_infra)?
        {
            // A stale row (e.g. the second of two mutual requests after the
            // first was accepted) can never succeed; remove it so it stops
            // showing up in the receiver's inbox.
            self.store
                .delete_request(&request.id)
                .await
                .map_err(map_infra)?;
            return Err(FriendError::AlreadyConnected);
        }

        match self.store.commit_acceptance(&request).await {
            Ok(()) => {
                info!(
                    "Friend request {} accepted: {} {} <-> {} {}",
                    request.id,
                    request.sender.kind,
                    request.sender.id,
                    request.receiver.kind,
                    request.receiver.id
                );
                Ok(())
            }
            // Lost a race with a concurrent accept or reject
            Err(StoreError::RequestGone) => Err(FriendError::RequestNotFound),
            Err(StoreError::SenderVanished) => Err(FriendError::SenderNotFound),
            Err(StoreError::ReceiverVanished) => Err(FriendError::ReceiverNotFound),
            Err(e) => Err(map_infra(e)),
        }
    }

    /// Reject a pending request. Connection lists are never touched.
    pub async fn reject_request(&self, request_id: &str) -> Result<(), FriendError> {
        let request = self
            .store
            .find_request(request_id)
            .await
            .map_err(map_infra)?
            .ok_or(FriendError::RequestNotFound)?;

        self.store
            .delete_request(&request.id)
            .await
            .map_err(map_infra)?;

        info!("Friend request {} rejected", request.id);
        Ok(())
    }

    /// Pending requests addressed to `receiver_id`, each joined fresh to the
    /// sender's display attributes. Rows whose sender has vanished are
    /// skipped; they become `SenderNotFound` if acted upon.
    pub async fn pending_for_receiver(
        &self,
        receiver_id: &str,
    ) -> Result<Vec<PendingRequestView>, FriendError> {
        let requests = self
            .store
            .pending_for_receiver(receiver_id)
            .await
            .map_err(map_infra)?;

        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            match self
                .store
                .entity_snapshot(&request.sender)
                .await
                .map_err(map_infra)?
            {
                Some(snapshot) => views.push(PendingRequestView {
                    id: request.id,
                    sender_type: request.sender.kind,
                    sender: SenderSnapshot {
                        // The inbox shows name and location only
                        phone: None,
                        ..snapshot
                    },
                    status: STATUS_PENDING,
                    timestamp: request.created_at,
                }),
                None => {
                    warn!(
                        "Skipping pending request {} from vanished sender {} {}",
                        request.id, request.sender.kind, request.sender.id
                    );
                }
            }
        }

        Ok(views)
    }

    /// Both connection lists of an entity, resolved to display summaries.
    /// Returns `None` when the entity does not exist.
    pub async fn connections_of(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<ConnectionLists>, FriendError> {
        self.store.connections_of(entity).await.map_err(map_infra)
    }
}

fn map_infra(e: StoreError) -> FriendError {
    FriendError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friends::{EntityKind, MemoryStore};

    struct Fixture {
        store: Arc<MemoryStore>,
        manager: RelationshipManager,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store.add_entity(
            "f1",
            EntityKind::Farmer,
            "Ravi Patil",
            "Nashik",
            "Maharashtra",
            Some("+911234567890"),
        );
        store.add_entity(
            "f2",
            EntityKind::Farmer,
            "Sita Kumari",
            "Patna",
            "Bihar",
            None,
        );
        store.add_entity(
            "g1",
            EntityKind::Firm,
            "AgroTrade Ltd",
            "Mumbai",
            "Maharashtra",
            Some("+919999999999"),
        );
        let manager = RelationshipManager::new(store.clone());
        Fixture { store, manager }
    }

    fn farmer(id: &str) -> EntityRef {
        EntityRef::new(id, EntityKind::Farmer)
    }

    fn firm(id: &str) -> EntityRef {
        EntityRef::new(id, EntityKind::Firm)
    }

    #[tokio::test]
    async fn test_accept_forms_symmetric_connection() {
        let fx = fixture();

        let id = fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();
        fx.manager.accept_request(&id).await.unwrap();

        // Both directions observable, keyed by the counterparty's kind
        let store = fx.manager.store();
        assert!(store.is_connected(&farmer("f1"), &firm("g1")).await.unwrap());
        assert!(store.is_connected(&firm("g1"), &farmer("f1")).await.unwrap());
        assert_eq!(fx.store.pending_count(), 0);

        let farmer_lists = fx.manager.connections_of(&farmer("f1")).await.unwrap().unwrap();
        assert!(farmer_lists.farmers.is_empty());
        assert_eq!(farmer_lists.firms.len(), 1);
        assert_eq!(farmer_lists.firms[0].id, "g1");
        assert_eq!(farmer_lists.firms[0].name, "AgroTrade Ltd");

        let firm_lists = fx.manager.connections_of(&firm("g1")).await.unwrap().unwrap();
        assert_eq!(firm_lists.farmers.len(), 1);
        assert_eq!(firm_lists.farmers[0].id, "f1");
        assert!(firm_lists.firms.is_empty());
    }

    #[tokio::test]
    async fn test_send_between_connected_pair_rejected() {
        let fx = fixture();

        let id = fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();
        fx.manager.accept_request(&id).await.unwrap();

        assert_eq!(
            fx.manager.send_request(&farmer("f1"), &firm("g1")).await,
            Err(FriendError::AlreadyConnected)
        );
        // The reverse sender trips the same check
        assert_eq!(
            fx.manager.send_request(&firm("g1"), &farmer("f1")).await,
            Err(FriendError::AlreadyConnected)
        );
    }

    #[tokio::test]
    async fn test_self_request_rejected() {
        let fx = fixture();
        assert_eq!(
            fx.manager.send_request(&farmer("f1"), &farmer("f1")).await,
            Err(FriendError::SelfRequest)
        );
        assert_eq!(fx.store.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_send_rejected_but_reverse_allowed() {
        let fx = fixture();

        fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();
        assert_eq!(
            fx.manager.send_request(&farmer("f1"), &firm("g1")).await,
            Err(FriendError::DuplicateRequest)
        );

        // Mutual pending requests may coexist
        fx.manager.send_request(&firm("g1"), &farmer("f1")).await.unwrap();
        assert_eq!(fx.store.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_parties_reported() {
        let fx = fixture();

        assert_eq!(
            fx.manager.send_request(&farmer("ghost"), &firm("g1")).await,
            Err(FriendError::SenderNotFound)
        );
        assert_eq!(
            fx.manager.send_request(&farmer("f1"), &firm("ghost")).await,
            Err(FriendError::ReceiverNotFound)
        );
        // Same id under the wrong kind is a different entity
        assert_eq!(
            fx.manager.send_request(&firm("f1"), &farmer("g1")).await,
            Err(FriendError::SenderNotFound)
        );
        assert_eq!(fx.store.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_reject_removes_row_without_connecting() {
        let fx = fixture();

        let id = fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();
        fx.manager.reject_request(&id).await.unwrap();

        assert_eq!(fx.store.pending_count(), 0);
        assert!(!fx.manager.store().is_connected(&farmer("f1"), &firm("g1")).await.unwrap());

        // A second reject of the same id finds nothing
        assert_eq!(
            fx.manager.reject_request(&id).await,
            Err(FriendError::RequestNotFound)
        );
    }

    #[tokio::test]
    async fn test_accept_unknown_id_has_no_side_effects() {
        let fx = fixture();
        fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();

        assert_eq!(
            fx.manager.accept_request("req-999").await,
            Err(FriendError::RequestNotFound)
        );
        assert_eq!(fx.store.pending_count(), 1);
        assert!(!fx.manager.store().is_connected(&farmer("f1"), &firm("g1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_accept_with_vanished_sender_keeps_row() {
        let fx = fixture();
        let id = fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();

        fx.store.remove_entity(&farmer("f1"));

        assert_eq!(
            fx.manager.accept_request(&id).await,
            Err(FriendError::SenderNotFound)
        );
        // Validation failed before any destructive write
        assert_eq!(fx.store.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_mutual_pending_second_accept_is_stale() {
        let fx = fixture();

        let first = fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();
        let second = fx.manager.send_request(&firm("g1"), &farmer("f1")).await.unwrap();

        fx.manager.accept_request(&first).await.unwrap();
        assert!(fx.manager.store().is_connected(&farmer("f1"), &firm("g1")).await.unwrap());

        // The dangling reverse row can never succeed; accepting it reports
        // the existing connection and cleans the row up
        assert_eq!(
            fx.manager.accept_request(&second).await,
            Err(FriendError::AlreadyConnected)
        );
        assert_eq!(fx.store.pending_count(), 0);

        // State stays a single symmetric connection
        let lists = fx.manager.connections_of(&firm("g1")).await.unwrap().unwrap();
        assert_eq!(lists.farmers.len(), 1);
        assert!(lists.firms.is_empty());
    }

    #[tokio::test]
    async fn test_pending_inbox_joins_sender_and_strips_phone() {
        let fx = fixture();

        fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();
        fx.manager.send_request(&farmer("f2"), &firm("g1")).await.unwrap();

        let inbox = fx.manager.pending_for_receiver("g1").await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].sender.name, "Ravi Patil");
        assert_eq!(inbox[0].sender_type, EntityKind::Farmer);
        assert_eq!(inbox[0].status, "Pending");
        // Contact details are withheld until the request is accepted
        assert!(inbox.iter().all(|v| v.sender.phone.is_none()));
        assert_eq!(inbox[1].sender.name, "Sita Kumari");
    }

    #[tokio::test]
    async fn test_pending_inbox_skips_vanished_sender() {
        let fx = fixture();

        fx.manager.send_request(&farmer("f1"), &firm("g1")).await.unwrap();
        fx.manager.send_request(&farmer("f2"), &firm("g1")).await.unwrap();
        fx.store.remove_entity(&farmer("f1"));

        let inbox = fx.manager.pending_for_receiver("g1").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender.name, "Sita Kumari");
        // The orphaned row stays in the ledger for accept/reject to report
        assert_eq!(fx.store.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_connections_of_unknown_entity_is_none() {
        let fx = fixture();
        let lists = fx.manager.connections_of(&farmer("ghost")).await.unwrap();
        assert!(lists.is_none());
    }

    #[tokio::test]
    async fn test_farmer_to_farmer_connection_uses_farmer_lists() {
        let fx = fixture();

        let id = fx.manager.send_request(&farmer("f1"), &farmer("f2")).await.unwrap();
        fx.manager.accept_request(&id).await.unwrap();

        let lists = fx.manager.connections_of(&farmer("f1")).await.unwrap().unwrap();
        assert_eq!(lists.farmers.len(), 1);
        assert_eq!(lists.farmers[0].id, "f2");
        assert!(lists.firms.is_empty());
    }
}
