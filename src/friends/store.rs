//! Storage seam for the relationship state machine
//!
//! The manager never touches MongoDB directly; it drives this trait. The
//! two invariants the storage layer must uphold on its own:
//!
//! 1. `insert_pending` enforces uniqueness of the direction-sensitive
//!    (sender, receiver, kinds) tuple atomically — a pre-check alone would
//!    lose the race between two near-simultaneous sends.
//! 2. `commit_acceptance` deletes the ledger row and appends both
//!    connection-list entries as one atomic unit — either all three writes
//!    land or none does, so a half-accepted asymmetric connection can never
//!    be observed.

use async_trait::async_trait;

use crate::friends::{ConnectionLists, EntityRef, FriendRequest, SenderSnapshot};

/// Storage-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A pending row with the identical direction-sensitive tuple exists
    #[error("duplicate pending request")]
    DuplicatePending,

    /// The ledger row vanished before the acceptance committed
    #[error("request no longer exists")]
    RequestGone,

    /// The sender vanished between validation and commit
    #[error("sender no longer exists")]
    SenderVanished,

    /// The receiver vanished between validation and commit
    #[error("receiver no longer exists")]
    ReceiverVanished,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence operations the relationship manager needs
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Whether an entity of the given kind exists
    async fn entity_exists(&self, entity: &EntityRef) -> Result<bool, StoreError>;

    /// Whether `entity`'s connection list of `target.kind` contains `target`
    async fn is_connected(&self, entity: &EntityRef, target: &EntityRef)
        -> Result<bool, StoreError>;

    /// Create a pending request, returning its identity.
    /// Must reject a duplicate tuple atomically with `DuplicatePending`.
    async fn insert_pending(
        &self,
        sender: &EntityRef,
        receiver: &EntityRef,
    ) -> Result<String, StoreError>;

    /// Load a request by id
    async fn find_request(&self, request_id: &str) -> Result<Option<FriendRequest>, StoreError>;

    /// Delete a request by id; returns whether a row was removed
    async fn delete_request(&self, request_id: &str) -> Result<bool, StoreError>;

    /// Atomically delete the ledger row and append each side to the other's
    /// connection list of the appropriate kind.
    async fn commit_acceptance(&self, request: &FriendRequest) -> Result<(), StoreError>;

    /// All pending requests addressed to the given receiver, in creation order
    async fn pending_for_receiver(
        &self,
        receiver_id: &str,
    ) -> Result<Vec<FriendRequest>, StoreError>;

    /// Fresh read-time join of an entity's display attributes
    async fn entity_snapshot(&self, entity: &EntityRef)
        -> Result<Option<SenderSnapshot>, StoreError>;

    /// Both connection lists of an entity, resolved to display summaries
    async fn connections_of(&self, entity: &EntityRef)
        -> Result<Option<ConnectionLists>, StoreError>;
}
