//! Friend-relationship subsystem
//!
//! The relationship state machine connecting farmers and firms. A one-way
//! pending request is created by `send_request`; `accept_request` turns it
//! into a symmetric connection (both sides list each other) in one atomic
//! commit; `reject_request` discards it. Storage is abstracted behind
//! [`RelationshipStore`] with MongoDB and in-memory implementations.

mod error;
mod kind;
mod manager;
pub mod memory;
mod mongo;
mod request;
mod store;

pub use error::FriendError;
pub use kind::{EntityKind, EntityRef};
pub use manager::RelationshipManager;
pub use memory::MemoryStore;
pub use mongo::MongoRelationshipStore;
pub use request::{ConnectionLists, FriendRequest, FriendSummary, PendingRequestView, SenderSnapshot};
pub use store::{RelationshipStore, StoreError};
