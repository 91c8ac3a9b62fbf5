//! MongoDB-backed relationship store
//!
//! Entities live in the `farmers` and `firms` collections, pending requests
//! in `friend_requests`. Tuple uniqueness comes from the ledger's partial
//! unique index; acceptance runs as a multi-document transaction (requires
//! the server to be a replica set, a single-node one is sufficient).

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use chrono::Utc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Database};

use crate::db::schemas::{
    FriendRequestDoc, Metadata, FRIEND_REQUEST_COLLECTION, STATUS_PENDING,
};
use crate::db::{MongoClient, MongoCollection};
use crate::friends::{
    ConnectionLists, EntityKind, EntityRef, FriendRequest, FriendSummary, RelationshipStore,
    SenderSnapshot, StoreError,
};
use crate::types::HarvestError;

/// [`RelationshipStore`] over MongoDB
#[derive(Clone)]
pub struct MongoRelationshipStore {
    client: Client,
    db: Database,
    requests: MongoCollection<FriendRequestDoc>,
}

impl MongoRelationshipStore {
    /// Create the store and apply the ledger's indexes
    pub async fn new(mongo: &MongoClient) -> Result<Self, HarvestError> {
        let requests = mongo
            .collection::<FriendRequestDoc>(FRIEND_REQUEST_COLLECTION)
            .await?;

        Ok(Self {
            client: mongo.inner().clone(),
            db: mongo.inner().database(mongo.db_name()),
            requests,
        })
    }

    fn entities(&self, kind: EntityKind) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(kind.collection())
    }

    async fn fetch_summaries(
        &self,
        kind: EntityKind,
        ids: &[ObjectId],
    ) -> Result<Vec<FriendSummary>, StoreError> {
        use futures_util::TryStreamExt;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut cursor = self
            .entities(kind)
            .find(doc! { "_id": { "$in": ids } })
            .await
            .map_err(backend)?;

        let mut summaries = Vec::with_capacity(ids.len());
        while let Some(entity) = cursor.try_next().await.map_err(backend)? {
            let Some(id) = entity.get_object_id("_id").ok() else {
                continue;
            };
            summaries.push(FriendSummary {
                id: id.to_hex(),
                name: display_name(kind, &entity),
                city: entity.get_str("city").unwrap_or_default().to_string(),
                state: entity.get_str("state").unwrap_or_default().to_string(),
                phone: entity.get_str("phone_number").ok().map(str::to_string),
            });
        }
        Ok(summaries)
    }
}

#[async_trait]
impl RelationshipStore for MongoRelationshipStore {
    async fn entity_exists(&self, entity: &EntityRef) -> Result<bool, StoreError> {
        let Some(oid) = parse_oid(&entity.id) else {
            return Ok(false);
        };
        let found = self
            .entities(entity.kind)
            .find_one(doc! { "_id": oid })
            .await
            .map_err(backend)?;
        Ok(found.is_some())
    }

    async fn is_connected(
        &self,
        entity: &EntityRef,
        target: &EntityRef,
    ) -> Result<bool, StoreError> {
        let (Some(oid), Some(target_oid)) = (parse_oid(&entity.id), parse_oid(&target.id)) else {
            return Ok(false);
        };
        let found = self
            .entities(entity.kind)
            .find_one(doc! {
                "_id": oid,
                target.kind.connection_field(): target_oid,
            })
            .await
            .map_err(backend)?;
        Ok(found.is_some())
    }

    async fn insert_pending(
        &self,
        sender: &EntityRef,
        receiver: &EntityRef,
    ) -> Result<String, StoreError> {
        let sender_oid = parse_oid(&sender.id).ok_or(StoreError::SenderVanished)?;
        let receiver_oid = parse_oid(&receiver.id).ok_or(StoreError::ReceiverVanished)?;

        let row = FriendRequestDoc {
            _id: None,
            metadata: Metadata::new(),
            sender_id: sender_oid,
            sender_kind: sender.kind,
            receiver_id: receiver_oid,
            receiver_kind: receiver.kind,
            status: STATUS_PENDING.to_string(),
        };

        // Raw insert so a unique-index violation is distinguishable: the
        // partial index is what closes the duplicate-send race.
        match self.requests.inner().insert_one(row).await {
            Ok(result) => result
                .inserted_id
                .as_object_id()
                .map(|oid| oid.to_hex())
                .ok_or_else(|| StoreError::Backend("insert returned no id".into())),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicatePending),
            Err(e) => Err(backend(e)),
        }
    }

    async fn find_request(&self, request_id: &str) -> Result<Option<FriendRequest>, StoreError> {
        let Some(oid) = parse_oid(request_id) else {
            return Ok(None);
        };
        let doc = self
            .requests
            .find_one(doc! { "_id": oid })
            .await
            .map_err(backend)?;
        Ok(doc.map(to_domain))
    }

    async fn delete_request(&self, request_id: &str) -> Result<bool, StoreError> {
        let Some(oid) = parse_oid(request_id) else {
            return Ok(false);
        };
        let result = self
            .requests
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }

    async fn commit_acceptance(&self, request: &FriendRequest) -> Result<(), StoreError> {
        let request_oid = parse_oid(&request.id).ok_or(StoreError::RequestGone)?;
        let sender_oid = parse_oid(&request.sender.id).ok_or(StoreError::SenderVanished)?;
        let receiver_oid = parse_oid(&request.receiver.id).ok_or(StoreError::ReceiverVanished)?;

        let mut session = self.client.start_session().await.map_err(backend)?;
        session.start_transaction().await.map_err(backend)?;

        let outcome: Result<(), StoreError> = async {
            let deleted = self
                .requests
                .inner()
                .delete_one(doc! { "_id": request_oid })
                .session(&mut session)
                .await
                .map_err(backend)?;
            if deleted.deleted_count == 0 {
                return Err(StoreError::RequestGone);
            }

            // Each side is appended to the other's list of the opposite
            // party's kind; $addToSet keeps the lists set-like.
            let sender_update = self
                .entities(request.sender.kind)
                .update_one(
                    doc! { "_id": sender_oid },
                    doc! {
                        "$addToSet": { request.receiver.kind.connection_field(): receiver_oid },
                        "$set": { "metadata.updated_at": DateTime::now() },
                    },
                )
                .session(&mut session)
                .await
                .map_err(backend)?;
            if sender_update.matched_count == 0 {
                return Err(StoreError::SenderVanished);
            }

            let receiver_update = self
                .entities(request.receiver.kind)
                .update_one(
                    doc! { "_id": receiver_oid },
                    doc! {
                        "$addToSet": { request.sender.kind.connection_field(): sender_oid },
                        "$set": { "metadata.updated_at": DateTime::now() },
                    },
                )
                .session(&mut session)
                .await
                .map_err(backend)?;
            if receiver_update.matched_count == 0 {
                return Err(StoreError::ReceiverVanished);
            }

            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => session.commit_transaction().await.map_err(backend),
            Err(e) => {
                // Best effort; the server aborts abandoned transactions anyway
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }

    async fn pending_for_receiver(
        &self,
        receiver_id: &str,
    ) -> Result<Vec<FriendRequest>, StoreError> {
        let Some(oid) = parse_oid(receiver_id) else {
            return Ok(Vec::new());
        };
        let rows = self
            .requests
            .find_many(doc! { "receiver_id": oid, "status": STATUS_PENDING })
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    async fn entity_snapshot(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<SenderSnapshot>, StoreError> {
        let Some(oid) = parse_oid(&entity.id) else {
            return Ok(None);
        };
        let Some(doc) = self
            .entities(entity.kind)
            .find_one(doc! { "_id": oid })
            .await
            .map_err(backend)?
        else {
            return Ok(None);
        };

        Ok(Some(SenderSnapshot {
            name: display_name(entity.kind, &doc),
            city: doc.get_str("city").unwrap_or_default().to_string(),
            state: doc.get_str("state").unwrap_or_default().to_string(),
            phone: doc.get_str("phone_number").ok().map(str::to_string),
        }))
    }

    async fn connections_of(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<ConnectionLists>, StoreError> {
        let Some(oid) = parse_oid(&entity.id) else {
            return Ok(None);
        };
        let Some(doc) = self
            .entities(entity.kind)
            .find_one(doc! { "_id": oid })
            .await
            .map_err(backend)?
        else {
            return Ok(None);
        };

        let farmer_ids = object_ids(&doc, EntityKind::Farmer.connection_field());
        let firm_ids = object_ids(&doc, EntityKind::Firm.connection_field());

        Ok(Some(ConnectionLists {
            farmers: self.fetch_summaries(EntityKind::Farmer, &farmer_ids).await?,
            firms: self.fetch_summaries(EntityKind::Firm, &firm_ids).await?,
        }))
    }
}

fn parse_oid(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

fn display_name(kind: EntityKind, doc: &Document) -> String {
    match kind {
        EntityKind::Farmer => format!(
            "{} {}",
            doc.get_str("first_name").unwrap_or_default(),
            doc.get_str("last_name").unwrap_or_default()
        )
        .trim()
        .to_string(),
        EntityKind::Firm => doc.get_str("company_name").unwrap_or_default().to_string(),
    }
}

fn object_ids(doc: &Document, field: &str) -> Vec<ObjectId> {
    doc.get_array(field)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_object_id())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

fn to_domain(row: FriendRequestDoc) -> FriendRequest {
    FriendRequest {
        id: row._id.map(|oid| oid.to_hex()).unwrap_or_default(),
        sender: EntityRef::new(row.sender_id.to_hex(), row.sender_kind),
        receiver: EntityRef::new(row.receiver_id.to_hex(), row.receiver_kind),
        created_at: row
            .metadata
            .created_at
            .map(DateTime::to_chrono)
            .unwrap_or_else(Utc::now),
    }
}
