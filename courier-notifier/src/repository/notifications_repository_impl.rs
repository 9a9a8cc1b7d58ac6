use super::{
    dto::Notification,
    entity::{NotificationFindEntity, NotificationInsertEntity},
    Error, NotificationsRepository,
};
use crate::dto::{NotificationStatus, NotificationType};
use axum::async_trait;
use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use futures::TryStreamExt;
use mongodb::{error::ErrorKind, options::IndexOptions, Collection, Database, IndexModel};
use std::sync::Arc;
use time::OffsetDateTime;

const NOTIFICATIONS: &str = "notifications";
const INDEX_NAME_USER_ID: &str = "index_user_id";
const INDEX_NAME_STATUS_TYPE: &str = "index_status_notification_type";

pub struct NotificationsRepositoryImpl {
    database: Database,
}

impl NotificationsRepositoryImpl {
    pub async fn new(database: Database) -> Result<Self, mongodb::error::Error> {
        database.create_collection(NOTIFICATIONS).await?;

        let collection = database.collection(NOTIFICATIONS);
        let index_names = collection.list_index_names().await?;

        if !index_names.contains(&INDEX_NAME_USER_ID.to_string()) {
            Self::create_user_id_index(&collection).await?;
            tracing::debug!("created index {NOTIFICATIONS}.{INDEX_NAME_USER_ID}");
        }
        if !index_names.contains(&INDEX_NAME_STATUS_TYPE.to_string()) {
            Self::create_status_type_index(&collection).await?;
            tracing::debug!("created index {NOTIFICATIONS}.{INDEX_NAME_STATUS_TYPE}");
        }

        Ok(Self { database })
    }

    async fn create_user_id_index(
        collection: &Collection<Document>,
    ) -> Result<(), mongodb::error::Error> {
        let index = IndexModel::builder()
            .keys(doc! {
                "user_id": 1,
            })
            .options(
                IndexOptions::builder()
                    .name(INDEX_NAME_USER_ID.to_string())
                    .build(),
            )
            .build();

        collection.create_index(index).await?;

        Ok(())
    }

    // Serves the reconciliation scan and the unpublished sweep
    async fn create_status_type_index(
        collection: &Collection<Document>,
    ) -> Result<(), mongodb::error::Error> {
        let index = IndexModel::builder()
            .keys(doc! {
                "status": 1,
                "notification_type": 1,
            })
            .options(
                IndexOptions::builder()
                    .name(INDEX_NAME_STATUS_TYPE.to_string())
                    .build(),
            )
            .build();

        collection.create_index(index).await?;

        Ok(())
    }

    async fn find_entities(&self, filter: Document) -> Result<Vec<Notification>, Error> {
        let notifications = self
            .database
            .collection::<NotificationFindEntity>(NOTIFICATIONS)
            .find(filter)
            .await?
            .map_ok(Notification::from)
            .try_collect()
            .await?;

        Ok(notifications)
    }

    ///
    /// Updates status/timestamp of every record matching the filter.
    /// Returns whether any document changed.
    ///
    async fn update_status(
        &self,
        filter: Document,
        status: NotificationStatus,
        timestamp: OffsetDateTime,
    ) -> Result<bool, Error> {
        let update_result = self
            .database
            .collection::<Document>(NOTIFICATIONS)
            .update_one(
                filter,
                doc! {
                    "$set": {
                        "status": status.to_string(),
                        "timestamp": DateTime::from(timestamp),
                    }
                },
            )
            .await?;

        Ok(update_result.modified_count == 1)
    }
}

#[async_trait]
impl NotificationsRepository for NotificationsRepositoryImpl {
    async fn insert(
        &self,
        user_id: i64,
        notification_type: NotificationType,
        content: &str,
        timestamp: OffsetDateTime,
    ) -> Result<Notification, Error> {
        let insert_entity = NotificationInsertEntity {
            user_id,
            notification_type,
            content: content.to_string(),
            status: NotificationStatus::Pending,
            timestamp: DateTime::from(timestamp),
            published: false,
        };

        let insert_result = self
            .database
            .collection::<NotificationInsertEntity>(NOTIFICATIONS)
            .insert_one(&insert_entity)
            .await?;

        let Bson::ObjectId(id) = insert_result.inserted_id else {
            tracing::error!("invalid type of inserted '_id'");
            return Err(Error::Mongo(
                ErrorKind::Custom(Arc::new("invalid type of inserted '_id'")).into(),
            ));
        };

        Ok(Notification {
            id,
            user_id,
            notification_type,
            content: insert_entity.content,
            status: NotificationStatus::Pending,
            timestamp,
            published: false,
        })
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Notification>, Error> {
        let entity = self
            .database
            .collection::<NotificationFindEntity>(NOTIFICATIONS)
            .find_one(doc! { "_id": id })
            .await?;

        Ok(entity.map(Notification::from))
    }

    async fn find_by_user_id(&self, user_id: i64) -> Result<Vec<Notification>, Error> {
        self.find_entities(doc! { "user_id": user_id }).await
    }

    async fn find_in_app_undelivered(&self) -> Result<Vec<Notification>, Error> {
        self.find_entities(doc! {
            "notification_type": NotificationType::InApp.to_string(),
            "status": {
                "$in": [
                    NotificationStatus::Pending.to_string(),
                    NotificationStatus::Failed.to_string(),
                ]
            },
        })
        .await
    }

    async fn find_unpublished(
        &self,
        older_than: OffsetDateTime,
    ) -> Result<Vec<Notification>, Error> {
        self.find_entities(doc! {
            "published": false,
            "status": NotificationStatus::Pending.to_string(),
            "timestamp": { "$lt": DateTime::from(older_than) },
        })
        .await
    }

    async fn mark_sent(&self, id: ObjectId, timestamp: OffsetDateTime) -> Result<bool, Error> {
        self.update_status(
            doc! {
                "_id": id,
                "status": { "$ne": NotificationStatus::Sent.to_string() },
            },
            NotificationStatus::Sent,
            timestamp,
        )
        .await
    }

    async fn mark_failed(&self, id: ObjectId, timestamp: OffsetDateTime) -> Result<bool, Error> {
        self.update_status(
            doc! {
                "_id": id,
                "status": { "$ne": NotificationStatus::Sent.to_string() },
            },
            NotificationStatus::Failed,
            timestamp,
        )
        .await
    }

    async fn mark_pending(&self, id: ObjectId, timestamp: OffsetDateTime) -> Result<bool, Error> {
        self.update_status(
            doc! {
                "_id": id,
                "status": NotificationStatus::Failed.to_string(),
            },
            NotificationStatus::Pending,
            timestamp,
        )
        .await
    }

    async fn mark_published(&self, id: ObjectId) -> Result<(), Error> {
        let update_result = self
            .database
            .collection::<Document>(NOTIFICATIONS)
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "published": true } },
            )
            .await?;

        match update_result.matched_count == 1 {
            true => Ok(()),
            false => Err(Error::NoDocumentUpdated),
        }
    }
}
