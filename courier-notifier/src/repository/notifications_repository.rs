use super::{dto::Notification, error::Error};
use crate::dto::NotificationType;
use axum::async_trait;
use bson::oid::ObjectId;
use time::OffsetDateTime;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationsRepository: Send + Sync {
    ///
    /// Inserts new notification at status `pending`, not yet published
    /// to the queue.
    ///
    async fn insert(
        &self,
        user_id: i64,
        notification_type: NotificationType,
        content: &str,
        timestamp: OffsetDateTime,
    ) -> Result<Notification, Error>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Notification>, Error>;

    async fn find_by_user_id(&self, user_id: i64) -> Result<Vec<Notification>, Error>;

    ///
    /// Finds in-app notifications that were never confirmed delivered
    /// (`status` pending or failed). Input of the reconciliation loop.
    ///
    async fn find_in_app_undelivered(&self) -> Result<Vec<Notification>, Error>;

    ///
    /// Finds pending notifications that never made it onto the work queue
    /// and are older than `older_than`.
    ///
    async fn find_unpublished(&self, older_than: OffsetDateTime) -> Result<Vec<Notification>, Error>;

    ///
    /// Transitions the record to `sent` unless it is already sent.
    ///
    /// ### Returns
    /// Whether the record was updated. `false` means the record is already
    /// sent (duplicate delivery) or does not exist.
    ///
    async fn mark_sent(&self, id: ObjectId, timestamp: OffsetDateTime) -> Result<bool, Error>;

    ///
    /// Transitions the record to `failed` unless it is already sent.
    /// `sent` stays absorbing even when a stale failure arrives late.
    ///
    async fn mark_failed(&self, id: ObjectId, timestamp: OffsetDateTime) -> Result<bool, Error>;

    ///
    /// Transitions a `failed` record back to `pending` for redelivery.
    ///
    /// ### Returns
    /// Whether the record was updated. `false` means the record is not
    /// in the `failed` status.
    ///
    async fn mark_pending(&self, id: ObjectId, timestamp: OffsetDateTime) -> Result<bool, Error>;

    ///
    /// Marks the record as published to the work queue.
    ///
    /// ### Errors
    /// - [Error::NoDocumentUpdated] when the record does not exist
    ///
    async fn mark_published(&self, id: ObjectId) -> Result<(), Error>;
}
