use crate::{
    dto::{input, output},
    error::Error,
};
use axum::async_trait;
use bson::oid::ObjectId;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationsService: Send + Sync {
    ///
    /// Save new notification and put it on the work queue.
    ///
    /// ### Returns
    /// ID of created notification
    ///
    /// ### Errors
    /// - [Error::Validation] when content is empty
    /// - [Error::Publish] when the record was saved but could not be
    ///   published; the sweeper publishes it later
    ///
    async fn create_notification(
        &self,
        notification: input::Notification,
    ) -> Result<output::NotificationCreated, Error>;

    ///
    /// Find all notifications that belong to the user.
    ///
    /// ### Errors
    /// - [Error::NoNotifications] when the user has none
    ///
    async fn find_user_notifications(
        &self,
        user_id: i64,
    ) -> Result<Vec<output::Notification>, Error>;

    ///
    /// Put a terminally failed notification back on the work queue
    /// with a fresh retry budget.
    ///
    /// ### Errors
    /// - [Error::NotificationNotExist] when no record has this id
    /// - [Error::NotificationNotFailed] when the record is not `failed`
    ///
    async fn redeliver_notification(&self, id: ObjectId) -> Result<(), Error>;
}
