use super::Error;
use crate::dto::NotificationMessage;
use axum::async_trait;

///
/// Publishes notification messages onto the dispatch pipeline.
///
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationsProducerService: Send + Sync {
    ///
    /// Publishes the message to the work queue for immediate delivery.
    ///
    async fn publish(&self, notification: &NotificationMessage) -> Result<(), Error>;

    ///
    /// Publishes the message to the retry queue, where it sits for the
    /// configured TTL before being dead-lettered back to the work queue.
    ///
    async fn publish_retry(&self, notification: &NotificationMessage) -> Result<(), Error>;
}
