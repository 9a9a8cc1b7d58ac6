use crate::dto::NotificationMessage;
use axum::async_trait;

///
/// What the consumer should do with a delivery after it was processed.
///
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Delivery is done. Ack the message.
    Completed,

    /// Ack the message and publish this copy to the retry queue.
    Retry(NotificationMessage),

    /// Drop the message without requeue.
    Reject,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationsDispatchService: Send + Sync {
    ///
    /// Delivers the notification over its channel and transitions the
    /// record accordingly. Never panics and never returns an error;
    /// every failure maps to an outcome the consumer can act on.
    ///
    async fn dispatch(&self, notification: NotificationMessage) -> DispatchOutcome;
}
