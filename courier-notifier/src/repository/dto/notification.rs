use crate::dto::{NotificationMessage, NotificationStatus, NotificationType};
use bson::oid::ObjectId;
use time::OffsetDateTime;

///
/// Notification record as stored in the database.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: ObjectId,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub content: String,
    pub status: NotificationStatus,
    pub timestamp: OffsetDateTime,
    /// Outbox marker: whether the record made it onto the work queue
    pub published: bool,
}

impl From<&Notification> for NotificationMessage {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            user_id: notification.user_id,
            notification_type: notification.notification_type,
            content: notification.content.clone(),
            status: notification.status,
            timestamp: notification.timestamp,
            retry_count: 0,
        }
    }
}

impl From<&Notification> for crate::dto::output::Notification {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.to_hex(),
            user_id: notification.user_id,
            notification_type: notification.notification_type,
            content: notification.content.clone(),
            status: notification.status,
            timestamp: notification.timestamp,
        }
    }
}
