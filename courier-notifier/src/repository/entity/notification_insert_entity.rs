use crate::dto::{NotificationStatus, NotificationType};
use bson::DateTime;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct NotificationInsertEntity {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub content: String,
    pub status: NotificationStatus,
    pub timestamp: DateTime,
    pub published: bool,
}
