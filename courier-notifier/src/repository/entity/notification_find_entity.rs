use super::super::dto::Notification;
use crate::dto::{NotificationStatus, NotificationType};
use bson::{oid::ObjectId, DateTime};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NotificationFindEntity {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub content: String,
    pub status: NotificationStatus,
    pub timestamp: DateTime,
    #[serde(default)]
    pub published: bool,
}

impl From<NotificationFindEntity> for Notification {
    fn from(entity: NotificationFindEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            notification_type: entity.notification_type,
            content: entity.content,
            status: entity.status,
            timestamp: entity.timestamp.to_time_0_3(),
            published: entity.published,
        }
    }
}
