use crate::dto::{NotificationStatus, NotificationType};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct Notification {
    pub id: String,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub content: String,
    pub status: NotificationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}
